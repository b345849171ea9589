use std::sync::{Arc, PoisonError, RwLock};

/// Source of the page's anti-forgery token. Read again on every write.
pub trait CsrfSource: Send + Sync {
    fn token(&self) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self { Self(Some(token.into())) }
    pub fn none() -> Self { Self(None) }
}

impl CsrfSource for StaticToken {
    fn token(&self) -> Option<String> { self.0.clone() }
}

/// Reads `<meta name="{name}" content="...">` from the current document.
/// The document can be swapped when the host re-renders the page head.
#[derive(Debug, Clone)]
pub struct MetaTag {
    name: String,
    document: Arc<RwLock<String>>,
}

impl MetaTag {
    pub fn new(name: impl Into<String>, document: impl Into<String>) -> Self {
        Self { name: name.into(), document: Arc::new(RwLock::new(document.into())) }
    }

    pub fn set_document(&self, document: impl Into<String>) {
        *self.document.write().unwrap_or_else(PoisonError::into_inner) = document.into();
    }
}

impl CsrfSource for MetaTag {
    fn token(&self) -> Option<String> {
        let doc = self.document.read().unwrap_or_else(PoisonError::into_inner);
        meta_content(&doc, &self.name)
    }
}

/// Finds the `content` of the first `<meta>` whose `name` matches.
pub fn meta_content(html: &str, name: &str) -> Option<String> {
    let lc = html.to_ascii_lowercase();
    let mut from = 0;
    while let Some(rel) = lc[from..].find("<meta") {
        let start = from + rel;
        let end = lc[start..].find('>').map(|e| start + e)?;
        let tag = &html[start + 5..end];
        if attr(tag, "name").is_some_and(|n| n.eq_ignore_ascii_case(name)) {
            return attr(tag, "content").filter(|c| !c.is_empty());
        }
        from = end;
    }
    None
}

fn attr(tag: &str, key: &str) -> Option<String> {
    let lc = tag.to_ascii_lowercase();
    let mut from = 0;
    while let Some(rel) = lc[from..].find(key) {
        let at = from + rel;
        from = at + key.len();
        let boundary = at == 0 || lc.as_bytes()[at - 1].is_ascii_whitespace();
        let rest = lc[from..].trim_start();
        if !boundary || !rest.starts_with('=') { continue; }
        let value_start = tag.len() - rest.len() + 1;
        let value = tag[value_start..].trim_start();
        let quoted = value.chars().next().filter(|c| *c == '"' || *c == '\'');
        return Some(match quoted {
            Some(q) => value[1..].split(q).next().unwrap_or("").to_string(),
            None => value.split(|c: char| c.is_whitespace() || c == '/').next().unwrap_or("").to_string(),
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEAD: &str = r#"<head><meta charset="utf-8"><META Name="csrf-token" content="abc123" /><title>x</title></head>"#;

    #[test]
    fn finds_token_case_insensitively() {
        assert_eq!(meta_content(HEAD, "csrf-token").as_deref(), Some("abc123"));
        assert_eq!(meta_content(HEAD, "other"), None);
    }

    #[test]
    fn handles_attribute_order_and_quoting() {
        let html = "<meta content='tok' name=csrf-token>";
        assert_eq!(meta_content(html, "csrf-token").as_deref(), Some("tok"));
        let html = "<meta data-name=\"csrf-token\" content=\"no\">";
        assert_eq!(meta_content(html, "csrf-token"), None);
    }

    #[test]
    fn token_is_read_from_the_current_document() {
        let src = MetaTag::new("csrf-token", HEAD);
        assert_eq!(src.token().as_deref(), Some("abc123"));
        src.set_document(r#"<meta name="csrf-token" content="rotated">"#);
        assert_eq!(src.token().as_deref(), Some("rotated"));
    }
}
