//! Markup fragments and the containers they are injected into.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A renderable unit of markup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fragment(String);

impl Fragment {
    /// Trusted markup, inserted as-is.
    pub fn raw(html: impl Into<String>) -> Self { Self(html.into()) }

    /// Plain text, escaped.
    pub fn text(text: &str) -> Self { Self(escape(text)) }

    pub fn as_html(&self) -> &str { &self.0 }
    pub fn into_html(self) -> String { self.0 }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Escapes text for element content and quoted attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// A page region a widget owns.
pub trait Container: Send + Sync {
    fn clear(&self);
    fn append(&self, fragment: Fragment);

    /// Clears the old content completely, then inserts `fragments` in order.
    fn replace_children(&self, fragments: Vec<Fragment>) {
        self.clear();
        for f in fragments { self.append(f); }
    }
}

/// In-memory container; the host copies `html()` into the real element.
#[derive(Debug, Default)]
pub struct MemoryContainer {
    children: Mutex<Vec<Fragment>>,
}

impl MemoryContainer {
    pub fn new() -> Self { Self::default() }

    /// Starts out holding a loading placeholder.
    pub fn with_placeholder(placeholder: Fragment) -> Self {
        Self { children: Mutex::new(vec![placeholder]) }
    }

    pub fn children(&self) -> Vec<Fragment> { self.lock().clone() }
    pub fn len(&self) -> usize { self.lock().len() }
    pub fn is_empty(&self) -> bool { self.lock().is_empty() }

    pub fn html(&self) -> String {
        self.lock().iter().map(Fragment::as_html).collect::<Vec<_>>().join("\n")
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Fragment>> {
        self.children.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Container for MemoryContainer {
    fn clear(&self) { self.lock().clear(); }
    fn append(&self, fragment: Fragment) { self.lock().push(fragment); }

    // single lock: readers never observe a half-replaced region
    fn replace_children(&self, fragments: Vec<Fragment>) {
        let mut children = self.lock();
        children.clear();
        children.extend(fragments);
    }
}
