//! Public-page content loader: fetch a JSON document, filter it, render each
//! record through a template and replace a container's content.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error};

use crate::dom::{Container, Fragment};
use crate::record::{extract_collection, Record};
use crate::transport::Transport;

/// Record -> fragment mapping. A plain fn: synchronous, and it only ever
/// sees the record through a shared reference.
pub type Template = fn(&Record) -> Fragment;

/// Which records a loader shows.
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&Record) -> bool + Send + Sync>);

impl Predicate {
    pub fn new(f: impl Fn(&Record) -> bool + Send + Sync + 'static) -> Self { Self(Arc::new(f)) }

    pub fn all() -> Self { Self::new(|_| true) }

    /// Records whose `field` is a truthy flag (e.g. `destacado: true`).
    pub fn flag(field: &str) -> Self {
        let field = field.to_string();
        Self::new(move |r| r.flag(&field))
    }

    pub fn equals(field: &str, value: impl Into<Value>) -> Self {
        let field = field.to_string();
        let value = value.into();
        Self::new(move |r| r.get(&field) == Some(&value))
    }

    pub fn matches(&self, record: &Record) -> bool { (self.0)(record) }
}

impl Default for Predicate {
    fn default() -> Self { Self::all() }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("Predicate(..)") }
}

#[derive(Clone)]
pub struct LoaderConfig {
    pub name: String,
    pub source_url: String,
    pub collection_field: Option<String>,
    pub filter: Predicate,
    pub template: Template,
    /// Shown instead of an empty container.
    pub fallback: Fragment,
}

impl fmt::Debug for LoaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderConfig")
            .field("name", &self.name)
            .field("source_url", &self.source_url)
            .field("collection_field", &self.collection_field)
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

impl LoaderConfig {
    pub fn new(name: &str, source_url: &str, template: Template, fallback: Fragment) -> Self {
        Self {
            name: name.to_string(),
            source_url: source_url.to_string(),
            collection_field: None,
            filter: Predicate::all(),
            template,
            fallback,
        }
    }

    pub fn nested(mut self, field: &str) -> Self {
        self.collection_field = Some(field.to_string());
        self
    }

    pub fn filter(mut self, filter: Predicate) -> Self {
        self.filter = filter;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered(usize),
    Fallback,
    /// Read failed; the container kept its previous content.
    Failed,
    /// A render for this loader was already in flight.
    Busy,
}

pub struct ContentLoader {
    config: LoaderConfig,
    transport: Arc<dyn Transport>,
    container: Arc<dyn Container>,
    loading: AtomicBool,
}

struct Loading<'a>(&'a AtomicBool);

impl Drop for Loading<'_> {
    fn drop(&mut self) { self.0.store(false, Ordering::Release); }
}

impl ContentLoader {
    pub fn new(config: LoaderConfig, transport: Arc<dyn Transport>, container: Arc<dyn Container>) -> Self {
        Self { config, transport, container, loading: AtomicBool::new(false) }
    }

    pub fn config(&self) -> &LoaderConfig { &self.config }

    /// Fetches, filters and renders. Failures are logged, never returned;
    /// on failure the container is left untouched.
    pub async fn render(&self) -> RenderOutcome {
        if self.loading.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            return RenderOutcome::Busy;
        }
        let _loading = Loading(&self.loading);

        let url = &self.config.source_url;
        let records = match self.transport.get_json(url).await {
            Ok(doc) => extract_collection(doc, self.config.collection_field.as_deref()),
            Err(e) => Err(e),
        };
        let records = match records {
            Ok(records) => records,
            Err(e) => {
                error!(loader = %self.config.name, %url, error = %e, "failed to load content");
                return RenderOutcome::Failed;
            }
        };

        let fragments = render_records(&self.config, &records);
        if fragments.is_empty() {
            debug!(loader = %self.config.name, total = records.len(), "nothing to show, using fallback");
            self.container.replace_children(vec![self.config.fallback.clone()]);
            return RenderOutcome::Fallback;
        }
        let count = fragments.len();
        self.container.replace_children(fragments);
        debug!(loader = %self.config.name, count, "content rendered");
        RenderOutcome::Rendered(count)
    }
}

/// Filtered records mapped through the template, in source order.
pub fn render_records(config: &LoaderConfig, records: &[Record]) -> Vec<Fragment> {
    records
        .iter()
        .filter(|r| config.filter.matches(r))
        .map(config.template)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;

    use crate::dom::{escape, MemoryContainer};
    use crate::testing::{MockTransport, Reply};

    const SRC: &str = "data/multimedia.json";

    fn title_item(r: &Record) -> Fragment {
        Fragment::raw(format!("<li>{}</li>", escape(&r.text("titulo"))))
    }

    fn placeholder() -> Fragment { Fragment::raw("<p class=\"loading\">Cargando…</p>") }

    fn loader(transport: MockTransport, config: LoaderConfig) -> (ContentLoader, Arc<MemoryContainer>) {
        let container = Arc::new(MemoryContainer::with_placeholder(placeholder()));
        (ContentLoader::new(config, Arc::new(transport), container.clone()), container)
    }

    fn base_config() -> LoaderConfig {
        LoaderConfig::new("multimedia", SRC, title_item, Fragment::raw("<p>No hay contenido.</p>"))
    }

    fn five_items() -> Value {
        json!([
            {"titulo": "uno", "destacado": false},
            {"titulo": "dos", "destacado": true},
            {"titulo": "tres"},
            {"titulo": "cuatro", "destacado": true},
            {"titulo": "cinco", "destacado": false}
        ])
    }

    #[tokio::test]
    async fn renders_every_record_in_order() {
        let (l, c) = loader(MockTransport::new().get(SRC, Reply::Json(five_items())), base_config());
        assert_eq!(l.render().await, RenderOutcome::Rendered(5));
        let html: Vec<_> = c.children().into_iter().map(Fragment::into_html).collect();
        assert_eq!(html, ["<li>uno</li>", "<li>dos</li>", "<li>tres</li>", "<li>cuatro</li>", "<li>cinco</li>"]);
    }

    #[tokio::test]
    async fn featured_filter_keeps_matching_records_in_input_order() {
        let config = base_config().filter(Predicate::equals("destacado", true));
        let (l, c) = loader(MockTransport::new().get(SRC, Reply::Json(five_items())), config);
        assert_eq!(l.render().await, RenderOutcome::Rendered(2));
        assert_eq!(c.html(), "<li>dos</li>\n<li>cuatro</li>");
    }

    #[tokio::test]
    async fn empty_result_shows_exactly_the_fallback() {
        let config = base_config().filter(Predicate::flag("destacado"));
        let (l, c) = loader(MockTransport::new().get(SRC, Reply::Json(json!([{"titulo": "x"}]))), config);
        assert_eq!(l.render().await, RenderOutcome::Fallback);
        assert_eq!(c.children(), vec![Fragment::raw("<p>No hay contenido.</p>")]);

        let (l, c) = loader(MockTransport::new().get(SRC, Reply::Json(json!([]))), base_config());
        assert_eq!(l.render().await, RenderOutcome::Fallback);
        assert_eq!(c.len(), 1);
    }

    #[tokio::test]
    async fn nested_documents_are_unwrapped() {
        let doc = json!({"eventos": [{"titulo": "Maratón"}, {"titulo": "Regata"}]});
        let (l, c) = loader(MockTransport::new().get(SRC, Reply::Json(doc)), base_config().nested("eventos"));
        assert_eq!(l.render().await, RenderOutcome::Rendered(2));
        assert!(c.html().contains("Maratón"));
    }

    #[tokio::test]
    async fn failures_keep_the_placeholder() {
        for reply in [Reply::Fail, Reply::Raw("{oops")] {
            let (l, c) = loader(MockTransport::new().get(SRC, reply), base_config());
            assert_eq!(l.render().await, RenderOutcome::Failed);
            assert_eq!(c.children(), vec![placeholder()]);
        }
        let (l, c) = loader(MockTransport::new().get(SRC, Reply::Json(json!({"items": []}))), base_config().nested("eventos"));
        assert_eq!(l.render().await, RenderOutcome::Failed);
        assert_eq!(c.children(), vec![placeholder()]);
    }

    #[test]
    fn rendering_leaves_source_records_untouched() {
        let records: Vec<Record> = serde_json::from_value(five_items()).unwrap();
        let before = records.clone();
        let out = render_records(&base_config().filter(Predicate::flag("destacado")), &records);
        assert_eq!(out.len(), 2);
        assert_eq!(records, before);
    }

    #[tokio::test]
    async fn overlapping_render_is_skipped() {
        let transport = MockTransport::new().get(SRC, Reply::Json(five_items())).with_delay(Duration::from_millis(30));
        let (l, _c) = loader(transport, base_config());
        let (a, b) = tokio::join!(l.render(), l.render());
        assert_eq!(a, RenderOutcome::Rendered(5));
        assert_eq!(b, RenderOutcome::Busy);
        assert_eq!(l.render().await, RenderOutcome::Rendered(5));
    }
}
