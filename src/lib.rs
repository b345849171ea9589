pub mod catalog;
pub mod config;
pub mod csrf;
pub mod dom;
pub mod editor;
pub mod error;
pub mod loader;
pub mod notify;
pub mod record;
pub mod templates;
pub mod transport;

#[cfg(test)]
mod testing;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::catalog::{ContentKind, Endpoints};
    pub use crate::config::Settings;
    pub use crate::csrf::{CsrfSource, MetaTag, StaticToken};
    pub use crate::dom::{Container, Fragment, MemoryContainer};
    pub use crate::editor::{ListEditor, RequestState, SubmitOutcome};
    pub use crate::loader::{ContentLoader, Predicate, RenderOutcome};
    pub use crate::notify::{NoticeBoard, NoticeKind, Notifier};
    pub use crate::record::{Record, RowKey};
    pub use crate::Newsdesk;
}

use std::sync::Arc;

use anyhow::Result;

use crate::catalog::ContentKind;
use crate::config::Settings;
use crate::csrf::{CsrfSource, MetaTag};
use crate::dom::Container;
use crate::editor::ListEditor;
use crate::loader::ContentLoader;
use crate::notify::Notifier;
use crate::transport::{FileTransport, HttpTransport, Transport};

/// Widget factory. Owns the settings and the shared transport; every widget
/// gets its container and feedback channels passed in explicitly.
pub struct Newsdesk {
    settings: Settings,
    transport: Arc<dyn Transport>,
}

impl Newsdesk {
    /// Picks the transport from the settings: a static data directory when
    /// one is configured, HTTP otherwise.
    pub fn connect(settings: Settings) -> Result<Self> {
        let transport: Arc<dyn Transport> = match &settings.data_dir {
            Some(dir) => {
                tracing::info!(dir = %dir.display(), "serving content from static files");
                Arc::new(FileTransport::new(dir))
            }
            None => Arc::new(HttpTransport::new(settings.base()?, settings.timeout())?),
        };
        Ok(Self { settings, transport })
    }

    pub fn with_transport(settings: Settings, transport: Arc<dyn Transport>) -> Self {
        Self { settings, transport }
    }

    pub fn settings(&self) -> &Settings { &self.settings }

    pub fn editor(
        &self,
        kind: ContentKind,
        container: Arc<dyn Container>,
        notifier: Arc<dyn Notifier>,
        csrf: Arc<dyn CsrfSource>,
    ) -> ListEditor {
        let config = kind.editor_config(&self.settings.endpoints(kind));
        ListEditor::new(config, self.transport.clone(), container, notifier, csrf)
    }

    /// Token source reading the configured `<meta>` tag from `document`.
    pub fn csrf_from_document(&self, document: impl Into<String>) -> MetaTag {
        MetaTag::new(self.settings.csrf_meta.clone(), document)
    }

    /// Loader for `kind`. `featured` only applies to kinds with a featured
    /// selection and is ignored otherwise.
    pub fn loader(&self, kind: ContentKind, featured: bool, container: Arc<dyn Container>) -> ContentLoader {
        if featured && !kind.has_featured() {
            tracing::warn!(%kind, "no featured selection for this kind, showing everything");
        }
        let config = kind.loader_config(&self.settings.endpoints(kind), featured && kind.has_featured());
        ContentLoader::new(config, self.transport.clone(), container)
    }
}
