use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FetchError;
use crate::transport::Transport;

/// Serves static `data/<type>.json` files from a site root on disk.
/// Writes are refused: static resources have no write path.
#[derive(Debug, Clone)]
pub struct FileTransport {
    root: PathBuf,
}

impl FileTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

    pub fn root(&self) -> &Path { &self.root }

    fn resolve(&self, url: &str) -> PathBuf {
        let rel = url.split(['?', '#']).next().unwrap_or("");
        let mut path = self.root.clone();
        // only plain segments; `..` and absolute prefixes never leave the root
        for c in Path::new(rel.trim_start_matches('/')).components() {
            if let Component::Normal(seg) = c { path.push(seg); }
        }
        path
    }
}

#[async_trait]
impl Transport for FileTransport {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let path = self.resolve(url);
        tracing::debug!(path = %path.display(), "reading static document");
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| FetchError::Io { path: path.clone(), source })?;
        serde_json::from_str(&text).map_err(|source| FetchError::Parse { url: url.to_string(), source })
    }

    async fn post_json(&self, url: &str, _headers: &[(String, String)], _body: &Value) -> Result<Value, FetchError> {
        Err(FetchError::ReadOnly(url.to_string()))
    }
}
