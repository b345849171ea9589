use std::path::PathBuf;

use thiserror::Error;

use crate::editor::RequestState;

/// Failures while reading or writing a remote JSON document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never completed (DNS, connect, TLS, reset, timeout).
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    /// Non-success status whose body was not readable JSON.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("malformed JSON from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("document has no `{0}` collection")]
    MissingField(String),
    #[error("expected a JSON array of records")]
    NotACollection,
    #[error("collection entries are not records: {0}")]
    InvalidRecords(#[from] serde_json::Error),
    #[error("invalid URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("{0} is a read-only source")]
    ReadOnly(String),
    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// True when the request itself never produced a response.
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport { .. } | FetchError::Io { .. })
    }
}

#[derive(Debug, Error)]
pub enum EditorError {
    /// Controls are disabled while a request is in flight.
    #[error("editor is busy ({0:?})")]
    Busy(RequestState),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}
