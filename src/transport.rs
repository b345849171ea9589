pub mod file;
pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FetchError;

pub use file::FileTransport;
pub use http::HttpTransport;

/// Header carrying the page's anti-forgery token on every write.
pub const CSRF_HEADER: &str = "X-CSRF-Token";

/// Fetch-style request/response layer the widgets are built on.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError>;
    async fn post_json(&self, url: &str, headers: &[(String, String)], body: &Value) -> Result<Value, FetchError>;
}

/// Body returned by the write endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}
