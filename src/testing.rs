//! Scripted transport for widget tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use crate::error::FetchError;
use crate::transport::http::write_reply;
use crate::transport::Transport;

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Json(Value),
    /// Body that is not JSON.
    Raw(&'static str),
    /// Request never completes.
    Fail,
    /// Non-success status with the given body.
    Status(u16, &'static str),
}

#[derive(Debug, Clone)]
pub(crate) struct Post {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl Post {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    gets: HashMap<String, Reply>,
    post_replies: HashMap<String, Reply>,
    posts: Mutex<Vec<Post>>,
    delay: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self { Self::default() }

    pub fn get(mut self, url: &str, reply: Reply) -> Self {
        self.gets.insert(url.to_string(), reply);
        self
    }

    pub fn post(mut self, url: &str, reply: Reply) -> Self {
        self.post_replies.insert(url.to_string(), reply);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn posts(&self) -> Vec<Post> { self.posts.lock().unwrap().clone() }

    async fn answer(&self, url: &str, reply: Option<&Reply>) -> Result<Value, FetchError> {
        if let Some(d) = self.delay { tokio::time::sleep(d).await; }
        match reply {
            // reads never look at an error body
            Some(Reply::Status(status, _)) => Err(FetchError::Status { url: url.to_string(), status: *status }),
            Some(Reply::Json(v)) => Ok(v.clone()),
            Some(Reply::Raw(body)) => serde_json::from_str(body).map_err(|source| FetchError::Parse { url: url.to_string(), source }),
            Some(Reply::Fail) | None => Err(FetchError::Transport { url: url.to_string(), message: "connection refused".to_string() }),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        self.answer(url, self.gets.get(url)).await
    }

    async fn post_json(&self, url: &str, headers: &[(String, String)], body: &Value) -> Result<Value, FetchError> {
        self.posts.lock().unwrap().push(Post { url: url.to_string(), headers: headers.to_vec(), body: body.clone() });
        match self.post_replies.get(url) {
            Some(Reply::Status(status, text)) => {
                if let Some(d) = self.delay { tokio::time::sleep(d).await; }
                write_reply(url, StatusCode::from_u16(*status).unwrap(), text)
            }
            reply => self.answer(url, reply).await,
        }
    }
}
