use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use crate::error::FetchError;
use crate::transport::Transport;

/// reqwest-backed transport. Relative URLs resolve against `base`.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: Option<Url>,
}

impl HttpTransport {
    pub fn new(base: Option<Url>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(concat!("newsdesk/", env!("CARGO_PKG_VERSION")));
        if let Some(t) = timeout { builder = builder.timeout(t); }
        let client = builder.build().context("building HTTP client")?;
        Ok(Self { client, base })
    }

    pub fn base(&self) -> Option<&Url> { self.base.as_ref() }

    fn resolve(&self, url: &str) -> Result<Url, FetchError> {
        resolve_url(self.base.as_ref(), url)
    }
}

pub(crate) fn resolve_url(base: Option<&Url>, url: &str) -> Result<Url, FetchError> {
    let invalid = |source| FetchError::InvalidUrl { url: url.to_string(), source };
    match Url::parse(url) {
        Ok(u) => Ok(u),
        Err(url::ParseError::RelativeUrlWithoutBase) => match base {
            Some(b) => b.join(url).map_err(invalid),
            None => Err(invalid(url::ParseError::RelativeUrlWithoutBase)),
        },
        Err(e) => Err(invalid(e)),
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let target = self.resolve(url)?;
        tracing::debug!(%target, "GET");
        let resp = self.client
            .get(target)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| transport_error(url, e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_string(), status: status.as_u16() });
        }
        let body = resp.text().await.map_err(|e| transport_error(url, e))?;
        serde_json::from_str(&body).map_err(|source| FetchError::Parse { url: url.to_string(), source })
    }

    async fn post_json(&self, url: &str, headers: &[(String, String)], body: &Value) -> Result<Value, FetchError> {
        let target = self.resolve(url)?;
        tracing::debug!(%target, "POST");
        let mut req = self.client.post(target).header(ACCEPT, "application/json").json(body);
        for (name, value) in headers {
            req = req.header(name.as_str(), value.as_str());
        }
        let resp = req.send().await.map_err(|e| transport_error(url, e))?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| transport_error(url, e))?;
        write_reply(url, status, &text)
    }
}

/// Write endpoints report failures in the body, so it is parsed regardless
/// of status. Only an unreadable body on an error status becomes `Status`.
pub(crate) fn write_reply(url: &str, status: StatusCode, text: &str) -> Result<Value, FetchError> {
    match serde_json::from_str(text) {
        Ok(v) => Ok(v),
        Err(_) if !status.is_success() => Err(FetchError::Status { url: url.to_string(), status: status.as_u16() }),
        Err(source) => Err(FetchError::Parse { url: url.to_string(), source }),
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> FetchError {
    FetchError::Transport { url: url.to_string(), message: e.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_urls_join_the_base() {
        let base = Url::parse("https://diario.example/admin/").unwrap();
        let u = resolve_url(Some(&base), "api/eventos").unwrap();
        assert_eq!(u.as_str(), "https://diario.example/admin/api/eventos");
        let root = resolve_url(Some(&base), "/data/atletas.json").unwrap();
        assert_eq!(root.as_str(), "https://diario.example/data/atletas.json");
    }

    #[test]
    fn absolute_urls_ignore_the_base() {
        let base = Url::parse("https://diario.example/").unwrap();
        let u = resolve_url(Some(&base), "https://cdn.example/data/x.json").unwrap();
        assert_eq!(u.host_str(), Some("cdn.example"));
    }

    #[test]
    fn relative_url_without_base_is_rejected() {
        assert!(matches!(resolve_url(None, "data/x.json"), Err(FetchError::InvalidUrl { .. })));
    }

    #[test]
    fn error_status_with_json_body_is_passed_through() {
        let body = r#"{"success": false, "message": "sin permisos"}"#;
        let v = write_reply("api/eventos", StatusCode::FORBIDDEN, body).unwrap();
        assert_eq!(v["message"], "sin permisos");
    }

    #[test]
    fn error_status_with_unreadable_body_is_a_status_error() {
        let err = write_reply("api/eventos", StatusCode::BAD_GATEWAY, "<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 502, .. }), "{err}");
        assert!(!err.is_transport());
    }

    #[test]
    fn success_with_unreadable_body_is_a_parse_error() {
        let err = write_reply("api/eventos", StatusCode::OK, "ok").unwrap_err();
        assert!(matches!(err, FetchError::Parse { .. }), "{err}");
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_failure() {
        let t = HttpTransport::new(None, Some(Duration::from_millis(500))).unwrap();
        let err = t.get_json("http://127.0.0.1:9/data.json").await.unwrap_err();
        assert!(err.is_transport(), "{err}");
    }
}
