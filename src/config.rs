use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use url::Url;

use crate::catalog::{ContentKind, Endpoints};

const ENV_PREFIX: &str = "NEWSDESK_";

/// Per-kind endpoint override, keyed by slug in the config file.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct EndpointOverride {
    #[serde(default)]
    pub read: Option<String>,
    #[serde(default)]
    pub write: Option<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Site root the relative endpoints resolve against.
    pub base_url: Option<String>,
    /// Serve read endpoints from this directory instead of over HTTP.
    pub data_dir: Option<PathBuf>,
    /// `name` of the `<meta>` tag holding the anti-forgery token.
    pub csrf_meta: String,
    /// How long notifications stay on screen.
    pub notify_ms: u64,
    pub timeout_secs: Option<u64>,
    pub endpoints: HashMap<String, EndpointOverride>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: None,
            data_dir: None,
            csrf_meta: "csrf-token".to_string(),
            notify_ms: 3000,
            timeout_secs: None,
            endpoints: HashMap::new(),
        }
    }
}

impl Settings {
    /// Loads the config file (explicit path, or the platform default when
    /// present) and applies `NEWSDESK_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(p) => Self::from_file(p)?,
            None => match default_config_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => Self::default(),
            },
        };
        settings.apply_overrides(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("failed to parse config '{}'", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(text)?;
        for slug in settings.endpoints.keys() {
            slug.parse::<ContentKind>()?;
        }
        Ok(settings)
    }

    /// `get` maps an unprefixed key (`BASE_URL`) to its value.
    pub fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(v) = get("BASE_URL").filter(|v| !v.trim().is_empty()) { self.base_url = Some(v); }
        if let Some(v) = get("DATA_DIR").filter(|v| !v.trim().is_empty()) { self.data_dir = Some(PathBuf::from(v)); }
        if let Some(v) = get("NOTIFY_MS").and_then(|s| s.parse().ok()) { self.notify_ms = v; }
        if let Some(v) = get("TIMEOUT_SECS").and_then(|s| s.parse().ok()) { self.timeout_secs = Some(v); }
    }

    pub fn endpoints(&self, kind: ContentKind) -> Endpoints {
        let mut e = kind.default_endpoints();
        if let Some(o) = self.endpoints.get(kind.slug()) {
            if let Some(read) = &o.read { e.read = read.clone(); }
            if let Some(write) = &o.write { e.write = write.clone(); }
        }
        e
    }

    pub fn notify_duration(&self) -> Duration { Duration::from_millis(self.notify_ms) }

    pub fn timeout(&self) -> Option<Duration> { self.timeout_secs.map(Duration::from_secs) }

    /// Base URL with a trailing slash so relative endpoints join beneath it.
    pub fn base(&self) -> Result<Option<Url>> {
        let Some(raw) = self.base_url.as_deref() else { return Ok(None) };
        let mut raw = raw.trim().to_string();
        if !raw.ends_with('/') { raw.push('/'); }
        let url = Url::parse(&raw).with_context(|| format!("invalid base URL: {raw}"))?;
        if url.cannot_be_a_base() {
            return Err(anyhow!("base URL cannot have relative paths: {raw}"));
        }
        Ok(Some(url))
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("dev", "newsdesk", "newsdesk").map(|p| p.config_dir().join("newsdesk.toml"))
}
