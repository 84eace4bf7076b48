//! Agent configuration (layered: defaults < TOML file < environment).

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SwitchboardError};
use crate::storage::{KeyValueStore, API_KEY_KEY};
use crate::types::SamplingSettings;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "openai/gpt-4o";
pub const DEFAULT_TITLE: &str = "Event-Driven Chat";
pub const DEFAULT_REFERER: &str = "http://localhost:3000";

/// Environment variable holding the upstream credential.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Settings for the upstream chat-completions service.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Sent as `HTTP-Referer`.
    pub referer: String,
    /// Sent as `X-Title`.
    pub title: String,
    /// Credentials shorter than this (after trimming) are rejected locally.
    pub min_credential_len: usize,
    /// Bound on establishing the connection. Unset means no bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout_ms: Option<u64>,
    /// Bound on the whole request, streamed body included. Unset means no bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 2048,
            referer: DEFAULT_REFERER.to_string(),
            title: DEFAULT_TITLE.to_string(),
            min_credential_len: 10,
            connect_timeout_ms: None,
            request_timeout_ms: None,
        }
    }
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

impl AgentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with the environment (after loading `.env`).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::default();
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Defaults < `path` (if it exists) < environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Read a TOML file; a missing file yields the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(raw) => {
                debug!(path = %path.display(), "loading configuration file");
                Ok(toml::from_str(&raw)?)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    /// `config.toml` in the data directory.
    pub fn default_path() -> PathBuf {
        crate::storage::default_data_dir().join("config.toml")
    }

    /// Overlay `SWITCHBOARD_*` values produced by `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("SWITCHBOARD_BASE_URL") {
            self.base_url = url;
        }
        if let Some(model) = lookup("SWITCHBOARD_MODEL") {
            self.model = model;
        }
        if let Some(raw) = lookup("SWITCHBOARD_TEMPERATURE") {
            self.temperature = parse_var("SWITCHBOARD_TEMPERATURE", &raw)?;
        }
        if let Some(raw) = lookup("SWITCHBOARD_MAX_TOKENS") {
            self.max_tokens = parse_var("SWITCHBOARD_MAX_TOKENS", &raw)?;
        }
        if let Some(referer) = lookup("SWITCHBOARD_REFERER") {
            self.referer = referer;
        }
        if let Some(title) = lookup("SWITCHBOARD_TITLE") {
            self.title = title;
        }
        Ok(())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = Some(duration_ms(timeout));
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = Some(duration_ms(timeout));
        self
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    pub fn sampling(&self) -> SamplingSettings {
        SamplingSettings::builder()
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
    }

    /// Endpoint the chat requests are POSTed to.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Credential from `OPENROUTER_API_KEY`, falling back to `store`.
    pub fn resolve_credential(store: &dyn KeyValueStore) -> Result<Option<String>> {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                return Ok(Some(key));
            }
        }
        store.get(API_KEY_KEY)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| SwitchboardError::Configuration(format!("{name}={raw:?}: {e}")))
}
