//! Shared HTTP client and header utilities.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::{Result, SwitchboardError};

/// Fallback detail when an error body carries no `error.message`.
pub const GENERIC_FAILURE: &str = "API request failed";

/// Build a client. Without explicit bounds no timeout applies, so a slow but
/// live stream is read to its end.
pub fn build_client(
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().pool_max_idle_per_host(10);
    if let Some(timeout) = connect_timeout {
        builder = builder.connect_timeout(timeout);
    }
    if let Some(timeout) = request_timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| SwitchboardError::Configuration(format!("failed to build HTTP client: {e}")))
}

/// Build default headers for a Bearer-token API.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Add a header, skipping values that are not valid header text.
pub fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) {
    if let Ok(val) = HeaderValue::from_str(value) {
        headers.insert(HeaderName::from_static(name), val);
    }
}

/// Map a non-success response to an error. A body carrying `error.message`
/// becomes an upstream error; anything else is a generic transport failure.
pub fn status_to_error(status: u16, body: &str) -> SwitchboardError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .filter(|m| !m.trim().is_empty());
    match message {
        Some(message) => SwitchboardError::upstream(status, message),
        None => SwitchboardError::Transport(GENERIC_FAILURE.to_string()),
    }
}
