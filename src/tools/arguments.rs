//! Typed access to tool call arguments.

use serde::de::DeserializeOwned;

use crate::error::{Result, SwitchboardError};

/// Wrapper around parsed tool call arguments providing typed extraction.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Parse the raw arguments text the model produced. Empty text means `{}`.
    pub fn parse(raw: &str) -> std::result::Result<Self, serde_json::Error> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Self::new(serde_json::json!({})));
        }
        serde_json::from_str(trimmed).map(Self::new)
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    pub fn into_value(self) -> serde_json::Value {
        self.value
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| SwitchboardError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Get an optional string argument.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    /// Get a boolean argument.
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.value
            .get(key)
            .and_then(|v| v.as_bool())
            .ok_or_else(|| SwitchboardError::InvalidArgument(format!("Missing boolean argument: {key}")))
    }

    /// Deserialize a single field, e.g. a string enum.
    pub fn field<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self
            .value
            .get(key)
            .cloned()
            .ok_or_else(|| SwitchboardError::InvalidArgument(format!("Missing argument: {key}")))?;
        serde_json::from_value(value)
            .map_err(|e| SwitchboardError::InvalidArgument(format!("Invalid argument {key}: {e}")))
    }

    /// Deserialize the entire arguments into a typed struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.value.clone()).map_err(|e| {
            SwitchboardError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}
