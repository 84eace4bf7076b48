//! Tool trait and closure-based tool wrapper.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::arguments::ToolArguments;
use super::types::ToolParameters;
use crate::bus::EventBus;
use crate::error::Result;
use crate::storage::{KeyValueStore, MemoryKeyValueStore};

/// Context available during tool execution.
#[derive(Clone)]
pub struct ToolContext {
    /// Bus the tool publishes its UI events on.
    pub bus: EventBus,
    /// Id of the assistant message the call belongs to.
    pub message_id: String,
    /// Persisted preferences such as the current theme.
    pub preferences: Arc<dyn KeyValueStore>,
}

impl ToolContext {
    pub fn new(
        bus: EventBus,
        message_id: impl Into<String>,
        preferences: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            bus,
            message_id: message_id.into(),
            preferences,
        }
    }

    /// Context backed by in-memory preferences.
    pub fn detached(bus: EventBus, message_id: impl Into<String>) -> Self {
        Self::new(bus, message_id, Arc::new(MemoryKeyValueStore::new()))
    }
}

impl fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolContext")
            .field("message_id", &self.message_id)
            .finish_non_exhaustive()
    }
}

/// Result of one tool invocation, folded into history as a tool message.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    /// JSON object with at least a `success` field.
    pub value: Value,
    /// The conversation history should be emptied once the call is recorded.
    pub resets_conversation: bool,
}

impl ToolOutcome {
    /// `{"success": true, ..fields}`.
    pub fn success(fields: Value) -> Self {
        Self::with_flag(true, fields)
    }

    /// `{"success": false, ..fields}` for a call that ran but declined to act.
    pub fn declined(fields: Value) -> Self {
        Self::with_flag(false, fields)
    }

    /// `{"success": false, "error": message}`.
    pub fn failure(message: impl fmt::Display) -> Self {
        Self::with_flag(false, json!({ "error": message.to_string() }))
    }

    pub fn resetting_conversation(mut self) -> Self {
        self.resets_conversation = true;
        self
    }

    pub fn is_success(&self) -> bool {
        self.value.get("success").and_then(Value::as_bool) == Some(true)
    }

    fn with_flag(success: bool, fields: Value) -> Self {
        let mut map = serde_json::Map::new();
        map.insert("success".to_string(), Value::Bool(success));
        if let Value::Object(extra) = fields {
            map.extend(extra);
        }
        Self {
            value: Value::Object(map),
            resets_conversation: false,
        }
    }
}

/// Core tool trait. Implement to expose a capability to the model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must match what the model calls).
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// JSON Schema parameters.
    fn parameters(&self) -> &ToolParameters;

    /// Execute the tool with validated arguments.
    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> Result<ToolOutcome>;
}

type ToolHandler = dyn Fn(ToolArguments, ToolContext) -> Pin<Box<dyn Future<Output = Result<ToolOutcome>> + Send>>
    + Send
    + Sync;

/// Closure-based tool.
pub struct FnTool {
    name: String,
    description: String,
    parameters: ToolParameters,
    handler: Arc<ToolHandler>,
}

impl FnTool {
    /// Create a tool from a closure.
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParameters,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolArguments, ToolContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolOutcome>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Arc::new(move |args, ctx| Box::pin(handler(args, ctx))),
        }
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> Result<ToolOutcome> {
        (self.handler)(args.clone(), ctx.clone()).await
    }
}

impl fmt::Debug for FnTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}
