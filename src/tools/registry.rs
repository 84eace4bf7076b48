//! Validated tool catalogue and dispatcher.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolContext, ToolOutcome};
use super::types::ToolDefinition;
use super::validation::{validate_arguments, validate_schema};
use crate::error::{Result, SwitchboardError};

/// Read-only set of tools, shared by the agent for advertising and dispatch.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Build a registry, rejecting duplicate names and malformed schemas.
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(tools.len());
        for (position, tool) in tools.iter().enumerate() {
            if tool.name().trim().is_empty() {
                return Err(SwitchboardError::Configuration(
                    "tool name must not be empty".to_string(),
                ));
            }
            validate_schema(&tool.parameters().schema).map_err(|reason| {
                SwitchboardError::Configuration(format!(
                    "tool '{}' has an invalid schema: {reason}",
                    tool.name()
                ))
            })?;
            if by_name.insert(tool.name().to_string(), position).is_some() {
                return Err(SwitchboardError::Configuration(format!(
                    "duplicate tool name '{}'",
                    tool.name()
                )));
            }
        }
        Ok(Self { tools, by_name })
    }

    /// The seven built-in UI tools.
    pub fn builtin() -> Result<Self> {
        Self::new(super::builtin::all())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.by_name.get(name).map(|&position| &self.tools[position])
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.iter()
    }

    /// Catalogue entries in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters().schema.clone(),
            })
            .collect()
    }

    /// Validate and execute one call, surfacing failures as errors.
    pub async fn try_dispatch(
        &self,
        name: &str,
        arguments: &ToolArguments,
        ctx: &ToolContext,
    ) -> Result<ToolOutcome> {
        let tool = self
            .get(name)
            .ok_or_else(|| SwitchboardError::UnknownTool(name.to_string()))?;

        validate_arguments(arguments.raw(), &tool.parameters().schema)
            .map_err(|reason| SwitchboardError::tool_execution(name, format!("Invalid arguments: {reason}")))?;

        tool.execute(arguments, ctx).await.map_err(|err| match err {
            SwitchboardError::ToolExecution { .. } => err,
            other => SwitchboardError::tool_execution(name, other.to_string()),
        })
    }

    /// Validate and execute one call. Never fails: problems become a
    /// `{"success": false, "error": ...}` outcome for the model.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: &ToolArguments,
        ctx: &ToolContext,
    ) -> ToolOutcome {
        match self.try_dispatch(name, arguments, ctx).await {
            Ok(outcome) => {
                debug!(tool = name, success = outcome.is_success(), "tool executed");
                outcome
            }
            Err(SwitchboardError::UnknownTool(_)) => {
                warn!(tool = name, "model requested an unknown tool");
                ToolOutcome::failure("Unknown tool")
            }
            Err(SwitchboardError::ToolExecution { message, .. }) => {
                warn!(tool = name, error = %message, "tool call failed");
                ToolOutcome::failure(message)
            }
            Err(other) => {
                warn!(tool = name, error = %other, "tool call failed");
                ToolOutcome::failure(other)
            }
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.tools.iter().map(|t| t.name()).collect();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}
