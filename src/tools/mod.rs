//! Tool system for function calling.

pub mod arguments;
pub mod builtin;
pub mod registry;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::ToolArguments;
pub use registry::ToolRegistry;
pub use tool::{FnTool, Tool, ToolContext, ToolOutcome};
pub use types::{ParameterBuilder, ToolDefinition, ToolParameters};
pub use validation::{validate_arguments, validate_schema};
