//! Error types for Switchboard.

use thiserror::Error;

/// Primary error type for all Switchboard operations.
#[derive(Error, Debug)]
pub enum SwitchboardError {
    #[error("Invalid API key: {0}")]
    CredentialInvalid(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Upstream error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Invalid tool arguments for {tool_name}: {message}")]
    ToolArgumentParse { tool_name: String, message: String },

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Broad error category used to decide whether a request survives an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Credential,
    Transport,
    Upstream,
    Tool,
    Configuration,
    Storage,
    Internal,
}

impl SwitchboardError {
    /// Create an upstream error from a status code and message.
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    pub fn tool_execution(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::CredentialInvalid(_) => ErrorCategory::Credential,
            Self::Transport(_) | Self::Network(_) => ErrorCategory::Transport,
            Self::Upstream { .. } => ErrorCategory::Upstream,
            Self::ToolArgumentParse { .. }
            | Self::ToolExecution { .. }
            | Self::UnknownTool(_)
            | Self::InvalidArgument(_) => ErrorCategory::Tool,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Storage(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Serialization(_) | Self::InvalidState(_) => ErrorCategory::Internal,
        }
    }

    /// Whether this error terminates a pending request.
    ///
    /// Tool-level failures are folded into the conversation as tool results
    /// and never end a request.
    pub fn is_fatal(&self) -> bool {
        !matches!(self.category(), ErrorCategory::Tool)
    }

    /// Message suitable for showing to the person chatting.
    pub fn user_message(&self) -> String {
        match self {
            Self::CredentialInvalid(_) => {
                "Invalid API key. Please enter a valid OpenRouter API key.".to_string()
            }
            Self::Upstream { message, .. } => message.clone(),
            Self::Transport(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<toml::de::Error> for SwitchboardError {
    fn from(err: toml::de::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<toml::ser::Error> for SwitchboardError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SwitchboardError>;
