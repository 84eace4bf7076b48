//! Convenience re-exports for common use.

pub use crate::agent::{
    send_user_message, ConversationAgent, ConversationHistory, Credential, RequestOutcome,
    RequestStatus, ResponseRequest,
};
pub use crate::bus::{AppEvent, ChunkPayload, Event, EventBus, EventKind, Subscription};
pub use crate::config::AgentConfig;
pub use crate::error::{Result, SwitchboardError};
pub use crate::provider::{ChatCompletionsProvider, ChatProvider};
pub use crate::storage::{KeyValueStore, SubmissionStore};
pub use crate::tools::{Tool, ToolArguments, ToolOutcome, ToolRegistry};
pub use crate::types::{ConversationMessage, Role, SamplingSettings, ToolCall};
