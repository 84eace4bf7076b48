//! Upstream chat-completions provider.

pub mod chat_completions;
pub mod http;

pub use chat_completions::ChatCompletionsProvider;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::stream::DeltaFrame;
use crate::tools::ToolDefinition;
use crate::types::{ConversationMessage, SamplingSettings};

/// A request sent to the upstream service.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ConversationMessage>,
    pub tools: Vec<ToolDefinition>,
    pub settings: SamplingSettings,
}

/// Streaming chat model behind the agent.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// The model id requests are sent for.
    fn model_id(&self) -> &str;

    /// Start a streaming completion. Fails before yielding anything when the
    /// service rejects the request.
    async fn stream_chat(
        &self,
        request: &ChatRequest,
        api_key: &str,
    ) -> Result<BoxStream<'static, Result<DeltaFrame>>>;
}
