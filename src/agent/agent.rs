//! Conversation agent: turns response requests into streamed replies and
//! tool executions.

use std::sync::{Arc, Weak};

use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::bus::{
    AppEvent, ChunkPayload, CompletionPayload, ErrorPayload, EventBus, EventKind,
    ResponseRequestPayload, Subscription, ToolCallPayload, UserMessagePayload,
};
use crate::config::AgentConfig;
use crate::error::{Result, SwitchboardError};
use crate::provider::{ChatCompletionsProvider, ChatProvider, ChatRequest};
use crate::storage::{KeyValueStore, MemoryKeyValueStore};
use crate::tools::{ToolArguments, ToolContext, ToolOutcome, ToolRegistry};
use crate::types::{ConversationMessage, SamplingSettings, ToolCall};

use super::conversation::ConversationHistory;
use super::request::{Credential, PendingRequest, RequestOutcome, RequestStatus, ResponseRequest};

/// Drives one shared conversation against a streaming chat model.
///
/// Requests are independent: each owns its text buffer and tool-call
/// accumulator, and only the history is shared.
pub struct ConversationAgent {
    bus: EventBus,
    provider: Arc<dyn ChatProvider>,
    tools: ToolRegistry,
    history: ConversationHistory,
    preferences: Arc<dyn KeyValueStore>,
    settings: SamplingSettings,
    min_credential_len: usize,
}

impl ConversationAgent {
    pub fn new(bus: EventBus, provider: Arc<dyn ChatProvider>, tools: ToolRegistry) -> Self {
        let defaults = AgentConfig::default();
        Self {
            bus,
            provider,
            tools,
            history: ConversationHistory::new(),
            preferences: Arc::new(MemoryKeyValueStore::new()),
            settings: defaults.sampling(),
            min_credential_len: defaults.min_credential_len,
        }
    }

    /// Agent talking to the configured chat-completions endpoint with the
    /// built-in tools.
    pub fn from_config(bus: EventBus, config: &AgentConfig) -> Result<Self> {
        let provider = ChatCompletionsProvider::new(config)?;
        Ok(Self::new(bus, Arc::new(provider), ToolRegistry::builtin()?)
            .with_settings(config.sampling())
            .with_min_credential_len(config.min_credential_len))
    }

    pub fn with_history(mut self, history: ConversationHistory) -> Self {
        self.history = history;
        self
    }

    /// Preference store tools read and write (e.g. the theme).
    pub fn with_preferences(mut self, preferences: Arc<dyn KeyValueStore>) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn with_settings(mut self, settings: SamplingSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_min_credential_len(mut self, min_len: usize) -> Self {
        self.min_credential_len = min_len;
        self
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Handle `AI_RESPONSE_REQUESTED` events until the subscription is
    /// released. The subscription does not keep the agent alive.
    pub fn listen(self: &Arc<Self>) -> Subscription {
        let agent: Weak<Self> = Arc::downgrade(self);
        self.bus.on(
            EventKind::AiResponseRequested,
            move |payload: ResponseRequestPayload| {
                let agent = agent.clone();
                async move {
                    match agent.upgrade() {
                        Some(agent) => {
                            agent.respond(payload.into()).await;
                        }
                        None => debug!(message_id = %payload.message_id, "agent gone; request ignored"),
                    }
                    Ok(())
                }
            },
        )
    }

    /// Run one request to completion. Failures are reported on the bus as
    /// `AI_RESPONSE_ERROR` and in the returned outcome.
    pub async fn respond(&self, request: ResponseRequest) -> RequestOutcome {
        let ResponseRequest {
            message,
            message_id,
            credential,
        } = request;
        let mut pending = PendingRequest::new(message_id.clone());
        debug!(message_id = %message_id, "response requested");

        match self.run(&mut pending, message, &credential).await {
            Ok(tool_calls) => {
                let full_response = std::mem::take(&mut pending.buffer);
                info!(message_id = %message_id, tool_calls, chars = full_response.len(), "response complete");
                self.bus.publish(AppEvent::AiResponseComplete(CompletionPayload {
                    full_response: full_response.clone(),
                    message_id: message_id.clone(),
                }));
                RequestOutcome::Completed {
                    message_id,
                    full_response,
                    tool_calls,
                }
            }
            Err(err) => {
                if !pending.status().is_terminal() {
                    let _ = pending.advance(RequestStatus::Errored);
                }
                warn!(message_id = %message_id, error = %err, "response failed");
                let error = err.user_message();
                self.bus.publish(AppEvent::AiResponseError(ErrorPayload {
                    error: error.clone(),
                    message_id: message_id.clone(),
                }));
                RequestOutcome::Errored { message_id, error }
            }
        }
    }

    /// Returns the number of tool calls handled.
    async fn run(
        &self,
        pending: &mut PendingRequest,
        message: String,
        credential: &Credential,
    ) -> Result<usize> {
        pending.advance(RequestStatus::Requested)?;
        self.history.push(ConversationMessage::user(message));
        credential.validate(self.min_credential_len)?;

        pending.advance(RequestStatus::Streaming)?;
        let request = ChatRequest {
            messages: self.history.snapshot(),
            tools: self.tools.definitions(),
            settings: self.settings.clone(),
        };
        let mut frames = self
            .provider
            .stream_chat(&request, credential.expose())
            .await?;

        while let Some(frame) = frames.next().await {
            let frame = frame?;
            if let Some(text) = frame.content {
                pending.buffer.push_str(&text);
                self.bus.publish(AppEvent::AiResponseChunk(ChunkPayload {
                    chunk: text,
                    message_id: pending.message_id.clone(),
                }));
            }
            pending.accumulator.apply_all(&frame.tool_calls);
        }

        let calls = std::mem::take(&mut pending.accumulator).finish();
        let call_count = calls.len();
        let mut first_executed: Option<String> = None;
        for call in calls {
            pending.advance(RequestStatus::ToolExecuting)?;
            if let Some(name) = self.execute_call(pending, call).await {
                first_executed.get_or_insert(name);
            }
        }

        if pending.buffer.is_empty() {
            if let Some(name) = first_executed {
                let acknowledgement = format!("I've {} for you.", name.replacen('_', " ", 1));
                pending.buffer.push_str(&acknowledgement);
                self.bus.publish(AppEvent::AiResponseChunk(ChunkPayload {
                    chunk: acknowledgement,
                    message_id: pending.message_id.clone(),
                }));
            }
        }

        pending.advance(RequestStatus::Completed)?;
        self.history
            .push(ConversationMessage::assistant(pending.buffer.clone()));
        Ok(call_count)
    }

    /// Execute one completed call and record it in history. Returns the tool
    /// name when the call was dispatched.
    async fn execute_call(&self, pending: &PendingRequest, call: ToolCall) -> Option<String> {
        let name = call.name().to_string();
        let (outcome, dispatched) = match ToolArguments::parse(&call.function.arguments) {
            Err(err) => {
                let err = SwitchboardError::ToolArgumentParse {
                    tool_name: name.clone(),
                    message: err.to_string(),
                };
                warn!(message_id = %pending.message_id, call_id = %call.id, error = %err, "tool call not dispatched");
                (ToolOutcome::failure(err), false)
            }
            Ok(arguments) => {
                self.bus.publish(AppEvent::ToolCall(ToolCallPayload {
                    tool_name: name.clone(),
                    arguments: arguments.raw().clone(),
                    message_id: pending.message_id.clone(),
                }));
                let ctx = ToolContext::new(
                    self.bus.clone(),
                    pending.message_id.clone(),
                    Arc::clone(&self.preferences),
                );
                (self.tools.dispatch(&name, &arguments, &ctx).await, true)
            }
        };

        if outcome.resets_conversation {
            debug!(message_id = %pending.message_id, "conversation history cleared by tool");
            self.history.clear();
        }
        let result = ConversationMessage::tool_result(&call, &outcome.value);
        self.history.extend([
            ConversationMessage::assistant_tool_call(pending.buffer.clone(), call),
            result,
        ]);

        dispatched.then_some(name)
    }
}

impl std::fmt::Debug for ConversationAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationAgent")
            .field("model", &self.provider.model_id())
            .field("tools", &self.tools)
            .field("history_len", &self.history.len())
            .finish_non_exhaustive()
    }
}

/// Announce a user message and request a reply to it, the way a chat UI
/// does. Returns the id the reply's events will carry.
pub fn send_user_message(
    bus: &EventBus,
    message: impl Into<String>,
    credential: impl Into<String>,
) -> String {
    let message = message.into();
    let timestamp = chrono::Utc::now().timestamp_millis();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let reply_id = format!("ai-{timestamp}-{}", &suffix[..8]);

    bus.publish(AppEvent::UserMessageSent(UserMessagePayload {
        message: message.clone(),
        message_id: format!("user-{timestamp}"),
    }));
    bus.publish(AppEvent::AiResponseRequested(ResponseRequestPayload {
        message,
        message_id: reply_id.clone(),
        api_key: credential.into(),
    }));
    reply_id
}
