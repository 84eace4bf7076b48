//! OpenAI-compatible `/chat/completions` streaming client (OpenRouter by default).

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::json;
use tracing::debug;

use super::http::{bearer_headers, build_client, insert_header, status_to_error};
use super::{ChatProvider, ChatRequest};
use crate::config::AgentConfig;
use crate::error::Result;
use crate::stream::{decode_stream, DeltaFrame};
use crate::tools::ToolDefinition;

#[derive(Debug, Clone)]
pub struct ChatCompletionsProvider {
    client: reqwest::Client,
    url: String,
    model: String,
    referer: String,
    title: String,
}

impl ChatCompletionsProvider {
    pub fn new(config: &AgentConfig) -> Result<Self> {
        let client = build_client(config.connect_timeout(), config.request_timeout())?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: reqwest::Client, config: &AgentConfig) -> Self {
        Self {
            client,
            url: config.completions_url(),
            model: config.model.clone(),
            referer: config.referer.clone(),
            title: config.title.clone(),
        }
    }

    fn build_request_body(&self, request: &ChatRequest) -> serde_json::Value {
        let mut body = json!({
            "model": self.model,
            "messages": request.messages,
            "stream": true,
            "temperature": request.settings.temperature,
            "max_tokens": request.settings.max_tokens,
        });
        if !request.tools.is_empty() {
            body["tools"] = request.tools.iter().map(ToolDefinition::to_wire).collect();
            body["tool_choice"] = json!(request.settings.tool_choice);
        }
        body
    }
}

#[async_trait]
impl ChatProvider for ChatCompletionsProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn stream_chat(
        &self,
        request: &ChatRequest,
        api_key: &str,
    ) -> Result<BoxStream<'static, Result<DeltaFrame>>> {
        let body = self.build_request_body(request);
        let mut headers = bearer_headers(api_key);
        insert_header(&mut headers, "http-referer", &self.referer);
        insert_header(&mut headers, "x-title", &self.title);

        debug!(
            model = self.model.as_str(),
            messages = request.messages.len(),
            tools = request.tools.len(),
            "chat completions stream"
        );

        let resp = self
            .client
            .post(&self.url)
            .headers(headers)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status.as_u16(), &body_text));
        }

        Ok(decode_stream(resp.bytes_stream()).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConversationMessage, SamplingSettings};

    fn provider() -> ChatCompletionsProvider {
        ChatCompletionsProvider::with_client(reqwest::Client::new(), &AgentConfig::default())
    }

    #[test]
    fn body_advertises_tools_with_auto_choice() {
        let request = ChatRequest {
            messages: vec![ConversationMessage::user("hello")],
            tools: vec![ToolDefinition {
                name: "clear_chat".to_string(),
                description: "Clear all messages from the chat".to_string(),
                parameters: json!({ "type": "object", "properties": {}, "required": [] }),
            }],
            settings: SamplingSettings::default(),
        };

        let body = provider().build_request_body(&request);

        assert_eq!(body["model"], "openai/gpt-4o");
        assert_eq!(body["stream"], true);
        assert_eq!(body["max_tokens"], 2048);
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "clear_chat");
        assert_eq!(body["messages"][0], json!({ "role": "user", "content": "hello" }));
    }

    #[test]
    fn body_omits_tool_fields_without_tools() {
        let request = ChatRequest {
            messages: vec![ConversationMessage::user("hello")],
            tools: Vec::new(),
            settings: SamplingSettings::default(),
        };
        let body = provider().build_request_body(&request);
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }
}
