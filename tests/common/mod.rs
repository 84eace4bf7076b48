//! Shared test helpers: event recorder and stream body builders.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use switchboard::agent::ConversationAgent;
use switchboard::bus::{Event, EventBus, EventKind, Subscription};
use switchboard::config::AgentConfig;
use strum::IntoEnumIterator;

pub const TEST_KEY: &str = "sk-or-v1-test-0123456789";

/// Records every event published on a bus, in emission order.
pub struct EventRecorder {
    events: Arc<Mutex<Vec<Event>>>,
    _subscriptions: Vec<Subscription>,
}

impl EventRecorder {
    pub fn attach(bus: &EventBus) -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let subscriptions = EventKind::iter()
            .map(|kind| {
                let sink = events.clone();
                bus.subscribe(kind, move |event: Arc<Event>| {
                    sink.lock().unwrap().push((*event).clone());
                    async { Ok(()) }
                })
            })
            .collect();
        Self {
            events,
            _subscriptions: subscriptions,
        }
    }

    pub fn all(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn of(&self, kind: EventKind) -> Vec<Event> {
        self.all().into_iter().filter(|e| e.is(kind)).collect()
    }

    pub fn types(&self) -> Vec<String> {
        self.all().into_iter().map(|e| e.event_type).collect()
    }

    /// Chunk texts for one message id.
    pub fn chunks(&self, message_id: &str) -> Vec<String> {
        self.of(EventKind::AiResponseChunk)
            .into_iter()
            .filter(|e| e.payload["messageId"] == message_id)
            .map(|e| e.payload["chunk"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    /// Wait until at least `count` events of `kind` were seen.
    pub async fn wait_for(&self, kind: EventKind, count: usize) -> Vec<Event> {
        for _ in 0..200 {
            let seen = self.of(kind);
            if seen.len() >= count {
                return seen;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("timed out waiting for {count} {kind} events; saw {:?}", self.types());
    }
}

pub fn text_chunk(text: &str) -> Value {
    json!({ "choices": [{ "index": 0, "delta": { "content": text } }] })
}

pub fn tool_chunk(index: u32, id: Option<&str>, name: Option<&str>, arguments: &str) -> Value {
    let mut call = json!({ "index": index, "function": { "arguments": arguments } });
    if let Some(id) = id {
        call["id"] = json!(id);
        call["type"] = json!("function");
    }
    if let Some(name) = name {
        call["function"]["name"] = json!(name);
    }
    json!({ "choices": [{ "index": 0, "delta": { "tool_calls": [call] } }] })
}

pub fn finish_chunk(reason: &str) -> Value {
    json!({ "choices": [{ "index": 0, "delta": {}, "finish_reason": reason }] })
}

/// `data:` records separated by blank lines and terminated by `[DONE]`.
pub fn sse_body(records: &[Value]) -> String {
    let mut body = String::new();
    for record in records {
        body.push_str("data: ");
        body.push_str(&record.to_string());
        body.push_str("\n\n");
    }
    body.push_str("data: [DONE]\n\n");
    body
}

pub fn config_for(base_url: &str) -> AgentConfig {
    AgentConfig::default().with_base_url(base_url)
}

pub fn agent_for(bus: &EventBus, base_url: &str) -> ConversationAgent {
    ConversationAgent::from_config(bus.clone(), &config_for(base_url)).unwrap()
}
