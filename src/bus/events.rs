//! Application event vocabulary.
//!
//! Every occurrence that crosses the bus has a wire name ([`EventKind`]) and a
//! camelCase JSON payload. [`AppEvent`] is the typed union used by publishers
//! inside the crate; subscribers outside it only need the wire names and can
//! decode payloads with [`Event::decode`](super::Event::decode).

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{Result, SwitchboardError};

use super::Event;

/// Wire names of all application events.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
    EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    UserMessageSent,
    AiResponseRequested,
    AiResponseChunk,
    AiResponseComplete,
    AiResponseError,
    SidebarToggle,
    ToolCall,
    ClearChat,
    ThemeChange,
    FormSubmit,
    SplitViewToggle,
    FormFill,
    SidebarResize,
    PageNavigate,
}

/// Color scheme of the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Full pages the host can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Page {
    Chat,
    Settings,
    Form,
}

/// Pages that can be shown next to the chat. `None` closes the split view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SplitViewPage {
    Settings,
    Form,
    None,
}

/// Sidebar widths: small = 16rem, medium = 20rem, large = 24rem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SidebarSize {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMessagePayload {
    pub message: String,
    pub message_id: String,
}

/// Asks the agent to answer `message`. `api_key` is the caller's credential.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRequestPayload {
    pub message: String,
    pub message_id: String,
    pub api_key: String,
}

impl std::fmt::Debug for ResponseRequestPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseRequestPayload")
            .field("message", &self.message)
            .field("message_id", &self.message_id)
            .field("api_key", &"..")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkPayload {
    pub chunk: String,
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionPayload {
    pub full_response: String,
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub error: String,
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SidebarTogglePayload {
    pub is_open: bool,
}

/// Announces that the model invoked a tool, before it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallPayload {
    pub tool_name: String,
    pub arguments: serde_json::Value,
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearChatPayload {
    pub confirm: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeChangePayload {
    pub theme: Theme,
}

/// Contact form contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormData {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSubmitPayload {
    pub form_data: FormData,
    pub form_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitViewPayload {
    pub page: SplitViewPage,
    pub is_open: bool,
}

/// Fields the model wants written into the form. Absent fields are left as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormFillPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidebarResizePayload {
    pub size: SidebarSize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageNavigatePayload {
    pub page: Page,
}

/// Typed union of all application events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppEvent {
    UserMessageSent(UserMessagePayload),
    AiResponseRequested(ResponseRequestPayload),
    AiResponseChunk(ChunkPayload),
    AiResponseComplete(CompletionPayload),
    AiResponseError(ErrorPayload),
    SidebarToggle(SidebarTogglePayload),
    ToolCall(ToolCallPayload),
    ClearChat(ClearChatPayload),
    ThemeChange(ThemeChangePayload),
    FormSubmit(FormSubmitPayload),
    SplitViewToggle(SplitViewPayload),
    FormFill(FormFillPayload),
    SidebarResize(SidebarResizePayload),
    PageNavigate(PageNavigatePayload),
}

impl AppEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::UserMessageSent(_) => EventKind::UserMessageSent,
            Self::AiResponseRequested(_) => EventKind::AiResponseRequested,
            Self::AiResponseChunk(_) => EventKind::AiResponseChunk,
            Self::AiResponseComplete(_) => EventKind::AiResponseComplete,
            Self::AiResponseError(_) => EventKind::AiResponseError,
            Self::SidebarToggle(_) => EventKind::SidebarToggle,
            Self::ToolCall(_) => EventKind::ToolCall,
            Self::ClearChat(_) => EventKind::ClearChat,
            Self::ThemeChange(_) => EventKind::ThemeChange,
            Self::FormSubmit(_) => EventKind::FormSubmit,
            Self::SplitViewToggle(_) => EventKind::SplitViewToggle,
            Self::FormFill(_) => EventKind::FormFill,
            Self::SidebarResize(_) => EventKind::SidebarResize,
            Self::PageNavigate(_) => EventKind::PageNavigate,
        }
    }

    /// Payload as a JSON value, without the `type` tag.
    pub fn payload(&self) -> serde_json::Value {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(mut map)) => {
                map.remove("payload").unwrap_or(serde_json::Value::Null)
            }
            _ => serde_json::Value::Null,
        }
    }

    /// Decode an untyped envelope back into a typed event.
    pub fn from_event(event: &Event) -> Result<Self> {
        let tagged = serde_json::json!({
            "type": event.event_type,
            "payload": event.payload,
        });
        serde_json::from_value(tagged).map_err(|e| {
            SwitchboardError::InvalidArgument(format!(
                "unrecognized {} event: {e}",
                event.event_type
            ))
        })
    }
}

impl From<AppEvent> for Event {
    fn from(event: AppEvent) -> Self {
        Event::new(event.kind(), event.payload())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use strum::IntoEnumIterator;

    #[test]
    fn kinds_use_screaming_snake_wire_names() {
        assert_eq!(EventKind::AiResponseChunk.as_ref(), "AI_RESPONSE_CHUNK");
        assert_eq!(EventKind::SplitViewToggle.to_string(), "SPLIT_VIEW_TOGGLE");
        assert_eq!(
            "PAGE_NAVIGATE".parse::<EventKind>().unwrap(),
            EventKind::PageNavigate
        );
        assert_eq!(EventKind::iter().count(), 14);
    }

    #[test]
    fn payloads_are_camel_case() {
        let event = AppEvent::AiResponseComplete(CompletionPayload {
            full_response: "Hi there".into(),
            message_id: "m1".into(),
        });
        assert_eq!(
            event.payload(),
            json!({ "fullResponse": "Hi there", "messageId": "m1" })
        );

        let split = AppEvent::SplitViewToggle(SplitViewPayload {
            page: SplitViewPage::None,
            is_open: false,
        });
        assert_eq!(split.payload(), json!({ "page": "none", "isOpen": false }));
    }

    #[test]
    fn envelope_decodes_back_into_typed_event() {
        let original = AppEvent::SidebarResize(SidebarResizePayload {
            size: SidebarSize::Large,
        });
        let envelope: Event = original.clone().into();
        assert_eq!(envelope.event_type, "SIDEBAR_RESIZE");
        assert_eq!(AppEvent::from_event(&envelope).unwrap(), original);
    }

    #[test]
    fn unknown_envelope_type_is_rejected() {
        let envelope = Event::new("SOMETHING_ELSE", json!({}));
        assert!(AppEvent::from_event(&envelope).is_err());
    }

    #[test]
    fn form_fill_omits_absent_fields() {
        let payload = FormFillPayload {
            email: Some("ada@example.com".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({ "email": "ada@example.com" })
        );
    }

    #[test]
    fn request_payload_debug_hides_the_key() {
        let payload = ResponseRequestPayload {
            message: "hello".into(),
            message_id: "m1".into(),
            api_key: "sk-validkey123".into(),
        };
        assert!(!format!("{payload:?}").contains("sk-validkey123"));
    }
}
