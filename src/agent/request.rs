//! Per-request state: credential, lifecycle status and outcome.

use std::fmt;

use strum::{Display, IntoStaticStr};

use crate::bus::ResponseRequestPayload;
use crate::error::{Result, SwitchboardError};
use crate::stream::ToolCallAccumulator;

/// Upstream API key. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The key as sent on the wire (trimmed).
    pub fn expose(&self) -> &str {
        self.0.trim()
    }

    /// Reject empty or implausibly short keys before any network traffic.
    pub fn validate(&self, min_len: usize) -> Result<()> {
        let key = self.expose();
        if key.is_empty() {
            return Err(SwitchboardError::CredentialInvalid("no API key provided".to_string()));
        }
        if key.chars().count() < min_len {
            return Err(SwitchboardError::CredentialInvalid(format!(
                "API key must be at least {min_len} characters"
            )));
        }
        Ok(())
    }

    /// First few characters followed by an ellipsis, for display.
    pub fn masked(&self) -> String {
        let key = self.expose();
        let visible: String = key.chars().take(6).collect();
        if key.chars().count() <= 6 {
            "…".to_string()
        } else {
            format!("{visible}…")
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&"<redacted>").finish()
    }
}

impl From<String> for Credential {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Credential {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Lifecycle of one pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
pub enum RequestStatus {
    Idle,
    Requested,
    Streaming,
    ToolExecuting,
    Completed,
    Errored,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Errored)
    }

    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Idle, Requested)
                | (Requested, Streaming)
                | (Streaming, ToolExecuting)
                | (Streaming, Completed)
                | (ToolExecuting, ToolExecuting)
                | (ToolExecuting, Completed)
                | (_, Errored)
        )
    }
}

/// Inbound request for one assistant response.
#[derive(Debug, Clone)]
pub struct ResponseRequest {
    pub message: String,
    pub message_id: String,
    pub credential: Credential,
}

impl ResponseRequest {
    pub fn new(
        message: impl Into<String>,
        message_id: impl Into<String>,
        credential: impl Into<Credential>,
    ) -> Self {
        Self {
            message: message.into(),
            message_id: message_id.into(),
            credential: credential.into(),
        }
    }
}

impl From<ResponseRequestPayload> for ResponseRequest {
    fn from(payload: ResponseRequestPayload) -> Self {
        Self::new(payload.message, payload.message_id, payload.api_key)
    }
}

/// Working state owned by exactly one in-flight request.
#[derive(Debug)]
pub struct PendingRequest {
    pub message_id: String,
    status: RequestStatus,
    /// Text streamed so far.
    pub buffer: String,
    pub accumulator: ToolCallAccumulator,
}

impl PendingRequest {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            status: RequestStatus::Idle,
            buffer: String::new(),
            accumulator: ToolCallAccumulator::new(),
        }
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn advance(&mut self, next: RequestStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(SwitchboardError::InvalidState(format!(
                "request {} cannot move from {} to {next}",
                self.message_id, self.status
            )));
        }
        self.status = next;
        Ok(())
    }
}

/// How a request ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    Completed {
        message_id: String,
        full_response: String,
        tool_calls: usize,
    },
    Errored {
        message_id: String,
        error: String,
    },
}

impl RequestOutcome {
    pub fn message_id(&self) -> &str {
        match self {
            Self::Completed { message_id, .. } | Self::Errored { message_id, .. } => message_id,
        }
    }

    pub fn status(&self) -> RequestStatus {
        match self {
            Self::Completed { .. } => RequestStatus::Completed,
            Self::Errored { .. } => RequestStatus::Errored,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_rules() {
        assert!(Credential::new("   ").validate(10).is_err());
        assert!(Credential::new("sk-short").validate(10).is_err());
        assert!(Credential::new("  sk-or-v1-0123456789  ").validate(10).is_ok());
        assert_eq!(Credential::new(" abc ").expose(), "abc");
    }

    #[test]
    fn credential_debug_is_redacted() {
        let rendered = format!("{:?}", Credential::new("sk-or-v1-secret"));
        assert!(!rendered.contains("secret"));
        assert_eq!(Credential::new("sk-or-v1-secret").masked(), "sk-or-…");
    }

    #[test]
    fn lifecycle_transitions() {
        use RequestStatus::*;
        assert!(Idle.can_transition_to(Requested));
        assert!(Streaming.can_transition_to(Completed));
        assert!(ToolExecuting.can_transition_to(ToolExecuting));
        assert!(Requested.can_transition_to(Errored));
        assert!(!Idle.can_transition_to(Streaming));
        assert!(!Completed.can_transition_to(Errored));
        assert!(!Errored.can_transition_to(Requested));
    }

    #[test]
    fn illegal_advance_is_invalid_state() {
        let mut request = PendingRequest::new("ai-1");
        let err = request.advance(RequestStatus::Completed).unwrap_err();
        assert!(matches!(err, SwitchboardError::InvalidState(_)));
        assert_eq!(request.status(), RequestStatus::Idle);
    }
}
