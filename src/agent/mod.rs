//! Conversation agent and request lifecycle.

pub mod agent;
pub mod conversation;
pub mod request;

pub use agent::{send_user_message, ConversationAgent};
pub use conversation::ConversationHistory;
pub use request::{Credential, PendingRequest, RequestOutcome, RequestStatus, ResponseRequest};
