//! Shared conversation history.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::types::ConversationMessage;

/// Ordered transcript shared by every request of one agent. Cloning yields
/// another handle to the same transcript.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    messages: Arc<Mutex<Vec<ConversationMessage>>>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ConversationMessage>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, message: ConversationMessage) {
        self.lock().push(message);
    }

    /// Append several messages without interleaving from other requests.
    pub fn extend(&self, messages: impl IntoIterator<Item = ConversationMessage>) {
        self.lock().extend(messages);
    }

    /// Copy of the transcript as it is now.
    pub fn snapshot(&self) -> Vec<ConversationMessage> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
