//! Rolling per-session conversation history.

use crate::llm::ChatMessage;

/// Number of messages (user/assistant pairs x2) exposed to the reasoning loop.
const RECENT_WINDOW: usize = 10;

/// Append-only conversation history.
///
/// Everything is retained until an explicit reset, but only the most recent
/// five exchanged pairs are visible to the controller per turn.
#[derive(Debug, Default)]
pub struct ChatHistory {
    messages: Vec<ChatMessage>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed exchange.
    pub fn push_pair(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.messages.push(ChatMessage::user(user));
        self.messages.push(ChatMessage::assistant(assistant));
    }

    /// The bounded suffix shown to the controller: at most the last
    /// [`RECENT_WINDOW`] messages.
    pub fn recent(&self) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(RECENT_WINDOW);
        &self.messages[start..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
