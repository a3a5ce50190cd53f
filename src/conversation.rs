use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::prompts;

/// Role in conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A single exchanged message. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Ordered record of the current session's exchange.
///
/// Insertion order is display order. Messages are only ever appended;
/// `reset` swaps the whole sequence for a fresh greeting in one step, so the
/// renderer never observes a partially cleared list.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation seeded with the assistant greeting.
    pub fn new() -> Self {
        Self {
            messages: vec![Message::new(Role::Assistant, prompts::GREETING)],
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::new(Role::User, content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::new(Role::Assistant, content));
    }

    pub fn push_system(&mut self, content: impl Into<String>) {
        self.messages.push(Message::new(Role::System, content));
    }

    /// Replace the whole conversation with a single fresh greeting.
    pub fn reset(&mut self) {
        self.messages = vec![Message::new(Role::Assistant, prompts::CLEARED_GREETING)];
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
