//! Conversation history kept by a transport.

use crate::messages::{ChatMessage, Role};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Ordered chat history with at most one system message, always first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Create an empty conversation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a conversation starting with a system message.
    pub fn with_system_message(text: impl Into<String>) -> Self {
        let mut conversation = Self::new();
        conversation.set_system_message(text);
        conversation
    }

    /// Set the system message.
    ///
    /// Replaces the existing system entry in place, otherwise inserts one at
    /// the front. Calling this repeatedly never grows the history.
    pub fn set_system_message(&mut self, text: impl Into<String>) {
        let text = text.into();
        match self.messages.iter_mut().find(|m| m.role == Role::System) {
            Some(existing) => {
                debug!("Replacing system message");
                existing.content = Some(text);
            }
            None => self.messages.insert(0, ChatMessage::system(text)),
        }
    }

    /// The current system message text.
    #[must_use]
    pub fn system_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .and_then(|m| m.content.as_deref())
    }

    /// Append a message.
    ///
    /// System messages are routed through [`set_system_message`](Self::set_system_message).
    pub fn push(&mut self, message: ChatMessage) {
        if message.role == Role::System {
            self.set_system_message(message.content.unwrap_or_default());
        } else {
            self.messages.push(message);
        }
    }

    /// Append a user message.
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.push(ChatMessage::user(text));
    }

    /// Append an assistant message.
    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.push(ChatMessage::assistant(text));
    }

    /// All messages in order.
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop every message except the system message.
    pub fn clear(&mut self) {
        debug!(messages = self.messages.len(), "Clearing conversation");
        self.messages.retain(|m| m.role == Role::System);
    }
}
