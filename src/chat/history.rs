//! Ordered chat history and the provider-facing view of it.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::diagram::DiagramBlock;
use crate::llm::types::{Message, Role};

const FILLER_ASSISTANT: &str = "I understand.";
const FILLER_USER: &str = "Please continue.";

/// Body of a chat message: plain text or a diagram payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Diagram(DiagramBlock),
    Text(String),
}

impl MessageContent {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Diagram(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
    #[serde(with = "time::serde::rfc3339", default = "OffsetDateTime::now_utc")]
    pub timestamp: OffsetDateTime,
}

impl ChatMessage {
    #[must_use]
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self { role, content: MessageContent::Text(text.into()), timestamp: OffsetDateTime::now_utc() }
    }

    #[must_use]
    pub fn diagram(block: DiagramBlock) -> Self {
        Self { role: Role::Assistant, content: MessageContent::Diagram(block), timestamp: OffsetDateTime::now_utc() }
    }
}

/// Append-only message log for one browsing session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatHistory {
    messages: Vec<ChatMessage>,
}

impl ChatHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }

    #[cfg(test)]
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = ChatMessage>) {
        self.messages.extend(messages);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Text of the first user message, used as the archive title.
    #[must_use]
    pub fn first_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .and_then(|m| m.content.as_text())
    }
}

/// Convert history into the strictly alternating form providers accept.
///
/// Diagram messages are dropped. Two user turns in a row get a filler
/// assistant turn between them, and the list always ends on a user turn.
#[must_use]
pub fn prepare_messages(history: &[ChatMessage]) -> Vec<Message> {
    let mut out: Vec<Message> = Vec::with_capacity(history.len() + 1);

    for msg in history {
        let Some(text) = msg.content.as_text() else {
            continue;
        };
        let previous_was_user = out.last().is_some_and(|m| m.role == Role::User);
        if msg.role == Role::User && previous_was_user {
            out.push(Message::assistant(FILLER_ASSISTANT));
        }
        out.push(Message { role: msg.role, content: text.to_string() });
    }

    if out.last().is_some_and(|m| m.role != Role::User) {
        out.push(Message::user(FILLER_USER));
    }
    out
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
