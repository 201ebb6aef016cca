//! Transcript entries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a transcript message.
///
/// Identifiers come from a per-controller counter and are never reused
/// within one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    /// Wraps a raw identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw identifier.
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The person typing.
    User,
    /// The assistant, including welcome and error messages.
    Bot,
}

/// One entry of the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Stable identifier.
    pub id: MessageId,
    /// Author; fixed at creation.
    pub sender: Sender,
    /// Display text.  Grows while a bot reply streams in.
    pub text: String,
}

impl Message {
    /// Creates a message.
    pub fn new(id: MessageId, sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id,
            sender,
            text: text.into(),
        }
    }

    /// Returns true if the user wrote this message.
    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }

    /// Returns true if the assistant wrote this message.
    pub fn is_bot(&self) -> bool {
        self.sender == Sender::Bot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, to_value};

    #[test]
    fn message_serialization() {
        let message = Message::new(MessageId::new(3), Sender::Bot, "Bonjour");
        assert_eq!(
            to_value(&message).unwrap(),
            json!({"id": 3, "sender": "bot", "text": "Bonjour"})
        );
    }

    #[test]
    fn id_display() {
        assert_eq!(MessageId::new(42).to_string(), "msg-42");
    }

    #[test]
    fn sender_predicates() {
        let message = Message::new(MessageId::new(0), Sender::User, "hi");
        assert!(message.is_user());
        assert!(!message.is_bot());
    }
}
