use std::fmt;

use serde::{Deserialize, Serialize};

/// Who authored a message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Text the user typed and submitted.
    User,

    /// A reply returned by the chat endpoint.
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry in a conversation's history.
///
/// On the wire the role is carried in a `type` field; `role` is accepted as
/// an alias when reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The author of the message.
    #[serde(rename = "type", alias = "role")]
    pub role: MessageRole,

    /// The message text.
    pub content: String,
}

impl Message {
    /// Create a new `Message` with the given role and content.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a user-authored message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant reply.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Returns true if the user authored this message.
    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }

    /// Returns true if this message is an assistant reply.
    pub fn is_assistant(&self) -> bool {
        self.role == MessageRole::Assistant
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_role_as_type() {
        let message = Message::user("hello");
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value, json!({"type": "user", "content": "hello"}));
    }

    #[test]
    fn accepts_role_alias() {
        let message: Message =
            serde_json::from_value(json!({"role": "assistant", "content": "hi there"})).unwrap();
        assert_eq!(message, Message::assistant("hi there"));
        assert!(message.is_assistant());
    }

    #[test]
    fn rejects_unknown_role() {
        let parsed =
            serde_json::from_value::<Message>(json!({"type": "system", "content": "be nice"}));
        assert!(parsed.is_err());
    }
}
