use serde::{Deserialize, Serialize};

use crate::types::Message;

/// Body returned by the session messages endpoint.
///
/// Entries are kept as raw JSON so that a single malformed or unsupported
/// message does not discard the rest of the history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageListResponse {
    /// Stored messages, oldest first.
    #[serde(default)]
    pub messages: Vec<serde_json::Value>,
}

impl MessageListResponse {
    /// Parse every entry that is a valid [`Message`], preserving order.
    ///
    /// Returns the parsed messages and the number of entries skipped.
    pub fn into_messages(self) -> (Vec<Message>, usize) {
        let total = self.messages.len();
        let messages: Vec<Message> = self
            .messages
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect();
        let skipped = total - messages.len();
        (messages, skipped)
    }
}
