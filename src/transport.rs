//! The seam between the conversation controller and the chat endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Message, SessionId};

/// Body sent to the chat endpoint: the whole conversation so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Full history, newest user message last.
    pub messages: Vec<Message>,

    /// Session the messages belong to, once resolved.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub session_id: Option<SessionId>,
}

impl ChatRequest {
    /// Create a request for the given history.
    pub fn new(messages: Vec<Message>, session_id: Option<SessionId>) -> Self {
        Self {
            messages,
            session_id,
        }
    }

    /// The newest message, which is the one being answered.
    pub fn latest(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Sends a conversation to the chat endpoint and returns the reply text.
///
/// Implementations report every transport or server failure as an error; the
/// controller decides what a failure means for conversation state.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send the conversation and wait for the assistant's reply.
    async fn send(&self, request: &ChatRequest) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn omits_missing_session() {
        let request = ChatRequest::new(vec![Message::user("hello")], None);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"messages": [{"type": "user", "content": "hello"}]})
        );
    }

    #[test]
    fn includes_session_when_known() {
        let request = ChatRequest::new(vec![Message::user("hello")], Some("abc".into()));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["session_id"], json!("abc"));
        assert_eq!(request.latest(), Some(&Message::user("hello")));
    }
}
