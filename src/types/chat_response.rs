use serde::{Deserialize, Serialize};

use crate::types::Message;

/// Body returned by the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The assistant's reply.
    pub response_message: Message,

    /// The query the backend derived from the conversation.
    #[serde(default)]
    pub query_used: Option<String>,
}
