//! The seam between the conversation controller and session storage.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Message, SessionId};

/// Finds the current session for a user and the messages stored under it.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Returns the user's current session, creating one if needed.
    async fn resolve_session(&self, user_id: &str) -> Result<SessionId>;

    /// Returns the messages stored for a session, oldest first.
    async fn fetch_history(&self, session_id: &SessionId) -> Result<Vec<Message>>;
}
