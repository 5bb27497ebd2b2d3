use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::SessionId;

/// The current session for a user, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Identifier to attach to chat requests.
    pub session_id: SessionId,

    /// Display title; new sessions are called "New Session".
    #[serde(default)]
    pub title: Option<String>,

    /// When the session was created.
    #[serde(with = "crate::utils::time")]
    pub created_at: OffsetDateTime,

    /// When a message was last added to the session.
    #[serde(with = "crate::utils::time")]
    pub updated_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_backend_payload() {
        let info: SessionInfo = serde_json::from_value(json!({
            "session_id": "abc",
            "title": "New Session",
            "created_at": "2025-01-02T03:04:05.678901+00:00",
            "updated_at": "2025-01-02T03:04:05Z",
        }))
        .unwrap();
        assert_eq!(info.session_id, SessionId::new("abc"));
        assert_eq!(info.title.as_deref(), Some("New Session"));
        assert_eq!(info.created_at.year(), 2025);
        assert_eq!(info.updated_at.second(), 5);
    }
}
