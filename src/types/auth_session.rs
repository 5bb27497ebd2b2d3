use std::fmt;

use serde::{Deserialize, Serialize};

/// The account an [`AuthSession`] belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Provider-assigned user id; also the key for chat session lookup.
    pub id: String,

    /// Account email, when the provider reports it.
    #[serde(default)]
    pub email: Option<String>,
}

/// A signed-in session issued by the authentication provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Bearer token for authenticated requests.
    pub access_token: String,

    /// Token type, normally "bearer".
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,

    /// Token used to obtain a fresh access token.
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// The signed-in account.
    pub user: AuthUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl AuthSession {
    /// The signed-in user's id.
    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_token_response() {
        let session: AuthSession = serde_json::from_value(json!({
            "access_token": "secret-token",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh",
            "user": {"id": "user-1", "email": "a@example.com", "aud": "authenticated"},
        }))
        .unwrap();
        assert_eq!(session.user_id(), "user-1");
        assert_eq!(session.expires_in, Some(3600));
    }

    #[test]
    fn debug_redacts_tokens() {
        let session = AuthSession {
            access_token: "secret-token".to_string(),
            token_type: "bearer".to_string(),
            expires_in: None,
            refresh_token: Some("refresh-secret".to_string()),
            user: AuthUser {
                id: "user-1".to_string(),
                email: None,
            },
        };
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("secret-token"));
        assert!(!rendered.contains("refresh-secret"));
        assert!(rendered.contains("user-1"));
    }
}
