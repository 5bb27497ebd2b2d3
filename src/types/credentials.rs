use std::fmt;

use serde::Serialize;

/// Email and password submitted to the authentication provider.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    /// Account email address.
    pub email: String,

    /// Account password.
    pub password: String,
}

impl Credentials {
    /// Create a new set of credentials.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
