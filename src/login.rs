//! The login gate in front of the conversation.
//!
//! [`LoginFlow`] holds the email/password form, the sign-in or sign-up mode
//! and the current [`Route`]. The route only moves to [`Route::Chat`] after
//! the [`Authenticator`] accepts the credentials.

use std::fmt;
use std::sync::Arc;

use crate::auth::Authenticator;
use crate::error::{Error, Result};
use crate::types::{AuthSession, Credentials};

/// Shortest password accepted when registering.
pub const MIN_SIGN_UP_PASSWORD_LEN: usize = 6;

/// Whether the form signs into an existing account or creates a new one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginMode {
    /// Sign into an existing account.
    #[default]
    SignIn,
    /// Register a new account.
    SignUp,
}

impl LoginMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            LoginMode::SignIn => LoginMode::SignUp,
            LoginMode::SignUp => LoginMode::SignIn,
        }
    }
}

impl fmt::Display for LoginMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginMode::SignIn => write!(f, "sign in"),
            LoginMode::SignUp => write!(f, "sign up"),
        }
    }
}

/// Which screen the user is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Route {
    /// The login form; every flow starts here.
    #[default]
    Login,
    /// The conversation, reachable only with a session.
    Chat,
}

/// The values typed into the login form.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    /// Email address as typed; surrounding whitespace is trimmed on submit.
    pub email: String,
    /// Password as typed. Cleared after a rejected attempt.
    pub password: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Result of [`LoginFlow::submit`].
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// The form was incomplete; the provider was not contacted.
    Invalid(String),
    /// The provider accepted the credentials and the route is now `Chat`.
    Authenticated,
    /// The provider refused the credentials or could not be reached.
    Rejected(Error),
}

impl LoginOutcome {
    /// Returns true if the provider accepted the credentials.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, LoginOutcome::Authenticated)
    }
}

/// Form state and navigation for signing in.
pub struct LoginFlow {
    authenticator: Arc<dyn Authenticator>,
    form: LoginForm,
    mode: LoginMode,
    pending: bool,
    route: Route,
    session: Option<AuthSession>,
}

impl LoginFlow {
    /// Create a flow on the login route with an empty form in sign-in mode.
    pub fn new(authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            authenticator,
            form: LoginForm::default(),
            mode: LoginMode::default(),
            pending: false,
            route: Route::default(),
            session: None,
        }
    }

    /// Replace the email field.
    pub fn update_email(&mut self, email: impl Into<String>) {
        self.form.email = email.into();
    }

    /// Replace the password field.
    pub fn update_password(&mut self, password: impl Into<String>) {
        self.form.password = password.into();
    }

    /// Switch between signing in and signing up.
    pub fn set_mode(&mut self, mode: LoginMode) {
        self.mode = mode;
    }

    /// The current form values.
    pub fn form(&self) -> &LoginForm {
        &self.form
    }

    /// Whether submitting signs in or signs up.
    pub fn mode(&self) -> LoginMode {
        self.mode
    }

    /// Returns true while the provider is being asked.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// The screen the user is on.
    pub fn route(&self) -> Route {
        self.route
    }

    /// The session issued by the last successful submit.
    pub fn session(&self) -> Option<&AuthSession> {
        self.session.as_ref()
    }

    /// Validate the form and, if it is complete, ask the provider.
    pub async fn submit(&mut self) -> LoginOutcome {
        if let Err(reason) = self.validate() {
            return LoginOutcome::Invalid(reason);
        }

        let credentials = Credentials::new(self.form.email.trim(), self.form.password.clone());
        let authenticator = Arc::clone(&self.authenticator);
        let mode = self.mode;
        let attempt = Attempt::begin(self);
        let result = match mode {
            LoginMode::SignIn => authenticator.sign_in(&credentials).await,
            LoginMode::SignUp => authenticator.sign_up(&credentials).await,
        };
        attempt.settle(result)
    }

    /// Forget the session and go back to the login screen.
    pub fn sign_out(&mut self) {
        self.session = None;
        self.form.password.clear();
        self.route = Route::Login;
    }

    fn validate(&self) -> std::result::Result<(), String> {
        let email = self.form.email.trim();
        if email.is_empty() {
            return Err("email is required".to_string());
        }
        if !email.contains('@') {
            return Err(format!("{email} is not an email address"));
        }
        if self.form.password.is_empty() {
            return Err("password is required".to_string());
        }
        if self.mode == LoginMode::SignUp
            && self.form.password.chars().count() < MIN_SIGN_UP_PASSWORD_LEN
        {
            return Err(format!(
                "password must be at least {MIN_SIGN_UP_PASSWORD_LEN} characters"
            ));
        }
        Ok(())
    }
}

/// Keeps `pending` set for the duration of one provider call.
///
/// Dropping an unsettled attempt, as happens when the submit future is
/// cancelled, clears `pending` and leaves the rest of the flow untouched.
struct Attempt<'a> {
    flow: &'a mut LoginFlow,
    settled: bool,
}

impl<'a> Attempt<'a> {
    fn begin(flow: &'a mut LoginFlow) -> Self {
        flow.pending = true;
        Self {
            flow,
            settled: false,
        }
    }

    fn settle(mut self, result: Result<AuthSession>) -> LoginOutcome {
        self.settled = true;
        let flow = &mut *self.flow;
        flow.pending = false;
        match result {
            Ok(session) => {
                flow.session = Some(session);
                flow.route = Route::Chat;
                LoginOutcome::Authenticated
            }
            Err(error) => {
                flow.form.password.clear();
                LoginOutcome::Rejected(error)
            }
        }
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.flow.pending = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::types::AuthUser;

    #[derive(Default)]
    struct ScriptedAuth {
        calls: Mutex<Vec<(String, Credentials)>>,
        reject: bool,
        stall: bool,
    }

    impl ScriptedAuth {
        fn answer(&self, kind: &str, credentials: &Credentials) -> crate::Result<AuthSession> {
            self.calls
                .lock()
                .unwrap()
                .push((kind.to_string(), credentials.clone()));
            if self.reject {
                return Err(Error::authentication("Invalid login credentials"));
            }
            Ok(AuthSession {
                access_token: "token".to_string(),
                token_type: "bearer".to_string(),
                expires_in: None,
                refresh_token: None,
                user: AuthUser {
                    id: "user-1".to_string(),
                    email: Some(credentials.email.clone()),
                },
            })
        }
    }

    #[async_trait]
    impl Authenticator for ScriptedAuth {
        async fn sign_in(&self, credentials: &Credentials) -> crate::Result<AuthSession> {
            if self.stall {
                std::future::pending::<()>().await;
            }
            self.answer("sign_in", credentials)
        }

        async fn sign_up(&self, credentials: &Credentials) -> crate::Result<AuthSession> {
            self.answer("sign_up", credentials)
        }
    }

    fn flow(auth: &Arc<ScriptedAuth>) -> LoginFlow {
        LoginFlow::new(auth.clone())
    }

    #[tokio::test]
    async fn sign_in_navigates_to_chat() {
        let auth = Arc::new(ScriptedAuth::default());
        let mut flow = flow(&auth);
        flow.update_email("  a@example.com ");
        flow.update_password("hunter2");
        assert_eq!(flow.route(), Route::Login);

        assert!(flow.submit().await.is_authenticated());
        assert_eq!(flow.route(), Route::Chat);
        assert!(!flow.is_pending());
        assert_eq!(flow.session().unwrap().user_id(), "user-1");

        let calls = auth.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "sign_in");
        assert_eq!(calls[0].1.email, "a@example.com");
    }

    #[tokio::test]
    async fn empty_form_never_reaches_provider() {
        let auth = Arc::new(ScriptedAuth::default());
        let mut flow = flow(&auth);
        assert!(matches!(flow.submit().await, LoginOutcome::Invalid(_)));

        flow.update_email("not-an-address");
        flow.update_password("secret");
        assert!(matches!(flow.submit().await, LoginOutcome::Invalid(_)));

        flow.update_email("a@example.com");
        flow.update_password("");
        assert!(matches!(flow.submit().await, LoginOutcome::Invalid(_)));

        assert!(auth.calls.lock().unwrap().is_empty());
        assert_eq!(flow.route(), Route::Login);
    }

    #[tokio::test]
    async fn sign_up_requires_longer_password() {
        let auth = Arc::new(ScriptedAuth::default());
        let mut flow = flow(&auth);
        flow.set_mode(LoginMode::SignUp);
        flow.update_email("a@example.com");
        flow.update_password("12345");
        assert!(matches!(flow.submit().await, LoginOutcome::Invalid(_)));

        flow.update_password("123456");
        assert!(flow.submit().await.is_authenticated());
        assert_eq!(auth.calls.lock().unwrap()[0].0, "sign_up");
    }

    #[tokio::test]
    async fn rejection_stays_on_login_and_clears_password() {
        let auth = Arc::new(ScriptedAuth {
            reject: true,
            ..ScriptedAuth::default()
        });
        let mut flow = flow(&auth);
        flow.update_email("a@example.com");
        flow.update_password("wrong");

        let outcome = flow.submit().await;
        assert!(matches!(outcome, LoginOutcome::Rejected(ref e) if e.is_authentication()));
        assert_eq!(flow.route(), Route::Login);
        assert_eq!(flow.form().password, "");
        assert_eq!(flow.form().email, "a@example.com");
        assert!(flow.session().is_none());
    }

    #[tokio::test]
    async fn dropped_submit_clears_pending() {
        let auth = Arc::new(ScriptedAuth {
            stall: true,
            ..ScriptedAuth::default()
        });
        let mut flow = flow(&auth);
        flow.update_email("a@example.com");
        flow.update_password("hunter2");

        {
            let submit = flow.submit();
            futures::pin_mut!(submit);
            assert!(futures::poll!(submit.as_mut()).is_pending());
        }

        assert!(!flow.is_pending());
        assert_eq!(flow.route(), Route::Login);
        assert!(flow.session().is_none());
        assert_eq!(flow.form().password, "hunter2");
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_submit_clears_pending() {
        let auth = Arc::new(ScriptedAuth {
            stall: true,
            ..ScriptedAuth::default()
        });
        let mut flow = flow(&auth);
        flow.update_email("a@example.com");
        flow.update_password("hunter2");

        let result = tokio::time::timeout(Duration::from_secs(30), flow.submit()).await;
        assert!(result.is_err());
        assert!(!flow.is_pending());
        assert_eq!(flow.route(), Route::Login);
    }

    #[tokio::test]
    async fn sign_out_returns_to_login() {
        let auth = Arc::new(ScriptedAuth::default());
        let mut flow = flow(&auth);
        flow.update_email("a@example.com");
        flow.update_password("hunter2");
        flow.submit().await;
        flow.sign_out();
        assert_eq!(flow.route(), Route::Login);
        assert!(flow.session().is_none());
    }

    #[test]
    fn mode_toggles() {
        assert_eq!(LoginMode::SignIn.toggled(), LoginMode::SignUp);
        assert_eq!(LoginMode::SignUp.toggled(), LoginMode::SignIn);
        assert_eq!(LoginMode::SignUp.to_string(), "sign up");
    }
}
