//! Event logging for conversation controllers.
//!
//! This module provides the [`ConversationLogger`] trait that allows callers to
//! record every state transition a [`ConversationController`] goes through.
//!
//! [`ConversationController`]: crate::ConversationController

use std::io::{self, Write};

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::Error;
use crate::types::{Message, SessionId};

/// A trait for logging conversation events.
///
/// Implement this trait to capture submissions, replies and failures as they
/// happen. Calls are made synchronously from the controller, so implementations
/// should be quick.
///
/// # Example
///
/// ```rust,ignore
/// use threadweaver::{ConversationLogger, Error, Message, SessionId};
///
/// struct CountingLogger(std::sync::atomic::AtomicUsize);
///
/// impl ConversationLogger for CountingLogger {
///     fn log_submit(&self, _: Option<&SessionId>, _: &Message) {
///         self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///     }
///     fn log_reply(&self, _: Option<&SessionId>, _: &Message) {}
///     fn log_transport_failure(&self, _: Option<&SessionId>, _: &Error) {}
///     fn log_session_restored(&self, _: &SessionId, _: usize) {}
///     fn log_session_failure(&self, _: &str, _: &Error) {}
/// }
/// ```
pub trait ConversationLogger: Send + Sync {
    /// A non-empty draft was accepted and is about to be sent.
    fn log_submit(&self, session_id: Option<&SessionId>, message: &Message);

    /// The transport returned a reply, which was appended to history.
    fn log_reply(&self, session_id: Option<&SessionId>, message: &Message);

    /// The transport failed; the user's message stays in history.
    fn log_transport_failure(&self, session_id: Option<&SessionId>, error: &Error);

    /// A session was resolved and `restored` prior messages were loaded.
    fn log_session_restored(&self, session_id: &SessionId, restored: usize);

    /// Session resolution or history fetch failed for `user_id`.
    fn log_session_failure(&self, user_id: &str, error: &Error);
}

/// Writes one timestamped line per event to standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrLogger;

impl StderrLogger {
    /// Creates a new stderr logger.
    pub fn new() -> Self {
        Self
    }

    fn emit(&self, line: &str) {
        let now = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "-".to_string());
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{now} threadweaver {line}");
    }
}

fn session_label(session_id: Option<&SessionId>) -> &str {
    session_id.map(SessionId::as_str).unwrap_or("unsaved")
}

impl ConversationLogger for StderrLogger {
    fn log_submit(&self, session_id: Option<&SessionId>, message: &Message) {
        self.emit(&format!(
            "submit session={} chars={}",
            session_label(session_id),
            message.content.chars().count()
        ));
    }

    fn log_reply(&self, session_id: Option<&SessionId>, message: &Message) {
        self.emit(&format!(
            "reply session={} chars={}",
            session_label(session_id),
            message.content.chars().count()
        ));
    }

    fn log_transport_failure(&self, session_id: Option<&SessionId>, error: &Error) {
        self.emit(&format!(
            "send_failed session={} error=\"{}\"",
            session_label(session_id),
            error
        ));
    }

    fn log_session_restored(&self, session_id: &SessionId, restored: usize) {
        self.emit(&format!("session session={session_id} restored={restored}"));
    }

    fn log_session_failure(&self, user_id: &str, error: &Error) {
        self.emit(&format!("session_failed user={user_id} error=\"{error}\""));
    }
}
