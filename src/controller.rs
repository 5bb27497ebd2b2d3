//! The conversation state machine.
//!
//! A [`ConversationController`] owns one conversation: the unsent draft, the
//! append-only message history, the pending flag and the session id. It is the
//! only writer of that state. Presentation code forwards user intents through
//! [`ConversationController::update_draft`] and
//! [`ConversationController::submit_draft`] and watches the state through
//! [`ConversationController::subscribe`].
//!
//! # Submission cycle
//!
//! ```text
//! IDLE --submit(non-empty)--> PENDING --reply--> IDLE (user + assistant appended)
//! IDLE --submit(non-empty)--> PENDING --error--> IDLE (user message kept)
//! IDLE --submit(blank)------> IDLE (nothing changes)
//! ```
//!
//! A failed send keeps the user's message in history without a reply; the
//! error is handed back in [`SubmitOutcome::Failed`] for display.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use threadweaver::{
//!     ChatRequest, ChatTransport, ConversationController, Error, Message, Result, SessionId,
//!     SessionResolver,
//! };
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl ChatTransport for Echo {
//!     async fn send(&self, request: &ChatRequest) -> Result<String> {
//!         Ok(request.latest().map(|m| m.content.clone()).unwrap_or_default())
//!     }
//! }
//!
//! #[async_trait]
//! impl SessionResolver for Echo {
//!     async fn resolve_session(&self, _: &str) -> Result<SessionId> {
//!         Err(Error::unknown("no sessions"))
//!     }
//!     async fn fetch_history(&self, _: &SessionId) -> Result<Vec<Message>> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let mut controller = ConversationController::with_backend(Arc::new(Echo));
//! controller.update_draft("hello");
//! let outcome = controller.submit_draft().await;
//! assert_eq!(outcome.reply(), Some(&Message::assistant("hello")));
//! assert_eq!(controller.history().len(), 2);
//! # });
//! ```

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;

use crate::conversation_logger::ConversationLogger;
use crate::error::{Error, Result};
use crate::observability::{
    CONVERSATION_FAILURES, CONVERSATION_REPLIES, CONVERSATION_SKIPPED, CONVERSATION_SUBMITS,
    CONVERSATION_TURN_DURATION, SESSION_FAILURES, SESSION_RESTORED,
};
use crate::session::SessionResolver;
use crate::transport::{ChatRequest, ChatTransport};
use crate::types::{Message, SessionId};

/// Snapshot of a conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    /// Text the user has typed but not sent.
    pub draft: String,
    /// Every message so far, oldest first.
    pub history: Vec<Message>,
    /// True while a request to the chat endpoint is outstanding.
    pub pending: bool,
    /// The resolved session, if any.
    pub session_id: Option<SessionId>,
}

/// Result of [`ConversationController::submit_draft`].
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// The draft was blank; nothing was sent and nothing changed.
    Skipped,
    /// The endpoint replied; the reply was appended to history.
    Replied(Message),
    /// The request failed; the user's message remains in history.
    Failed(Error),
}

impl SubmitOutcome {
    /// Returns true if the draft was blank.
    pub fn is_skipped(&self) -> bool {
        matches!(self, SubmitOutcome::Skipped)
    }

    /// Returns true if a reply arrived.
    pub fn is_replied(&self) -> bool {
        matches!(self, SubmitOutcome::Replied(_))
    }

    /// Returns true if the request failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, SubmitOutcome::Failed(_))
    }

    /// The reply, if one arrived.
    pub fn reply(&self) -> Option<&Message> {
        match self {
            SubmitOutcome::Replied(message) => Some(message),
            _ => None,
        }
    }

    /// The failure, if the request failed.
    pub fn error(&self) -> Option<&Error> {
        match self {
            SubmitOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Result of [`ConversationController::initialize_session`].
#[derive(Debug, Clone)]
pub enum SessionInit {
    /// The session was resolved and `restored` prior messages were loaded.
    Restored {
        /// The resolved session.
        session_id: SessionId,
        /// Number of prior messages placed into history.
        restored: usize,
    },
    /// A session was already resolved; nothing changed.
    AlreadyInitialized,
    /// Resolution failed; the conversation continues without a session.
    Unsaved {
        /// Why the session could not be resolved.
        error: Error,
    },
}

impl SessionInit {
    /// Returns true if a session was resolved by this call.
    pub fn is_restored(&self) -> bool {
        matches!(self, SessionInit::Restored { .. })
    }

    /// The failure, if resolution failed.
    pub fn error(&self) -> Option<&Error> {
        match self {
            SessionInit::Unsaved { error } => Some(error),
            _ => None,
        }
    }
}

/// Counters for a single controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversationStats {
    /// Messages in history, including restored ones.
    pub message_count: usize,
    /// Drafts accepted and sent.
    pub submissions: u64,
    /// Replies received.
    pub replies: u64,
    /// Sends that failed.
    pub failures: u64,
}

/// Owns the draft, history, pending flag and session of one conversation.
pub struct ConversationController {
    transport: Arc<dyn ChatTransport>,
    resolver: Arc<dyn SessionResolver>,
    logger: Option<Arc<dyn ConversationLogger>>,
    state: ConversationState,
    updates: watch::Sender<ConversationState>,
    submissions: u64,
    replies: u64,
    failures: u64,
}

impl ConversationController {
    /// Creates a controller with an empty conversation and no session.
    pub fn new(transport: Arc<dyn ChatTransport>, resolver: Arc<dyn SessionResolver>) -> Self {
        let state = ConversationState::default();
        let (updates, _) = watch::channel(state.clone());
        Self {
            transport,
            resolver,
            logger: None,
            state,
            updates,
            submissions: 0,
            replies: 0,
            failures: 0,
        }
    }

    /// Creates a controller that uses one backend for both chat and sessions.
    pub fn with_backend<B>(backend: Arc<B>) -> Self
    where
        B: ChatTransport + SessionResolver + 'static,
    {
        Self::new(backend.clone(), backend)
    }

    /// Creates a controller and resolves the user's session in one step.
    pub async fn start(
        transport: Arc<dyn ChatTransport>,
        resolver: Arc<dyn SessionResolver>,
        user_id: &str,
    ) -> (Self, SessionInit) {
        let mut controller = Self::new(transport, resolver);
        let init = controller.initialize_session(user_id).await;
        (controller, init)
    }

    /// Sets the event logger.
    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Returns a receiver that sees a fresh snapshot after every change.
    pub fn subscribe(&self) -> watch::Receiver<ConversationState> {
        self.updates.subscribe()
    }

    /// The unsent draft.
    pub fn draft(&self) -> &str {
        &self.state.draft
    }

    /// The conversation so far, oldest first.
    pub fn history(&self) -> &[Message] {
        &self.state.history
    }

    /// True while a request is outstanding.
    pub fn is_pending(&self) -> bool {
        self.state.pending
    }

    /// The resolved session, if any.
    pub fn session_id(&self) -> Option<&SessionId> {
        self.state.session_id.as_ref()
    }

    /// A snapshot of the whole state.
    pub fn state(&self) -> ConversationState {
        self.state.clone()
    }

    /// Counters for this controller.
    pub fn stats(&self) -> ConversationStats {
        ConversationStats {
            message_count: self.state.history.len(),
            submissions: self.submissions,
            replies: self.replies,
            failures: self.failures,
        }
    }

    /// Replaces the draft. No validation happens here.
    pub fn update_draft(&mut self, text: impl Into<String>) {
        self.state.draft = text.into();
        self.publish();
    }

    /// Resolves the user's session and loads its prior messages.
    ///
    /// The session id is committed only when both steps succeed. Prior
    /// messages replace the history only while it is still empty; once the
    /// user has sent something, local history is left as is.
    pub async fn initialize_session(&mut self, user_id: &str) -> SessionInit {
        if self.state.session_id.is_some() {
            return SessionInit::AlreadyInitialized;
        }

        match resolve(self.resolver.as_ref(), user_id).await {
            Ok((session_id, prior)) => {
                let restored = if self.state.history.is_empty() {
                    let restored = prior.len();
                    self.state.history = prior;
                    restored
                } else {
                    0
                };
                SESSION_RESTORED.click();
                if let Some(logger) = &self.logger {
                    logger.log_session_restored(&session_id, restored);
                }
                self.state.session_id = Some(session_id.clone());
                self.publish();
                SessionInit::Restored {
                    session_id,
                    restored,
                }
            }
            Err(error) => {
                SESSION_FAILURES.click();
                if let Some(logger) = &self.logger {
                    logger.log_session_failure(user_id, &error);
                }
                SessionInit::Unsaved { error }
            }
        }
    }

    /// Sends the draft and waits for the reply.
    ///
    /// A blank draft is ignored. Otherwise the draft becomes a user message,
    /// the draft is cleared, `pending` is raised for the duration of the
    /// request and the reply (if any) is appended.
    pub async fn submit_draft(&mut self) -> SubmitOutcome {
        let Some(request) = self.accept_draft() else {
            CONVERSATION_SKIPPED.click();
            return SubmitOutcome::Skipped;
        };

        let transport = Arc::clone(&self.transport);
        let flight = InFlight {
            controller: self,
            settled: false,
        };
        let start = Instant::now();
        let result = transport.send(&request).await;
        CONVERSATION_TURN_DURATION.add(start.elapsed().as_secs_f64());
        flight.settle(result)
    }

    fn accept_draft(&mut self) -> Option<ChatRequest> {
        if self.state.draft.trim().is_empty() {
            return None;
        }

        let message = Message::user(std::mem::take(&mut self.state.draft));
        if let Some(logger) = &self.logger {
            logger.log_submit(self.state.session_id.as_ref(), &message);
        }
        self.state.history.push(message);
        self.state.pending = true;
        self.submissions += 1;
        CONVERSATION_SUBMITS.click();
        self.publish();

        Some(ChatRequest::new(
            self.state.history.clone(),
            self.state.session_id.clone(),
        ))
    }

    fn publish(&self) {
        self.updates.send_replace(self.state.clone());
    }
}

async fn resolve(
    resolver: &dyn SessionResolver,
    user_id: &str,
) -> Result<(SessionId, Vec<Message>)> {
    let session_id = resolver.resolve_session(user_id).await?;
    let history = resolver.fetch_history(&session_id).await?;
    Ok((session_id, history))
}

/// A request that has been accepted but not yet answered.
///
/// Dropping it without calling `settle` (the submit future was dropped) still
/// lowers `pending`.
struct InFlight<'a> {
    controller: &'a mut ConversationController,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self, result: Result<String>) -> SubmitOutcome {
        self.settled = true;
        let controller = &mut *self.controller;
        controller.state.pending = false;

        let outcome = match result {
            Ok(reply) => {
                let message = Message::assistant(reply);
                if let Some(logger) = &controller.logger {
                    logger.log_reply(controller.state.session_id.as_ref(), &message);
                }
                controller.state.history.push(message.clone());
                controller.replies += 1;
                CONVERSATION_REPLIES.click();
                SubmitOutcome::Replied(message)
            }
            Err(error) => {
                if let Some(logger) = &controller.logger {
                    logger.log_transport_failure(controller.state.session_id.as_ref(), &error);
                }
                controller.failures += 1;
                CONVERSATION_FAILURES.click();
                SubmitOutcome::Failed(error)
            }
        };

        controller.publish();
        outcome
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.controller.state.pending = false;
            self.controller.publish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::future;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    struct EchoTransport;

    #[async_trait]
    impl ChatTransport for EchoTransport {
        async fn send(&self, request: &ChatRequest) -> Result<String> {
            let latest = request.latest().map(|m| m.content.clone()).unwrap_or_default();
            Ok(format!("echo: {latest}"))
        }
    }

    struct StalledTransport;

    #[async_trait]
    impl ChatTransport for StalledTransport {
        async fn send(&self, _: &ChatRequest) -> Result<String> {
            future::pending().await
        }
    }

    struct NoSessions;

    #[async_trait]
    impl SessionResolver for NoSessions {
        async fn resolve_session(&self, _: &str) -> Result<SessionId> {
            Err(Error::not_found("no session store", None, None))
        }

        async fn fetch_history(&self, _: &SessionId) -> Result<Vec<Message>> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct RecordingLogger {
        events: Mutex<Vec<String>>,
    }

    impl ConversationLogger for RecordingLogger {
        fn log_submit(&self, _: Option<&SessionId>, message: &Message) {
            self.events.lock().unwrap().push(format!("submit:{}", message.content));
        }

        fn log_reply(&self, _: Option<&SessionId>, message: &Message) {
            self.events.lock().unwrap().push(format!("reply:{}", message.content));
        }

        fn log_transport_failure(&self, _: Option<&SessionId>, _: &Error) {
            self.events.lock().unwrap().push("failure".to_string());
        }

        fn log_session_restored(&self, session_id: &SessionId, restored: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("session:{session_id}:{restored}"));
        }

        fn log_session_failure(&self, user_id: &str, _: &Error) {
            self.events
                .lock()
                .unwrap()
                .push(format!("session_failed:{user_id}"));
        }
    }

    fn controller(transport: impl ChatTransport + 'static) -> ConversationController {
        ConversationController::new(Arc::new(transport), Arc::new(NoSessions))
    }

    #[test]
    fn new_controller_is_idle() {
        let controller = controller(EchoTransport);
        assert_eq!(controller.state(), ConversationState::default());
        assert_eq!(controller.stats(), ConversationStats::default());
    }

    #[test]
    fn update_draft_is_unconditional() {
        let mut controller = controller(EchoTransport);
        controller.update_draft("   ");
        assert_eq!(controller.draft(), "   ");
        controller.update_draft("hello");
        assert_eq!(controller.draft(), "hello");
        assert!(controller.history().is_empty());
    }

    #[tokio::test]
    async fn submit_appends_user_then_reply() {
        let mut controller = controller(EchoTransport);
        controller.update_draft("hello");
        let outcome = controller.submit_draft().await;
        assert_eq!(outcome.reply(), Some(&Message::assistant("echo: hello")));
        assert_eq!(
            controller.history(),
            &[Message::user("hello"), Message::assistant("echo: hello")]
        );
        assert_eq!(controller.draft(), "");
        assert!(!controller.is_pending());
        let stats = controller.stats();
        assert_eq!(stats.submissions, 1);
        assert_eq!(stats.replies, 1);
        assert_eq!(stats.message_count, 2);
    }

    #[tokio::test]
    async fn blank_draft_is_skipped() {
        let mut controller = controller(EchoTransport);
        controller.update_draft(" \t\n");
        let before = controller.state();
        assert!(controller.submit_draft().await.is_skipped());
        assert_eq!(controller.state(), before);
        assert_eq!(controller.stats().submissions, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_submit_clears_pending() {
        let mut controller = controller(StalledTransport);
        controller.update_draft("anyone there?");
        let timed_out =
            tokio::time::timeout(Duration::from_millis(10), controller.submit_draft()).await;
        assert!(timed_out.is_err());
        assert!(!controller.is_pending());
        assert_eq!(controller.history(), &[Message::user("anyone there?")]);
        assert!(!controller.subscribe().borrow().pending);
    }

    #[tokio::test]
    async fn logger_sees_each_transition() {
        let logger = Arc::new(RecordingLogger::default());
        let mut controller = controller(EchoTransport).with_logger(logger.clone());
        assert!(!controller.initialize_session("user-1").await.is_restored());
        controller.update_draft("ping");
        controller.submit_draft().await;
        assert_eq!(
            *logger.events.lock().unwrap(),
            vec![
                "session_failed:user-1".to_string(),
                "submit:ping".to_string(),
                "reply:echo: ping".to_string(),
            ]
        );
    }
}
