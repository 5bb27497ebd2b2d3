use biometrics::{Collector, Counter, Moments};

pub(crate) static CONVERSATION_SUBMITS: Counter =
    Counter::new("threadweaver.conversation.submits");
pub(crate) static CONVERSATION_SKIPPED: Counter =
    Counter::new("threadweaver.conversation.skipped");
pub(crate) static CONVERSATION_REPLIES: Counter =
    Counter::new("threadweaver.conversation.replies");
pub(crate) static CONVERSATION_FAILURES: Counter =
    Counter::new("threadweaver.conversation.failures");
pub(crate) static CONVERSATION_TURN_DURATION: Moments =
    Moments::new("threadweaver.conversation.turn_duration_seconds");

pub(crate) static SESSION_RESTORED: Counter = Counter::new("threadweaver.session.restored");
pub(crate) static SESSION_FAILURES: Counter = Counter::new("threadweaver.session.failures");
pub(crate) static SESSION_SKIPPED_MESSAGES: Counter =
    Counter::new("threadweaver.session.skipped_messages");

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("threadweaver.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter =
    Counter::new("threadweaver.client.request_errors");
pub(crate) static CLIENT_REQUEST_RETRIES: Counter = Counter::new("threadweaver.client.retries");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("threadweaver.client.request_duration_seconds");
pub(crate) static CLIENT_RETRY_BACKOFF: Moments =
    Moments::new("threadweaver.client.retry_backoff_seconds");

pub(crate) static AUTH_SIGN_INS: Counter = Counter::new("threadweaver.auth.sign_ins");
pub(crate) static AUTH_SIGN_UPS: Counter = Counter::new("threadweaver.auth.sign_ups");
pub(crate) static AUTH_FAILURES: Counter = Counter::new("threadweaver.auth.failures");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CONVERSATION_SUBMITS);
    collector.register_counter(&CONVERSATION_SKIPPED);
    collector.register_counter(&CONVERSATION_REPLIES);
    collector.register_counter(&CONVERSATION_FAILURES);
    collector.register_moments(&CONVERSATION_TURN_DURATION);

    collector.register_counter(&SESSION_RESTORED);
    collector.register_counter(&SESSION_FAILURES);
    collector.register_counter(&SESSION_SKIPPED_MESSAGES);

    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_counter(&CLIENT_REQUEST_RETRIES);
    collector.register_moments(&CLIENT_REQUEST_DURATION);
    collector.register_moments(&CLIENT_RETRY_BACKOFF);

    collector.register_counter(&AUTH_SIGN_INS);
    collector.register_counter(&AUTH_SIGN_UPS);
    collector.register_counter(&AUTH_FAILURES);
}
