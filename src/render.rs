//! Output rendering for the chat REPL.
//!
//! This module provides a renderer trait and a plain-text implementation that
//! writes conversation messages and status lines to a terminal.

use std::io::{self, Stdout, Write};

use crate::error::Error;
use crate::types::{Message, MessageRole};

/// ANSI escape code for dim text (used for the pending indicator).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the user label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for the assistant label).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Trait for rendering a conversation.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
pub trait Renderer: Send {
    /// Print one message with its role label.
    fn print_message(&mut self, message: &Message);

    /// Print a run of messages, oldest first.
    fn print_history(&mut self, messages: &[Message]) {
        for message in messages {
            self.print_message(message);
        }
    }

    /// Show that a reply is on its way.
    fn print_pending(&mut self);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print a failed operation, followed by a hint when one applies.
    fn print_failure(&mut self, context: &str, error: &Error) {
        self.print_error(&format!("{context}: {error}"));
        if let Some(hint) = failure_hint(error) {
            self.print_info(&hint);
        }
    }

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// Suggests what the user can do about an error, if anything.
pub fn failure_hint(error: &Error) -> Option<String> {
    if error.is_authentication() {
        return Some("Your sign-in was not accepted; restart to sign in again.".to_string());
    }
    if error.is_permission() {
        return Some("This account is not allowed to do that.".to_string());
    }
    if error.is_rate_limit() {
        return Some(match error.retry_after() {
            Some(secs) => format!("Too many requests; wait {secs} seconds and try again."),
            None => "Too many requests; wait a moment and try again.".to_string(),
        });
    }
    if error.is_connection() || error.is_timeout() {
        return Some("The backend did not answer; check that it is running.".to_string());
    }
    let server_side = matches!(error.status_code(), Some(500..=599));
    if error.is_server_error() || server_side {
        return Some("The backend had a problem; try again shortly.".to_string());
    }
    None
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer<W: Write + Send = Stdout> {
    out: W,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(io::stdout(), use_color)
    }
}

impl<W: Write + Send> PlainTextRenderer<W> {
    /// Renders into an arbitrary writer.
    pub fn with_writer(out: W, use_color: bool) -> Self {
        Self { out, use_color }
    }

    /// Consumes the renderer and returns its writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn label(&self, role: MessageRole) -> String {
        let (color, name) = match role {
            MessageRole::User => (ANSI_CYAN, "you"),
            MessageRole::Assistant => (ANSI_GREEN, "assistant"),
        };
        if self.use_color {
            format!("{color}{name}>{ANSI_RESET}")
        } else {
            format!("{name}>")
        }
    }

    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> Renderer for PlainTextRenderer<W> {
    fn print_message(&mut self, message: &Message) {
        let label = self.label(message.role);
        self.line(&format!("{label} {}", message.content));
    }

    fn print_pending(&mut self) {
        if self.use_color {
            self.line(&format!("{ANSI_DIM}...{ANSI_RESET}"));
        } else {
            self.line("...");
        }
    }

    fn print_error(&mut self, error: &str) {
        if self.use_color {
            self.line(&format!("{ANSI_RED}Error:{ANSI_RESET} {error}"));
        } else {
            self.line(&format!("Error: {error}"));
        }
    }

    fn print_info(&mut self, info: &str) {
        self.line(info);
    }
}
