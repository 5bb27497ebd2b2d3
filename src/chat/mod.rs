//! Chat application module for interactive conversations with the backend.
//!
//! This module provides the pieces the `threadweaver-chat` REPL is built
//! from. It supports:
//!
//! - Sign-in or sign-up before the conversation starts
//! - Restoring the user's current session and its history
//! - Slash commands for inspecting the conversation and working with documents
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`commands`]: Slash command parsing
//! - [`prompt`]: Password input without echo
//!
//! The conversation itself is driven by [`crate::ConversationController`].

mod commands;
mod config;
mod prompt;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use prompt::{read_password, read_password_from};
