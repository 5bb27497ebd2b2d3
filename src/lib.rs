// Public modules
pub mod auth;
pub mod chat;
pub mod client;
pub mod config;
pub mod controller;
pub mod conversation_logger;
pub mod error;
pub mod login;
pub mod observability;
pub mod render;
pub mod retry;
pub mod session;
pub mod transport;
pub mod types;
pub mod utils;

// Re-exports
pub use auth::{Authenticator, SupabaseAuth};
pub use client::BackendClient;
pub use config::ClientConfig;
pub use controller::{
    ConversationController, ConversationState, ConversationStats, SessionInit, SubmitOutcome,
};
pub use conversation_logger::{ConversationLogger, StderrLogger};
pub use error::{Error, Result};
pub use login::{LoginFlow, LoginForm, LoginMode, LoginOutcome, Route};
pub use observability::register_biometrics;
pub use render::{PlainTextRenderer, Renderer};
pub use retry::RetryPolicy;
pub use session::SessionResolver;
pub use transport::{ChatRequest, ChatTransport};
pub use types::*;
