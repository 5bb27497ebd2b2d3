//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! configuration the binary runs with. Command-line values win over the YAML
//! file given with `--config`, which wins over the environment and then the
//! built-in defaults.

use std::env;

use arrrg_derive::CommandLine;

use crate::config::{API_URL_ENV, ClientConfig};
use crate::error::Result;

/// Command-line arguments for the threadweaver-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// YAML file with client settings.
    #[arrrg(optional, "YAML config file with client settings", "FILE")]
    pub config: Option<String>,

    /// Chat backend base URL.
    #[arrrg(optional, "Backend URL (default: http://localhost:8000/)", "URL")]
    pub api_url: Option<String>,

    /// Authentication provider base URL.
    #[arrrg(optional, "Auth provider URL; enables sign-in", "URL")]
    pub auth_url: Option<String>,

    /// Authentication provider public key.
    #[arrrg(optional, "Auth provider public API key", "KEY")]
    pub auth_key: Option<String>,

    /// Resolve this user's session without signing in.
    #[arrrg(optional, "User id for session lookup when sign-in is disabled", "ID")]
    pub user_id: Option<String>,

    /// Email to prefill at the sign-in prompt.
    #[arrrg(optional, "Email address for sign-in", "EMAIL")]
    pub email: Option<String>,

    /// Per-request timeout.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// Retries for retryable failures.
    #[arrrg(optional, "Retries for retryable failures (default: 0)", "N")]
    pub max_retries: Option<u32>,

    /// Register a new account instead of signing in.
    #[arrrg(flag, "Create a new account instead of signing in")]
    pub sign_up: bool,

    /// Log conversation events to stderr.
    #[arrrg(flag, "Log conversation events to stderr")]
    pub verbose: bool,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,
}

/// Configuration for a chat run.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Backend and auth connection settings.
    pub client: ClientConfig,

    /// User whose session is restored when sign-in is disabled.
    pub user_id: Option<String>,

    /// Email prefilled at the sign-in prompt.
    pub email: Option<String>,

    /// Register instead of signing in.
    pub sign_up: bool,

    /// Log conversation events to stderr.
    pub verbose: bool,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Client: [`ClientConfig::new`]
    /// - User: none (conversation is unsaved)
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            client: ClientConfig::new(),
            user_id: None,
            email: None,
            sign_up: false,
            verbose: false,
            use_color: true,
        }
    }

    /// Resolves arguments against the `--config` file and the environment.
    ///
    /// The backend URL comes from the command line, then the file, then
    /// THREADWEAVER_API_URL, then the built-in default.
    pub fn from_args(args: ChatArgs) -> Result<Self> {
        Self::resolve(args, env::var(API_URL_ENV).ok())
    }

    fn resolve(args: ChatArgs, env_url: Option<String>) -> Result<Self> {
        let base = match env_url {
            Some(url) => ClientConfig::new().with_api_url(url),
            None => ClientConfig::new(),
        };
        let client = match &args.config {
            Some(path) => ClientConfig::from_file_over(path, base)?,
            None => base,
        };
        let config = Self::merge(client, args);
        config.client.validate()?;
        Ok(config)
    }

    /// Sets the user id used for session lookup.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    fn merge(mut client: ClientConfig, args: ChatArgs) -> Self {
        if let Some(url) = args.api_url {
            client.api_url = url;
        }
        if let Some(url) = args.auth_url {
            client.auth_url = Some(url);
        }
        if let Some(key) = args.auth_key {
            client.auth_key = Some(key);
        }
        if let Some(secs) = args.timeout_secs {
            client.timeout_secs = secs;
        }
        if let Some(retries) = args.max_retries {
            client.max_retries = retries;
        }

        ChatConfig {
            client,
            user_id: args.user_id,
            email: args.email,
            sign_up: args.sign_up,
            verbose: args.verbose,
            use_color: !args.no_color,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves arguments against built-in defaults only; `--config` is ignored.
impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        Self::merge(ClientConfig::new(), args)
    }
}
