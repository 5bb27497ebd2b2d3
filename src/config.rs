//! Client configuration.
//!
//! [`ClientConfig`] collects everything needed to reach the chat backend and
//! the authentication provider. It can be built in code, loaded from a YAML
//! file, or assembled from command-line arguments (see `chat::ChatConfig`).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::retry::RetryPolicy;

/// Backend URL used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/";

/// Environment variable consulted for the backend URL.
pub const API_URL_ENV: &str = "THREADWEAVER_API_URL";

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_INITIAL_BACKOFF_MS: u64 = 250;
const DEFAULT_MAX_BACKOFF_MS: u64 = 8_000;

/// Connection settings for the backend and the authentication provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the chat backend.
    pub api_url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Retries for retryable failures; zero disables retrying.
    pub max_retries: u32,

    /// Delay before the first retry, in milliseconds.
    pub initial_backoff_ms: u64,

    /// Upper bound on a single retry delay, in milliseconds.
    pub max_backoff_ms: u64,

    /// Base URL of the authentication provider. Sign-in is skipped when unset.
    pub auth_url: Option<String>,

    /// Public API key for the authentication provider.
    pub auth_key: Option<String>,
}

impl ClientConfig {
    /// Creates a configuration with default values.
    ///
    /// Defaults:
    /// - API URL: http://localhost:8000/
    /// - Timeout: 60 seconds
    /// - Retries: none
    /// - Authentication: disabled
    pub fn new() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: 0,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
            auth_url: None,
            auth_key: None,
        }
    }

    /// Loads a configuration from a YAML file.
    ///
    /// Keys missing from the file keep their default values.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_file_over(path, Self::new())
    }

    /// Loads a YAML file on top of `base`.
    ///
    /// Keys missing from the file keep the values in `base`, so settings from
    /// the environment survive a file that does not mention them.
    pub fn from_file_over<P: AsRef<Path>>(path: P, base: Self) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|err| {
            Error::io(format!("failed to read config file {}", path.display()), err)
        })?;
        let config = Self::from_yaml_over(&content, base)?;
        config.validate()?;
        Ok(config)
    }

    fn from_yaml_over(content: &str, base: Self) -> Result<Self> {
        let mut merged = serde_yaml::to_value(&base)?;
        match serde_yaml::from_str::<serde_yaml::Value>(content)? {
            serde_yaml::Value::Null => {}
            serde_yaml::Value::Mapping(overrides) => {
                if let Some(target) = merged.as_mapping_mut() {
                    target.extend(overrides);
                }
            }
            _ => return Err(Error::configuration("config file must be a YAML mapping")),
        }
        Ok(serde_yaml::from_value(merged)?)
    }

    /// Saves the configuration as YAML.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Checks values that cannot be caught by the type system.
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(Error::configuration("api_url must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::configuration("timeout_secs must be positive"));
        }
        if self.auth_url.is_some() && self.auth_key.is_none() {
            return Err(Error::configuration(
                "auth_key is required when auth_url is set",
            ));
        }
        Ok(())
    }

    /// Sets the backend URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Sets the number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the retry backoff bounds.
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff_ms = initial.as_millis() as u64;
        self.max_backoff_ms = max.as_millis() as u64;
        self
    }

    /// Enables sign-in against the given authentication provider.
    pub fn with_auth(mut self, url: impl Into<String>, key: impl Into<String>) -> Self {
        self.auth_url = Some(url.into());
        self.auth_key = Some(key.into());
        self
    }

    /// The request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The retry policy derived from this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::none()
            .with_max_retries(self.max_retries)
            .with_backoff(
                Duration::from_millis(self.initial_backoff_ms),
                Duration::from_millis(self.max_backoff_ms),
            )
    }

    /// Returns true if an authentication provider is configured.
    pub fn auth_enabled(&self) -> bool {
        self.auth_url.is_some()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("initial_backoff_ms", &self.initial_backoff_ms)
            .field("max_backoff_ms", &self.max_backoff_ms)
            .field("auth_url", &self.auth_url)
            .field("auth_key", &self.auth_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
