//! Sign-in and sign-up against an external authentication provider.
//!
//! The conversation controller never talks to the provider directly. The
//! binary drives an [`Authenticator`] through [`crate::LoginFlow`] and hands
//! the resulting user id to session resolution.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde_json::Value;
use url::Url;

use crate::client::{classify_send_error, error_from_response};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::observability::{AUTH_FAILURES, AUTH_SIGN_INS, AUTH_SIGN_UPS};
use crate::types::{AuthSession, Credentials};

/// Account operations offered by an authentication provider.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Exchange credentials for a session.
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession>;

    /// Register a new account and return its session.
    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthSession>;
}

/// [`Authenticator`] for a Supabase (GoTrue) auth endpoint.
#[derive(Debug, Clone)]
pub struct SupabaseAuth {
    client: ReqwestClient,
    base_url: Url,
    api_key: HeaderValue,
    bearer: HeaderValue,
    timeout: Duration,
}

impl SupabaseAuth {
    /// Create a client for the provider at `base_url` using the public `api_key`.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::url(
                format!("{base_url} cannot be used as a base URL"),
                None,
            ));
        }
        let invalid_key =
            |_| Error::configuration("auth key contains characters not allowed in a header");
        let api_key_header = HeaderValue::from_str(api_key).map_err(invalid_key)?;
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(invalid_key)?;

        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key_header,
            bearer,
            timeout,
        })
    }

    /// Create a client from the auth settings of a configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let (Some(url), Some(key)) = (&config.auth_url, &config.auth_key) else {
            return Err(Error::configuration(
                "auth_url and auth_key must both be set to sign in",
            ));
        };
        Self::new(url, key, config.timeout())
    }

    /// The provider base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::url("base URL cannot have path segments", None))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert("apikey", self.api_key.clone());
        headers.insert(header::AUTHORIZATION, self.bearer.clone());
        headers
    }

    async fn post(&self, url: Url, credentials: &Credentials) -> Result<Value> {
        let response = self
            .client
            .post(url)
            .headers(self.headers())
            .json(credentials)
            .send()
            .await
            .map_err(|e| classify_send_error(e, self.timeout))?;

        if !response.status().is_success() {
            // GoTrue answers bad credentials with 400 invalid_grant.
            return Err(match error_from_response(response).await {
                Error::BadRequest { message } => Error::authentication(message),
                other => other,
            });
        }

        response.json::<Value>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse auth response: {}", e),
                Some(Box::new(e)),
            )
        })
    }
}

/// Interpret a token or sign-up response body.
///
/// Sign-up returns a bare user record when the provider wants the address
/// confirmed first; there is no session to use yet.
fn session_from_body(body: Value) -> Result<AuthSession> {
    if body.get("access_token").is_none() {
        if body.get("id").is_some() {
            return Err(Error::authentication(
                "account created; confirm your email address before signing in",
            ));
        }
        return Err(Error::serialization(
            "auth response has neither a session nor a user",
            None,
        ));
    }
    serde_json::from_value(body).map_err(Error::from)
}

#[async_trait]
impl Authenticator for SupabaseAuth {
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthSession> {
        let mut url = self.endpoint(&["auth", "v1", "token"])?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let result = self
            .post(url, credentials)
            .await
            .and_then(session_from_body);
        match &result {
            Ok(_) => AUTH_SIGN_INS.click(),
            Err(_) => AUTH_FAILURES.click(),
        };
        result
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<AuthSession> {
        let url = self.endpoint(&["auth", "v1", "signup"])?;
        let result = self
            .post(url, credentials)
            .await
            .and_then(session_from_body);
        match &result {
            Ok(_) => AUTH_SIGN_UPS.click(),
            Err(_) => AUTH_FAILURES.click(),
        };
        result
    }
}
