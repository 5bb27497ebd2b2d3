use std::env;
use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::config::{API_URL_ENV, ClientConfig, DEFAULT_API_URL};
use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUEST_RETRIES, CLIENT_REQUESTS,
    CLIENT_RETRY_BACKOFF, SESSION_SKIPPED_MESSAGES,
};
use crate::retry::RetryPolicy;
use crate::session::SessionResolver;
use crate::transport::{ChatRequest, ChatTransport};
use crate::types::{
    ChatResponse, DocumentUploadResponse, Message, MessageListResponse, SearchResponse, SessionId,
    SessionInfo,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client for the ThreadWeaver backend.
///
/// Implements both [`ChatTransport`] and [`SessionResolver`], so a single
/// client can be handed to the conversation controller for both roles.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    retry: RetryPolicy,
    bearer: Option<HeaderValue>,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// The base URL can be provided directly or read from the
    /// THREADWEAVER_API_URL environment variable; if neither is present the
    /// local development server is assumed.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        let base_url = match base_url {
            Some(url) => url,
            None => env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        };
        Self::with_options(Some(base_url), None, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(
        base_url: Option<String>,
        timeout: Option<Duration>,
        retry: Option<RetryPolicy>,
    ) -> Result<Self> {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let base_url = Url::parse(&base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::url(
                format!("{base_url} cannot be used as a base URL"),
                None,
            ));
        }

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
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
            timeout,
            retry: retry.unwrap_or_default(),
            bearer: None,
        })
    }

    /// Create a client from a resolved configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        Self::with_options(
            Some(config.api_url.clone()),
            Some(config.timeout()),
            Some(config.retry_policy()),
        )
    }

    /// Attach a bearer token to every request.
    pub fn with_access_token(mut self, token: &str) -> Result<Self> {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| Error::validation("access token is not a valid header", None))?;
        self.bearer = Some(value);
        Ok(self)
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The retry policy applied to retryable failures.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Build an endpoint URL under the base URL, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::url("base URL cannot have path segments", None))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Create and return default headers for JSON API requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = self.auth_headers();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers
    }

    /// Headers for requests whose body sets its own content type.
    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(bearer) = &self.bearer {
            headers.insert(header::AUTHORIZATION, bearer.clone());
        }
        headers
    }

    /// Send the conversation to the chat endpoint.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = self.endpoint(&["api", "v1", "chat"])?;
        self.execute(|| {
            self.client
                .post(url.clone())
                .headers(self.default_headers())
                .json(request)
        })
        .await
    }

    /// Fetch the user's current session; the backend creates one if needed.
    pub async fn current_session(&self, user_id: &str) -> Result<SessionInfo> {
        let url = self.endpoint(&["api", "v1", "users", user_id, "sessions", "current"])?;
        self.execute(|| self.client.get(url.clone()).headers(self.default_headers()))
            .await
            .map_err(|err| err.for_resource("user", user_id))
    }

    /// Fetch the stored messages of a session, oldest first.
    ///
    /// Entries that are not valid messages are skipped.
    pub async fn session_messages(&self, session_id: &SessionId) -> Result<Vec<Message>> {
        let url = self.endpoint(&["api", "v1", "sessions", session_id.as_str(), "messages"])?;
        let list: MessageListResponse = self
            .execute(|| self.client.get(url.clone()).headers(self.default_headers()))
            .await
            .map_err(|err| err.for_resource("session", session_id.as_str()))?;
        let (messages, skipped) = list.into_messages();
        if skipped > 0 {
            SESSION_SKIPPED_MESSAGES.count(skipped as u64);
        }
        Ok(messages)
    }

    /// Search the uploaded documents for chunks related to `query`.
    pub async fn search(&self, query: &str) -> Result<SearchResponse> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::validation(
                "search query must not be empty",
                Some("query".to_string()),
            ));
        }
        let url = self.endpoint(&["api", "v1", "search"])?;
        self.execute(|| {
            self.client
                .post(url.clone())
                .headers(self.default_headers())
                .query(&[("query", query)])
        })
        .await
    }

    /// Upload a plain-text document so later searches and chats can use it.
    ///
    /// Only `.txt` files are accepted. Uploads are sent once and never retried.
    pub async fn upload_document(&self, path: impl AsRef<Path>) -> Result<DocumentUploadResponse> {
        let path = path.as_ref();
        let file_name = match path.file_name().and_then(|name| name.to_str()) {
            Some(name) if name.ends_with(".txt") => name.to_string(),
            _ => {
                return Err(Error::validation(
                    format!("{} is not a .txt file", path.display()),
                    Some("file".to_string()),
                ));
            }
        };
        let content = tokio::fs::read(path)
            .await
            .map_err(|err| Error::io(format!("failed to read {}", path.display()), err))?;

        let part = Part::bytes(content)
            .file_name(file_name)
            .mime_str("text/plain")
            .map_err(|e| {
                Error::http_client(format!("Invalid upload part: {}", e), Some(Box::new(e)))
            })?;
        let url = self.endpoint(&["api", "v1", "documents", "upload"])?;
        let request = self
            .client
            .post(url)
            .headers(self.auth_headers())
            .multipart(Form::new().part("file", part));

        let result = self.attempt(request).await;
        if result.is_err() {
            CLIENT_REQUEST_ERRORS.click();
        }
        result
    }

    /// Run a request, retrying retryable failures per the retry policy.
    async fn execute<T, F>(&self, make_request: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let err = match self.attempt(make_request()).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            CLIENT_REQUEST_ERRORS.click();
            if !err.is_retryable() || !self.retry.should_retry(attempt) {
                return Err(err);
            }

            let delay = self.retry.backoff(attempt, err.retry_after());
            CLIENT_REQUEST_RETRIES.click();
            CLIENT_RETRY_BACKOFF.add(delay.as_secs_f64());
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Send one request, recording it in the client metrics.
    async fn attempt<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = self.execute_once(request).await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        result
    }

    async fn execute_once<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| classify_send_error(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        response.json::<T>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }
}

#[async_trait]
impl ChatTransport for BackendClient {
    async fn send(&self, request: &ChatRequest) -> Result<String> {
        let response = self.chat(request).await?;
        Ok(response.response_message.content)
    }
}

#[async_trait]
impl SessionResolver for BackendClient {
    async fn resolve_session(&self, user_id: &str) -> Result<SessionId> {
        if user_id.trim().is_empty() {
            return Err(Error::validation(
                "user id must not be empty",
                Some("user_id".to_string()),
            ));
        }
        Ok(self.current_session(user_id).await?.session_id)
    }

    async fn fetch_history(&self, session_id: &SessionId) -> Result<Vec<Message>> {
        self.session_messages(session_id).await
    }
}

/// Convert a failure to send a request into our Error type.
pub(crate) fn classify_send_error(e: reqwest::Error, timeout: Duration) -> Error {
    if e.is_timeout() {
        Error::timeout(
            format!("Request timed out: {}", e),
            Some(timeout.as_secs_f64()),
        )
    } else if e.is_connect() {
        Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
    } else {
        Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
    }
}

/// Process an unsuccessful response and convert it to our Error type.
pub(crate) async fn error_from_response(response: Response) -> Error {
    let status_code = response.status().as_u16();

    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.trim().parse::<u64>().ok());

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            return Error::http_client(
                format!("Failed to read error response: {}", e),
                Some(Box::new(e)),
            );
        }
    };
    let (error_type, message) = parse_error_body(&body);

    match status_code {
        400 => Error::bad_request(message),
        401 => Error::authentication(message),
        403 => Error::permission(message),
        404 => Error::not_found(message, None, None),
        408 => Error::timeout(message, None),
        422 => Error::validation(message, None),
        429 => Error::rate_limit(message, retry_after),
        500 => Error::internal_server(message),
        502..=504 => Error::service_unavailable(message, retry_after),
        _ => Error::api(status_code, error_type, message),
    }
}

/// Pull an error code and message out of a FastAPI or auth-provider body.
///
/// Falls back to the raw body when it is not JSON.
pub(crate) fn parse_error_body(body: &str) -> (Option<String>, String) {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return (None, body.trim().to_string());
    };
    let error_type = ["error_code", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(String::from);
    let message = ["detail", "error_description", "msg", "message"]
        .iter()
        .find_map(|key| value.get(*key))
        .map(describe_detail)
        .or_else(|| error_type.clone())
        .unwrap_or_else(|| body.trim().to_string());
    (error_type, message)
}

fn describe_detail(detail: &Value) -> String {
    match detail {
        Value::String(s) => s.clone(),
        // FastAPI validation errors: [{"loc": [...], "msg": "...", "type": "..."}]
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.get("msg")
                    .and_then(Value::as_str)
                    .map(String::from)
                    .unwrap_or_else(|| item.to_string())
            })
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}
