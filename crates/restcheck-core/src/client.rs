// crates/restcheck-core/src/client.rs
// ============================================================================
// Module: API Client
// Description: JSON HTTP client for the REST server under test.
// Purpose: Issue GET/POST/PUT/DELETE requests with transcript capture.
// Dependencies: reqwest, serde, tokio, tracing, url
// ============================================================================

//! ## Overview
//! [`ApiClient`] sends one [`RequestSpec`] at a time against a base URL and
//! returns the status and decoded JSON body. By default a failure status
//! (anything outside 2xx/3xx) is turned into
//! [`ClientError::UnexpectedStatus`]; cases that expect a failure status opt
//! out with [`RequestSpec::fail_on_status`].
//!
//! Every exchange is appended to an in-memory transcript. Request headers are
//! never recorded, so bearer tokens stay out of transcripts.
//! Security posture: response bodies are untrusted and decoded leniently.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::sleep;
use url::Url;

use crate::error::ClientError;
use crate::model::AccessToken;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Base backoff delay between transient send retries.
const BASE_RETRY_DELAY_MS: u64 = 50;
/// Header carrying the raw access token alongside the bearer credential.
pub const ACCESS_TOKEN_HEADER: &str = "accessToken";

// ============================================================================
// SECTION: Request Types
// ============================================================================

/// HTTP methods used by the suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Method {
    /// HTTP GET.
    Get,
    /// HTTP POST.
    Post,
    /// HTTP PUT.
    Put,
    /// HTTP DELETE.
    Delete,
}

impl Method {
    /// Returns the canonical method label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Maps the method onto the reqwest method type.
    const fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A single request to send through [`ApiClient`].
#[derive(Debug, Clone)]
pub struct RequestSpec {
    /// HTTP method.
    method: Method,
    /// Path relative to the base URL.
    path: String,
    /// Query pairs in send order.
    query: Vec<(String, String)>,
    /// Optional JSON body.
    body: Option<Value>,
    /// Credential sent as bearer and `accessToken` header.
    bearer: Option<AccessToken>,
    /// Whether non-2xx statuses surface as errors.
    fail_on_status: bool,
}

impl RequestSpec {
    /// Creates a request for `path` relative to the base URL.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
            fail_on_status: true,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// Creates a PUT request.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    /// Creates a DELETE request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Appends a query pair; repeated keys are sent in insertion order.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Attaches a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] when the body cannot be serialized.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, ClientError> {
        let value = serde_json::to_value(body).map_err(|err| ClientError::Decode {
            context: format!("{} {} request body", self.method.as_str(), self.path),
            message: err.to_string(),
        })?;
        self.body = Some(value);
        Ok(self)
    }

    /// Attaches a bearer token, also sent in the `accessToken` header.
    #[must_use]
    pub fn bearer(mut self, token: &AccessToken) -> Self {
        self.bearer = Some(token.clone());
        self
    }

    /// Controls whether failure statuses become errors (default `true`).
    #[must_use]
    pub const fn fail_on_status(mut self, enabled: bool) -> Self {
        self.fail_on_status = enabled;
        self
    }

    /// Returns the path including any query string, for logs and errors.
    #[must_use]
    pub fn display_path(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let pairs: Vec<String> =
            self.query.iter().map(|(key, value)| format!("{key}={value}")).collect();
        format!("{}?{}", self.path, pairs.join("&"))
    }
}

// ============================================================================
// SECTION: Response Types
// ============================================================================

/// Status and decoded body of a completed exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// Response status code.
    status: u16,
    /// Decoded response body.
    body: Value,
}

impl ApiResponse {
    /// Creates a response from raw parts.
    #[must_use]
    pub const fn new(status: u16, body: Value) -> Self {
        Self {
            status,
            body,
        }
    }

    /// Returns the HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Returns the decoded body; non-JSON bodies become a JSON string and an
    /// empty body becomes `null`.
    #[must_use]
    pub const fn body(&self) -> &Value {
        &self.body
    }

    /// Decodes the body into a typed value.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] when the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_value(self.body.clone()).map_err(|err| ClientError::Decode {
            context: std::any::type_name::<T>().to_string(),
            message: err.to_string(),
        })
    }
}

/// One recorded request/response exchange.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    /// 1-based position within the run.
    pub sequence: u64,
    /// HTTP method label.
    pub method: &'static str,
    /// Path and query relative to the base URL.
    pub path: String,
    /// Request body, if any.
    pub request: Option<Value>,
    /// Response status, if a response arrived.
    pub status: Option<u16>,
    /// Response body (`null` when no response arrived).
    pub response: Value,
    /// Whether the request carried a bearer credential.
    pub authorized: bool,
    /// Elapsed wall time in milliseconds.
    pub elapsed_ms: u64,
    /// Error description when the exchange failed.
    pub error: Option<String>,
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the server under test.
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Send attempts per request; `1` disables retries.
    pub max_attempts: u32,
}

impl ClientConfig {
    /// Creates settings with the default timeout and no retries.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            max_attempts: 1,
        }
    }
}

/// JSON HTTP client with transcript capture.
#[derive(Clone)]
pub struct ApiClient {
    /// Target and retry settings.
    config: ClientConfig,
    /// Underlying reqwest client.
    client: Client,
    /// Exchanges recorded so far.
    transcript: Arc<Mutex<Vec<TranscriptEntry>>>,
}

impl ApiClient {
    /// Builds a client for the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Build`] when the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ClientError::Build(err.to_string()))?;
        Ok(Self {
            config,
            client,
            transcript: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Returns the base URL of the server under test.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    /// Returns a snapshot of the transcript entries.
    #[must_use]
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.transcript.lock().map_or_else(|_| Vec::new(), |entries| entries.clone())
    }

    /// Sends a request and returns the decoded response.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] when no response arrives,
    /// [`ClientError::UnexpectedStatus`] for a failure status while
    /// `fail_on_status` is enabled, and [`ClientError::InvalidUrl`] when the
    /// request URL cannot be built.
    pub async fn send(&self, request: RequestSpec) -> Result<ApiResponse, ClientError> {
        let url = request_url(&self.config.base_url, &request)?;
        let display_path = request.display_path();
        let method = request.method.as_str();
        let max_attempts = self.config.max_attempts.max(1);
        let started = Instant::now();

        let mut attempt = 0u32;
        let response = loop {
            attempt = attempt.saturating_add(1);
            let mut http_request = self.client.request(request.method.to_reqwest(), url.clone());
            if let Some(body) = &request.body {
                http_request = http_request.json(body);
            }
            if let Some(token) = &request.bearer {
                http_request = http_request
                    .bearer_auth(token.as_str())
                    .header(ACCESS_TOKEN_HEADER, token.as_str());
            }
            match http_request.send().await {
                Ok(response) => break response,
                Err(err) => {
                    if should_retry_send(&err, attempt, max_attempts) {
                        tracing::warn!(
                            method,
                            path = %display_path,
                            attempt,
                            error = %err,
                            "retrying request"
                        );
                        sleep(retry_delay_for_attempt(attempt)).await;
                        continue;
                    }
                    let message = err.to_string();
                    self.record(
                        &request,
                        &display_path,
                        None,
                        Value::Null,
                        started,
                        Some(message.clone()),
                    );
                    return Err(ClientError::Transport {
                        method,
                        path: display_path,
                        attempts: attempt,
                        message,
                    });
                }
            }
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(err) => {
                let message = err.to_string();
                self.record(
                    &request,
                    &display_path,
                    Some(status),
                    Value::Null,
                    started,
                    Some(message.clone()),
                );
                return Err(ClientError::Transport {
                    method,
                    path: display_path,
                    attempts: attempt,
                    message,
                });
            }
        };
        let body = decode_body(&text);
        tracing::debug!(
            method,
            path = %display_path,
            status,
            elapsed_ms = elapsed_ms(started),
            "response received"
        );

        let failed = request.fail_on_status && !is_success_status(status);
        let error = failed.then(|| format!("unexpected status {status}"));
        self.record(&request, &display_path, Some(status), body.clone(), started, error);
        if failed {
            return Err(ClientError::UnexpectedStatus {
                method,
                path: display_path,
                status,
                body,
            });
        }
        Ok(ApiResponse::new(status, body))
    }

    /// Appends one exchange to the transcript.
    fn record(
        &self,
        request: &RequestSpec,
        path: &str,
        status: Option<u16>,
        response: Value,
        started: Instant,
        error: Option<String>,
    ) {
        let Ok(mut guard) = self.transcript.lock() else {
            return;
        };
        let sequence = u64::try_from(guard.len()).unwrap_or(u64::MAX).saturating_add(1);
        guard.push(TranscriptEntry {
            sequence,
            method: request.method.as_str(),
            path: path.to_string(),
            request: request.body.clone(),
            status,
            response,
            authorized: request.bearer.is_some(),
            elapsed_ms: elapsed_ms(started),
            error,
        });
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Joins the base URL and request path, then appends query pairs.
///
/// # Errors
///
/// Returns [`ClientError::InvalidUrl`] when the joined URL does not parse.
pub fn request_url(base: &Url, request: &RequestSpec) -> Result<Url, ClientError> {
    let base_text = base.as_str().trim_end_matches('/');
    let path = request.path.trim_start_matches('/');
    let joined = format!("{base_text}/{path}");
    let mut url =
        Url::parse(&joined).map_err(|err| ClientError::InvalidUrl(format!("{joined}: {err}")))?;
    if !request.query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in &request.query {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

/// Returns true for statuses the request runner treats as success (2xx/3xx).
#[must_use]
pub const fn is_success_status(status: u16) -> bool {
    status >= 200 && status < 400
}

/// Returns milliseconds elapsed since `started`, saturating at `u64::MAX`.
#[must_use]
pub fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Decodes a response body leniently.
fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Returns true when a send failure should be retried.
fn should_retry_send(err: &reqwest::Error, attempt: u32, max_attempts: u32) -> bool {
    if attempt >= max_attempts {
        return false;
    }
    if err.is_connect() || err.is_timeout() {
        return true;
    }
    if !err.is_request() {
        return false;
    }
    is_transient_message(&err.to_string())
}

/// Returns true when an error message describes a transient connection fault.
fn is_transient_message(message: &str) -> bool {
    let msg = message.to_ascii_lowercase();
    msg.contains("connection reset")
        || msg.contains("connection refused")
        || msg.contains("connection closed")
        || msg.contains("broken pipe")
        || msg.contains("connection aborted")
        || msg.contains("timed out")
        || msg.contains("eof")
}

/// Returns bounded linear backoff for send retries.
fn retry_delay_for_attempt(attempt: u32) -> Duration {
    Duration::from_millis(u64::from(attempt) * BASE_RETRY_DELAY_MS)
}
