//! JSON-over-HTTP plumbing for the WAC API.
//!
//! Every endpoint speaks JSON. Failures are folded into [`ApiError`] with a
//! display message taken from the server body when it carries one, so
//! callers can show it to the user verbatim.

use std::fmt;

use anyhow::Context;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::Config;

/// Category of an API failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Non-2xx status other than 401
    HttpStatus,
    /// 401, or no session to authenticate with
    Unauthorized,
    /// Connection refused, DNS failure, reset, etc.
    Network,
    /// Request exceeded the configured timeout
    Timeout,
    /// 2xx response whose body is not valid JSON
    Parse,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::HttpStatus => write!(f, "http_status"),
            ApiErrorKind::Unauthorized => write!(f, "unauthorized"),
            ApiErrorKind::Network => write!(f, "network"),
            ApiErrorKind::Timeout => write!(f, "timeout"),
            ApiErrorKind::Parse => write!(f, "parse"),
        }
    }
}

/// Structured error from the API with kind and details.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// Error category
    pub kind: ApiErrorKind,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an error for a non-2xx response.
    ///
    /// The message prefers what the server said (`message`, `error`, or
    /// `errors`) and falls back to the status line.
    pub fn http_status(status: u16, body: &str) -> Self {
        let kind = if status == StatusCode::UNAUTHORIZED.as_u16() {
            ApiErrorKind::Unauthorized
        } else {
            ApiErrorKind::HttpStatus
        };
        let message = extract_server_message(body)
            .unwrap_or_else(|| format!("Request failed with status code {status}"));
        Self {
            kind,
            status: Some(status),
            message,
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    /// Creates the error returned when a call needs a session and none exists.
    pub fn not_logged_in() -> Self {
        Self::new(ApiErrorKind::Unauthorized, "You are not logged in.")
    }

    fn transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self {
                details: Some(err.to_string()),
                ..Self::new(ApiErrorKind::Timeout, "Request timed out")
            };
        }
        Self::new(ApiErrorKind::Network, format!("Network error: {err}"))
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Pulls a human-readable message out of an error body.
fn extract_server_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;

    if let Some(msg) = json.get("message").and_then(Value::as_str) {
        return Some(msg.to_string());
    }
    match json.get("error") {
        Some(Value::String(msg)) => return Some(msg.clone()),
        Some(Value::Object(obj)) => {
            if let Some(msg) = obj.get("message").and_then(Value::as_str) {
                return Some(msg.to_string());
            }
        }
        _ => {}
    }
    match json.get("errors")? {
        Value::String(msg) => Some(msg.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        // Rails-style `{ "email": ["has already been taken"] }`
        Value::Object(fields) => {
            let parts: Vec<String> = fields
                .iter()
                .flat_map(|(field, value)| {
                    let messages: Vec<&str> = match value {
                        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
                        Value::String(msg) => vec![msg.as_str()],
                        _ => Vec::new(),
                    };
                    messages
                        .into_iter()
                        .map(move |msg| format!("{field} {msg}"))
                })
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    }
}

/// HTTP client bound to the configured API base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    /// Builds a client from config (base URL and optional timeout).
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the client cannot be built.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let base = config.api_base()?;
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;
        Ok(Self { http, base })
    }

    /// Resolves an endpoint path relative to the base URL.
    ///
    /// # Errors
    /// Returns a parse error if the path cannot be joined.
    pub fn endpoint(&self, path: &str) -> ApiResult<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::new(ApiErrorKind::Parse, format!("Invalid endpoint {path}: {e}")))
    }

    /// Sends a JSON body and returns the JSON response.
    ///
    /// # Errors
    /// Returns an [`ApiError`] on transport failure, non-2xx status, or bad JSON.
    pub async fn post_json<B>(&self, path: &str, body: &B, token: Option<&str>) -> ApiResult<Value>
    where
        B: Serialize + ?Sized,
    {
        let request = self.request(Method::POST, path, token)?.json(body);
        self.send(Method::POST, path, request).await
    }

    /// # Errors
    /// Returns an [`ApiError`] on transport failure, non-2xx status, or bad JSON.
    pub async fn get_json(&self, path: &str, token: Option<&str>) -> ApiResult<Value> {
        let request = self.request(Method::GET, path, token)?;
        self.send(Method::GET, path, request).await
    }

    /// # Errors
    /// Returns an [`ApiError`] on transport failure or non-2xx status.
    pub async fn delete(&self, path: &str, token: Option<&str>) -> ApiResult<Value> {
        let request = self.request(Method::DELETE, path, token)?;
        self.send(Method::DELETE, path, request).await
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> ApiResult<RequestBuilder> {
        let url = self.endpoint(path)?;
        let mut request = self.http.request(method, url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        Ok(request)
    }

    async fn send(&self, method: Method, path: &str, request: RequestBuilder) -> ApiResult<Value> {
        tracing::debug!(%method, path, base = %self.base, "api request");

        let response = request.send().await.map_err(|e| {
            tracing::warn!(%method, path, error = %e, "api transport failure");
            ApiError::transport(&e)
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|e| ApiError::transport(&e))?;

        if !status.is_success() {
            tracing::info!(%method, path, status = status.as_u16(), "api request rejected");
            return Err(ApiError::http_status(status.as_u16(), &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError {
            status: Some(status.as_u16()),
            details: Some(text.clone()),
            ..ApiError::new(ApiErrorKind::Parse, format!("Failed to parse response: {e}"))
        })
    }
}
