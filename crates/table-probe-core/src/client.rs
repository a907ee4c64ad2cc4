// crates/table-probe-core/src/client.rs
// ============================================================================
// Module: Contract HTTP Client
// Description: Bounded HTTP client for issuing contract probes.
// Purpose: Send one request, capture status and body, follow bounded redirects.
// Dependencies: reqwest, serde_json, thiserror, url
// ============================================================================

//! ## Overview
//! [`ContractClient`] wraps a `reqwest` client configured with a fixed
//! per-request timeout and a bounded redirect budget (zero disables redirect
//! following). Bodies are read with a hard size limit. Non-2xx statuses are
//! not errors here: the caller compares the status against the contract.
//!
//! Security posture: server responses are untrusted; bodies are size-limited
//! and only decoded on demand.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;
use std::time::Instant;

use reqwest::Client;
use reqwest::Method;
use reqwest::header::ACCEPT;
use reqwest::header::HeaderValue;
use reqwest::redirect::Policy;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::contract::HttpMethod;
use crate::result::CheckFailure;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Maximum response body size accepted from the server under test.
pub const MAX_RESPONSE_BYTES: usize = 8 * 1024 * 1024;
/// Default number of redirects followed per request.
pub const DEFAULT_MAX_REDIRECTS: usize = 10;
/// Maximum characters of a body preview included in messages.
const BODY_PREVIEW_CHARS: usize = 200;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Contract client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the server under test (scheme, host, optional path).
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum accepted body size in bytes.
    pub max_body_bytes: usize,
    /// Redirects followed per request; zero returns 3xx responses as-is.
    pub max_redirects: usize,
}

impl ClientConfig {
    /// Creates a config with default timeout, body limit, and redirect budget.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            max_body_bytes: MAX_RESPONSE_BYTES,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }
}

/// Contract client errors.
///
/// # Invariants
/// - Every variant maps to [`CheckFailure::TransportError`] at the check boundary.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid client configuration.
    #[error("client config error: {0}")]
    Config(String),
    /// Connection, timeout, or read failure.
    #[error("request failed: {0}")]
    Transport(String),
    /// Body was not valid JSON.
    #[error("response body is not valid json: {0}")]
    Decode(String),
    /// Body exceeded the configured limit.
    #[error("response exceeds size limit ({actual} > {limit})")]
    ResponseTooLarge {
        /// Bytes read before aborting.
        actual: usize,
        /// Configured limit.
        limit: usize,
    },
}

impl From<ClientError> for CheckFailure {
    fn from(error: ClientError) -> Self {
        Self::TransportError {
            detail: error.to_string(),
        }
    }
}

/// One completed request/response exchange.
#[derive(Debug, Clone)]
pub struct HttpExchange {
    /// Response status code.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
    /// Wall time from send to last body byte.
    pub latency: Duration,
}

impl HttpExchange {
    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] when the body is not valid JSON.
    pub fn json(&self) -> Result<Value, ClientError> {
        serde_json::from_slice(&self.body).map_err(|err| ClientError::Decode(err.to_string()))
    }

    /// Returns a short, single-line preview of the body for diagnostics.
    #[must_use]
    pub fn body_preview(&self) -> String {
        let text = String::from_utf8_lossy(&self.body);
        let flattened: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if flattened.chars().count() > BODY_PREVIEW_CHARS {
            let head: String = flattened.chars().take(BODY_PREVIEW_CHARS).collect();
            format!("{head}...")
        } else {
            flattened
        }
    }
}

/// HTTP client for the server under test.
///
/// # Invariants
/// - `base_url` has no trailing slash.
#[derive(Debug, Clone)]
pub struct ContractClient {
    /// Reqwest client instance.
    client: Client,
    /// Parsed base URL.
    base_url: Url,
    /// Maximum accepted body size.
    max_body_bytes: usize,
}

impl ContractClient {
    /// Builds a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when the base URL is invalid, the
    /// timeout or body limit is zero, or the HTTP client cannot be constructed.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let trimmed = config.base_url.trim().trim_end_matches('/');
        let base_url = Url::parse(trimmed)
            .map_err(|err| ClientError::Config(format!("invalid base url `{trimmed}`: {err}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "base url must use http or https, got `{}`",
                base_url.scheme()
            )));
        }
        if config.timeout.is_zero() {
            return Err(ClientError::Config("timeout must be greater than zero".to_string()));
        }
        if config.max_body_bytes == 0 {
            return Err(ClientError::Config("body limit must be greater than zero".to_string()));
        }
        let redirect = if config.max_redirects == 0 {
            Policy::none()
        } else {
            Policy::limited(config.max_redirects)
        };
        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(redirect)
            .build()
            .map_err(|err| ClientError::Config(err.to_string()))?;
        Ok(Self {
            client,
            base_url,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Resolves a contract path against the base URL, keeping any base path.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when the joined URL is invalid.
    pub fn endpoint_url(&self, path: &str) -> Result<Url, ClientError> {
        let joined = format!("{}/{}", self.base_url(), path.trim_start_matches('/'));
        Url::parse(&joined)
            .map_err(|err| ClientError::Config(format!("invalid endpoint url `{joined}`: {err}")))
    }

    /// Sends one request and reads the full body.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on connection failure, timeout, or an oversized body.
    pub async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<HttpExchange, ClientError> {
        let mut url = self.endpoint_url(path)?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params.iter().copied());
        }
        let started = Instant::now();
        let response = self
            .client
            .request(to_reqwest_method(method), url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(|err| ClientError::Transport(describe_reqwest_error(&err)))?;
        let status = response.status().as_u16();
        let body = read_response_body_with_limit(response, self.max_body_bytes).await?;
        Ok(HttpExchange {
            status,
            body,
            latency: started.elapsed(),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a contract method onto the reqwest method type.
fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Produces a stable description of a reqwest failure.
fn describe_reqwest_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("timed out: {error}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        error.to_string()
    }
}

/// Reads a response body while enforcing a hard size limit.
async fn read_response_body_with_limit(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, ClientError> {
    let mut body = Vec::new();
    let mut total: usize = 0;
    while let Some(chunk) =
        response.chunk().await.map_err(|err| ClientError::Transport(describe_reqwest_error(&err)))?
    {
        let next_total = total.checked_add(chunk.len()).ok_or(ClientError::ResponseTooLarge {
            actual: usize::MAX,
            limit,
        })?;
        if next_total > limit {
            return Err(ClientError::ResponseTooLarge {
                actual: next_total,
                limit,
            });
        }
        body.extend_from_slice(&chunk);
        total = next_total;
    }
    Ok(body)
}
