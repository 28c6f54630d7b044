// crates/anchor-tests-http/src/caller.rs
// ============================================================================
// Module: Reqwest Network Caller
// Description: Blocking HTTP transport for protocol tests.
// Purpose: Map prepared requests onto reqwest and classify transport errors.
// Dependencies: anchor-tests-core, reqwest, url
// ============================================================================

//! ## Overview
//! [`ReqwestCaller`] sends [`HttpRequest`] values with a shared blocking client.
//! Invariants:
//! - Only `http://` and `https://` URLs are sent.
//! - Response bodies are capped at [`MAX_RESPONSE_BYTES`].
//! - Timeouts are applied per request and reported as [`CallError::Timeout`].
//!
//! Security posture: anchor responses are untrusted; oversized bodies fail
//! closed instead of being truncated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::time::Duration;

use anchor_tests_core::CallError;
use anchor_tests_core::HttpMethod;
use anchor_tests_core::HttpRequest;
use anchor_tests_core::NetworkCaller;
use anchor_tests_core::TransportResponse;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted response body size in bytes.
pub const MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;
/// Maximum number of redirects followed per request.
pub const MAX_REDIRECTS: usize = 5;
/// User agent sent with every request.
const USER_AGENT: &str = concat!("anchor-tests/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while constructing the transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP client could not be built.
    #[error("http client build failed: {0}")]
    Build(String),
}

// ============================================================================
// SECTION: Caller
// ============================================================================

/// Blocking reqwest transport.
///
/// # Invariants
/// - The client follows at most [`MAX_REDIRECTS`] redirects.
#[derive(Debug, Clone)]
pub struct ReqwestCaller {
    /// Shared HTTP client.
    client: Client,
    /// Response body cap.
    max_response_bytes: usize,
}

impl ReqwestCaller {
    /// Builds a caller with the default client settings.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the HTTP client cannot be constructed.
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| TransportError::Build(err.to_string()))?;
        Ok(Self { client, max_response_bytes: MAX_RESPONSE_BYTES })
    }

    /// Creates a caller with a preconfigured client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client, max_response_bytes: MAX_RESPONSE_BYTES }
    }

    /// Overrides the response body cap.
    #[must_use]
    pub const fn with_max_response_bytes(mut self, max_response_bytes: usize) -> Self {
        self.max_response_bytes = max_response_bytes;
        self
    }
}

impl NetworkCaller for ReqwestCaller {
    fn send(
        &self,
        request: &HttpRequest,
        timeout: Duration,
    ) -> Result<TransportResponse, CallError> {
        let url = Url::parse(&request.url)
            .map_err(|err| CallError::InvalidRequest(format!("{}: {err}", request.url)))?;
        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(CallError::InvalidRequest(format!("unsupported scheme: {scheme}")));
            }
        }

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
        }
        .timeout(timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            let bytes = serde_json::to_vec(body)
                .map_err(|err| CallError::InvalidRequest(err.to_string()))?;
            let has_content_type =
                request.headers.iter().any(|(name, _)| name.eq_ignore_ascii_case("content-type"));
            if !has_content_type {
                builder = builder.header(CONTENT_TYPE, "application/json");
            }
            builder = builder.body(bytes);
        }

        let response = builder.send().map_err(|err| classify(&err, timeout))?;
        let status = response.status().as_u16();
        if let Some(length) = response.content_length() {
            let actual = usize::try_from(length).unwrap_or(usize::MAX);
            if actual > self.max_response_bytes {
                return Err(CallError::TooLarge { limit: self.max_response_bytes, actual });
            }
        }
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();

        let limit = u64::try_from(self.max_response_bytes).unwrap_or(u64::MAX).saturating_add(1);
        let mut body = Vec::new();
        response
            .take(limit)
            .read_to_end(&mut body)
            .map_err(|err| read_error(&err, timeout))?;
        if body.len() > self.max_response_bytes {
            return Err(CallError::TooLarge { limit: self.max_response_bytes, actual: body.len() });
        }
        Ok(TransportResponse { status, headers, body })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps a reqwest error onto a [`CallError`].
fn classify(err: &reqwest::Error, timeout: Duration) -> CallError {
    if err.is_timeout() {
        CallError::Timeout(millis(timeout))
    } else if err.is_builder() {
        CallError::InvalidRequest(err.to_string())
    } else {
        CallError::Connection(err.to_string())
    }
}

/// Maps a body read error onto a [`CallError`].
fn read_error(err: &std::io::Error, timeout: Duration) -> CallError {
    if err.kind() == std::io::ErrorKind::TimedOut {
        CallError::Timeout(millis(timeout))
    } else {
        CallError::Connection(err.to_string())
    }
}

/// Converts a duration to whole milliseconds, saturating.
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
