// crates/anchor-tests-core/src/core/network.rs
// ============================================================================
// Module: Anchor Tests Network Records
// Description: HTTP request/response records and response expectations.
// Purpose: Describe protocol interactions independently of the transport.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Tests describe requests as [`HttpRequest`] values and receive parsed
//! [`HttpResponse`] values. Every interaction is recorded as a [`NetworkCall`]
//! on the test result. A [`ResponseExpectation`] declares the accepted status
//! codes and media type so the runtime can classify mismatches into the generic
//! failure kinds.
//!
//! Security posture: recorded requests are redacted before they leave the
//! runtime; bearer credentials never appear in results or event logs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Replacement text for credential header values.
pub const REDACTED: &str = "[redacted]";

/// Header names whose values are redacted in recorded requests.
const SENSITIVE_HEADERS: [&str; 2] = ["authorization", "cookie"];

// ============================================================================
// SECTION: Requests
// ============================================================================

/// HTTP method used by protocol tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET request.
    Get,
    /// POST request.
    Post,
}

impl HttpMethod {
    /// Returns the canonical method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prepared HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Absolute request URL.
    pub url: String,
    /// Request headers in send order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
    /// Optional JSON body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl HttpRequest {
    /// Creates a GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self { method: HttpMethod::Get, url: url.into(), headers: Vec::new(), body: None }
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self { method: HttpMethod::Post, url: url.into(), headers: Vec::new(), body: None }
    }

    /// Appends a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Returns a copy safe to record, with credential headers masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let headers = self
            .headers
            .iter()
            .map(|(name, value)| {
                if SENSITIVE_HEADERS.iter().any(|sensitive| name.eq_ignore_ascii_case(sensitive)) {
                    (name.clone(), REDACTED.to_string())
                } else {
                    (name.clone(), value.clone())
                }
            })
            .collect();
        Self { method: self.method, url: self.url.clone(), headers, body: self.body.clone() }
    }
}

// ============================================================================
// SECTION: Responses
// ============================================================================

/// Raw response returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers with lowercase names.
    pub headers: Vec<(String, String)>,
    /// Response body bytes.
    pub body: Vec<u8>,
}

/// Parsed response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ResponseBody {
    /// No body bytes.
    Empty,
    /// JSON document.
    Json(Value),
    /// Any other body, decoded lossily as UTF-8.
    Text(String),
}

/// Parsed HTTP response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Media type (without parameters), when the response declared one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Response headers with lowercase names.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
    /// Parsed body.
    pub body: ResponseBody,
}

impl HttpResponse {
    /// Parses a transport response.
    ///
    /// JSON media types (`application/json` or any `+json` suffix) are parsed as
    /// JSON; a body that fails to parse is kept as text.
    #[must_use]
    pub fn from_transport(response: TransportResponse) -> Self {
        let headers: Vec<(String, String)> = response
            .headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        let content_type = headers
            .iter()
            .find(|(name, _)| name == "content-type")
            .map(|(_, value)| media_type(value));
        let body = if response.body.is_empty() {
            ResponseBody::Empty
        } else if content_type.as_deref().is_some_and(is_json_media_type) {
            serde_json::from_slice(&response.body).map_or_else(
                |_| ResponseBody::Text(String::from_utf8_lossy(&response.body).into_owned()),
                ResponseBody::Json,
            )
        } else {
            ResponseBody::Text(String::from_utf8_lossy(&response.body).into_owned())
        };
        Self { status: response.status, content_type, headers, body }
    }

    /// Returns the first header value matching `name` case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the JSON body, if any.
    #[must_use]
    pub const fn json(&self) -> Option<&Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the text body, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            ResponseBody::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// One recorded interaction.
///
/// # Invariants
/// - `response` is `None` when the transport failed before a response arrived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkCall {
    /// Redacted request.
    pub request: HttpRequest,
    /// Parsed response, when one was received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<HttpResponse>,
}

// ============================================================================
// SECTION: Expectations
// ============================================================================

/// Accepted response shape for a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseExpectation {
    /// Accepted status codes.
    statuses: Vec<u16>,
    /// Expected media type, compared case-insensitively without parameters.
    content_type: Option<String>,
}

/// Mismatch between a response and its expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectationMismatch {
    /// Status code not accepted.
    Status {
        /// Accepted codes.
        expected: Vec<u16>,
        /// Received code.
        actual: u16,
    },
    /// Media type mismatch.
    ContentType {
        /// Expected media type.
        expected: String,
        /// Received media type, when present.
        actual: Option<String>,
    },
}

impl ResponseExpectation {
    /// Accepts a single status code.
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self { statuses: vec![status], content_type: None }
    }

    /// Accepts any of the listed status codes.
    #[must_use]
    pub fn statuses(statuses: &[u16]) -> Self {
        Self { statuses: statuses.to_vec(), content_type: None }
    }

    /// Requires the given media type.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Returns the accepted status codes.
    #[must_use]
    pub fn accepted_statuses(&self) -> &[u16] {
        &self.statuses
    }

    /// Checks a response, status first.
    ///
    /// # Errors
    ///
    /// Returns the first mismatch found.
    pub fn check(&self, response: &HttpResponse) -> Result<(), ExpectationMismatch> {
        if !self.statuses.contains(&response.status) {
            return Err(ExpectationMismatch::Status {
                expected: self.statuses.clone(),
                actual: response.status,
            });
        }
        if let Some(expected) = &self.content_type {
            let matches = response
                .content_type
                .as_deref()
                .is_some_and(|actual| actual.eq_ignore_ascii_case(expected));
            if !matches {
                return Err(ExpectationMismatch::ContentType {
                    expected: expected.clone(),
                    actual: response.content_type.clone(),
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Strips parameters and normalizes case of a content-type header value.
fn media_type(value: &str) -> String {
    value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
}

/// Returns true for JSON media types.
fn is_json_media_type(media: &str) -> bool {
    media == "application/json" || media.ends_with("+json")
}
