// crates/anchor-tests-suites/src/support.rs
// ============================================================================
// Module: Suite Support
// Description: Shared helpers for reading responses and discovery values.
// Purpose: Keep URL and body handling consistent across suites.
// Dependencies: anchor-tests-core, serde_json, toml, url
// ============================================================================

//! ## Overview
//! Small helpers used by every suite.

// ============================================================================
// SECTION: Imports
// ============================================================================

use anchor_tests_core::HttpResponse;
use anchor_tests_core::ResponseBody;
use anchor_tests_core::TestError;
use serde_json::Value;
use url::Url;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the response body as text.
pub(crate) fn body_text(response: &HttpResponse) -> String {
    match &response.body {
        ResponseBody::Empty => String::new(),
        ResponseBody::Json(value) => value.to_string(),
        ResponseBody::Text(text) => text.clone(),
    }
}

/// Joins `path` onto `base`, tolerating a trailing slash on the base.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

/// Parses an absolute `http` or `https` URL with a host.
pub(crate) fn absolute_http_url(value: &str) -> Option<Url> {
    let url = Url::parse(value.trim()).ok()?;
    let http = matches!(url.scheme(), "http" | "https");
    (http && url.host().is_some()).then_some(url)
}

/// Returns a non-empty top-level string from parsed discovery contents.
pub(crate) fn toml_str<'a>(contents: &'a Value, key: &str) -> Option<&'a str> {
    contents.get(key).and_then(Value::as_str).map(str::trim).filter(|value| !value.is_empty())
}

/// Converts a parsed TOML table into JSON for publication.
pub(crate) fn toml_to_json(table: &toml::Table) -> Result<Value, TestError> {
    serde_json::to_value(table).map_err(|err| TestError::Internal(err.to_string()))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
