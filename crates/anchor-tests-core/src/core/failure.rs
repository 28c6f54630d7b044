// crates/anchor-tests-core/src/core/failure.rs
// ============================================================================
// Module: Anchor Tests Failure Model
// Description: Symbolic failure kinds, failure mode templates, and rendered failures.
// Purpose: Provide the canonical failure vocabulary shared by every test definition.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Failure kinds are symbolic names scoped to a definition's failure modes.
//! Every definition carries the generic modes (connection, status code, content
//! type, configuration, unexpected error) plus its own kinds. A [`Failure`] is a
//! kind rendered against structured arguments, optionally carrying the expected
//! and actual values that triggered it.
//!
//! Invariants:
//! - Generic modes are always present in a [`FailureModes`] table.
//! - Rendering an undeclared kind never panics; it degrades to
//!   [`UNEXPECTED_ERROR`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Generic Kinds
// ============================================================================

/// The target could not be reached or the transport failed.
pub const CONNECTION_ERROR: &str = "CONNECTION_ERROR";
/// The response status was not one of the accepted codes.
pub const UNEXPECTED_STATUS_CODE: &str = "UNEXPECTED_STATUS_CODE";
/// The response content type did not match the expected media type.
pub const BAD_CONTENT_TYPE: &str = "BAD_CONTENT_TYPE";
/// The test found its own sub-configuration incomplete.
pub const CONFIGURATION_ERROR: &str = "CONFIGURATION_ERROR";
/// The test body failed abnormally.
pub const UNEXPECTED_ERROR: &str = "UNEXPECTED_ERROR";

/// Generic modes merged into every definition.
const GENERIC_MODES: [(&str, &str, &str); 5] = [
    (CONNECTION_ERROR, "connection error", "unable to connect to {url}: {error}"),
    (
        UNEXPECTED_STATUS_CODE,
        "unexpected status code",
        "{method} {url} returned status {actual}, expected {expected}",
    ),
    (
        BAD_CONTENT_TYPE,
        "bad content type",
        "{method} {url} returned content type {actual}, expected {expected}",
    ),
    (CONFIGURATION_ERROR, "configuration error", "improperly configured: {reason}"),
    (UNEXPECTED_ERROR, "unexpected error", "unexpected error: {error}"),
];

// ============================================================================
// SECTION: Failure Kinds
// ============================================================================

/// Symbolic failure kind (e.g. `INVALID_SCHEMA`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FailureKind(String);

impl FailureKind {
    /// Creates a failure kind.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    /// Returns the kind as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for FailureKind {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl PartialEq<&str> for FailureKind {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Declared failure mode: a short name and a message template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureMode {
    /// Short human-readable name.
    pub name: String,
    /// Message template with `{placeholder}` arguments.
    pub template: String,
}

/// Failure mode table for one test definition.
///
/// # Invariants
/// - Always contains the generic modes.
/// - Test-specific modes may override a generic template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureModes {
    /// Modes keyed by kind.
    modes: BTreeMap<FailureKind, FailureMode>,
}

impl Default for FailureModes {
    fn default() -> Self {
        Self::generic()
    }
}

impl FailureModes {
    /// Returns a table holding only the generic modes.
    #[must_use]
    pub fn generic() -> Self {
        let modes = GENERIC_MODES
            .iter()
            .map(|(kind, name, template)| {
                (
                    FailureKind::new(*kind),
                    FailureMode { name: (*name).to_string(), template: (*template).to_string() },
                )
            })
            .collect();
        Self { modes }
    }

    /// Adds or replaces a mode.
    #[must_use]
    pub fn with(
        mut self,
        kind: impl Into<FailureKind>,
        name: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        self.insert(kind, name, template);
        self
    }

    /// Adds or replaces a mode in place.
    pub fn insert(
        &mut self,
        kind: impl Into<FailureKind>,
        name: impl Into<String>,
        template: impl Into<String>,
    ) {
        self.modes.insert(
            kind.into(),
            FailureMode { name: name.into(), template: template.into() },
        );
    }

    /// Returns the mode declared for `kind`.
    #[must_use]
    pub fn get(&self, kind: &str) -> Option<&FailureMode> {
        self.modes.get(&FailureKind::new(kind))
    }

    /// Returns true when `kind` is declared.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.get(kind).is_some()
    }

    /// Iterates declared kinds in sorted order.
    pub fn kinds(&self) -> impl Iterator<Item = &FailureKind> {
        self.modes.keys()
    }

    /// Renders a failure for `kind` using the supplied arguments.
    ///
    /// An undeclared kind renders as [`UNEXPECTED_ERROR`] naming the kind.
    #[must_use]
    pub fn render(&self, kind: &str, args: &[(&str, String)]) -> Failure {
        if let Some(mode) = self.get(kind) {
            return Failure {
                kind: FailureKind::new(kind),
                name: mode.name.clone(),
                message: render_template(&mode.template, args),
                expected: None,
                actual: None,
            };
        }
        let reason = format!("undeclared failure kind {kind}");
        self.render(UNEXPECTED_ERROR, &[("error", reason)])
    }
}

// ============================================================================
// SECTION: Failures
// ============================================================================

/// Rendered failure attached to a test result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    /// Failure kind.
    pub kind: FailureKind,
    /// Mode name.
    pub name: String,
    /// Rendered message.
    pub message: String,
    /// Expected value, when the failure is a comparison.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    /// Actual value, when the failure is a comparison.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
}

impl Failure {
    /// Attaches the expected value.
    #[must_use]
    pub fn with_expected(mut self, expected: impl Into<Value>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    /// Attaches the actual value.
    #[must_use]
    pub fn with_actual(mut self, actual: impl Into<Value>) -> Self {
        self.actual = Some(actual.into());
        self
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

// ============================================================================
// SECTION: Templates
// ============================================================================

/// Substitutes `{key}` placeholders in `template` with matching arguments.
///
/// Placeholders without a matching argument are left intact.
#[must_use]
pub fn render_template(template: &str, args: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let key = &after[..close];
        match args.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            None => {
                out.push('{');
                out.push_str(key);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================
