// crates/anchor-tests-core/src/core/identifiers.rs
// ============================================================================
// Module: Anchor Tests Identifiers
// Description: Canonical identifiers for protocols and test definitions.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! This module defines the identifiers used throughout the harness. Protocol
//! identifiers serialize as numbers; test identifiers are opaque strings and
//! serve as the memoization key for a single execution pass.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::num::NonZeroU16;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Protocol identifier (the numeric protocol designation, e.g. `6`).
///
/// # Invariants
/// - Serializes as a bare number on the wire.
/// - Never zero: construction, parsing, and deserialization all reject `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct ProtocolId(NonZeroU16);

impl ProtocolId {
    /// Creates a protocol identifier, returning `None` for zero.
    #[must_use]
    pub const fn new(id: u16) -> Option<Self> {
        match NonZeroU16::new(id) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// Returns the numeric designation.
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0.get()
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<u16> for ProtocolId {
    type Error = ParseProtocolIdError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| ParseProtocolIdError(value.to_string()))
    }
}

impl From<ProtocolId> for u16 {
    fn from(value: ProtocolId) -> Self {
        value.get()
    }
}

/// Error returned when a protocol identifier fails to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid protocol identifier {0}: expected a non-zero protocol number")]
pub struct ParseProtocolIdError(String);

impl FromStr for ProtocolId {
    type Err = ParseProtocolIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let trimmed = trimmed
            .strip_prefix("sep-")
            .or_else(|| trimmed.strip_prefix("SEP-"))
            .unwrap_or(trimmed);
        trimmed
            .parse::<u16>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| ParseProtocolIdError(value.to_string()))
    }
}

/// Test definition identifier.
///
/// # Invariants
/// - Opaque UTF-8 string; unique within a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestId(String);

impl TestId {
    /// Creates a new test identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TestId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TestId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&TestId> for TestId {
    fn from(value: &TestId) -> Self {
        value.clone()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
