// crates/anchor-tests-core/src/interfaces/mod.rs
// ============================================================================
// Module: Anchor Tests Interfaces
// Description: Transport-agnostic interfaces used by the execution runtime.
// Purpose: Define the network-call contract without embedding an HTTP client.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The runtime performs protocol interaction through [`NetworkCaller`].
//! Implementations own connection handling and per-request timeouts; the
//! runtime owns classification of responses into failure kinds.
//!
//! Security posture: callers talk to untrusted anchors. Implementations must
//! bound response sizes and must not follow redirects to arbitrary schemes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use thiserror::Error;

use crate::core::network::HttpRequest;
use crate::core::network::TransportResponse;

// ============================================================================
// SECTION: Network Caller
// ============================================================================

/// Transport errors surfaced by a [`NetworkCaller`].
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// Connection could not be established or was interrupted.
    #[error("connection failed: {0}")]
    Connection(String),
    /// The request did not complete within the timeout.
    #[error("request timed out after {0} ms")]
    Timeout(u64),
    /// The response body exceeded the size limit.
    #[error("response exceeds size limit ({actual} > {limit} bytes)")]
    TooLarge {
        /// Maximum accepted body size.
        limit: usize,
        /// Observed body size.
        actual: usize,
    },
    /// The request could not be sent as prepared.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Performs HTTP calls on behalf of tests.
pub trait NetworkCaller: Send + Sync {
    /// Sends `request` and returns the raw response.
    ///
    /// # Errors
    ///
    /// Returns [`CallError`] when no complete response was received.
    fn send(&self, request: &HttpRequest, timeout: Duration)
    -> Result<TransportResponse, CallError>;
}
