// crates/anchor-tests-http/src/lib.rs
// ============================================================================
// Module: Anchor Tests HTTP Transport
// Description: Library entry point for the reqwest-backed network caller.
// Purpose: Send protocol test requests to live anchors.
// Dependencies: anchor-tests-core, reqwest, url
// ============================================================================

//! ## Overview
//! Provides [`ReqwestCaller`], the production [`anchor_tests_core::NetworkCaller`].
//! The runtime never depends on this crate directly; binaries wire it in.

pub mod caller;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use caller::MAX_REDIRECTS;
pub use caller::MAX_RESPONSE_BYTES;
pub use caller::ReqwestCaller;
pub use caller::TransportError;
