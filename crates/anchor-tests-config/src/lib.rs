// crates/anchor-tests-config/src/lib.rs
// ============================================================================
// Module: Anchor Tests Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for anchor-tests.toml semantics.
// Dependencies: anchor-tests-core, serde, toml
// ============================================================================

//! ## Overview
//! `anchor-tests-config` defines the configuration file model for the
//! conformance harness. It provides strict, fail-closed loading and a
//! deterministic example file.
//!
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
