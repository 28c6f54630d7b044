// crates/anchor-tests-suites/src/lib.rs
// ============================================================================
// Module: Anchor Tests Suites
// Description: Built-in protocol suites and the default catalog.
// Purpose: Ship conformance checks for the discovery file, web auth, and transfer.
// Dependencies: anchor-tests-core, jsonschema, toml, url
// ============================================================================

//! ## Overview
//! Each suite module exposes its protocol identifier, its test ids, and a
//! `definitions()` function. [`default_catalog`] registers every suite in a
//! single [`TestCatalog`], in declaration order.
//! Invariants:
//! - Test ids are unique across suites.
//! - Cross-suite dependencies only name ids registered here.
//!
//! Security posture: anchor responses are untrusted; every field read from a
//! response is validated before it is published to dependents.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod auth;
pub mod discovery;
pub mod schema;
pub mod transfer;

mod support;

// ============================================================================
// SECTION: Imports
// ============================================================================

use anchor_tests_core::CatalogError;
use anchor_tests_core::TestCatalog;
use anchor_tests_core::TestDefinition;

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Returns every built-in definition in declaration order.
#[must_use]
pub fn definitions() -> Vec<TestDefinition> {
    let mut definitions = discovery::definitions();
    definitions.extend(auth::definitions());
    definitions.extend(transfer::definitions());
    definitions
}

/// Builds the catalog of built-in suites.
///
/// # Errors
///
/// Returns [`CatalogError`] when the built-in definitions are inconsistent.
pub fn default_catalog() -> Result<TestCatalog, CatalogError> {
    TestCatalog::builder().register_all(definitions()).build()
}

#[cfg(test)]
mod tests;
