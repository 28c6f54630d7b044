// crates/anchor-tests-suites/src/tests.rs
// ============================================================================
// Module: Suites Unit Tests
// Description: Catalog-level checks for the built-in suites.
// Purpose: Ensure built-in definitions form a consistent catalog.
// Dependencies: anchor-tests-suites
// ============================================================================

//! ## Overview
//! Validates ids, protocols, and dependency wiring of the default catalog.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use anchor_tests_core::HarnessConfig;
use anchor_tests_core::ProtocolId;
use anchor_tests_core::TestId;
use anchor_tests_core::resolve;
use serde_json::json;

use crate::auth::AUTH_CHALLENGE;
use crate::auth::WEB_AUTH;
use crate::default_catalog;
use crate::discovery::DISCOVERY;
use crate::discovery::is_valid_public_key;
use crate::transfer::DEPOSIT_MISSING_ASSET;
use crate::transfer::TRANSFER;

/// Resolves the default catalog for `protocols` and returns the plan ids.
fn plan_ids(config: &HarnessConfig) -> Vec<String> {
    let catalog = default_catalog().unwrap();
    let seeds = catalog.list(&config.protocols);
    resolve(&catalog, config, &seeds)
        .unwrap()
        .iter()
        .map(|test| test.definition.id().to_string())
        .collect()
}

#[test]
fn default_catalog_covers_three_protocols() {
    let catalog = default_catalog().unwrap();
    let protocols: Vec<ProtocolId> = catalog.protocols().into_iter().collect();
    assert_eq!(protocols, vec![DISCOVERY, TRANSFER, WEB_AUTH]);
    assert_eq!(catalog.len(), 10);
}

#[test]
fn transfer_plan_pulls_in_discovery_prerequisite() {
    let config = HarnessConfig::new("anchor.example", vec![TRANSFER]);
    assert_eq!(
        plan_ids(&config),
        vec![
            "toml.exists",
            "transfer.server",
            "transfer.info",
            "transfer.info.asset_listed",
            "transfer.deposit.missing_asset",
        ]
    );
}

#[test]
fn authenticated_deposit_depends_on_challenge() {
    let mut config = HarnessConfig::new("anchor.example", vec![TRANSFER]);
    config.protocol_config.insert("6".to_string(), json!({"authentication_required": true}));
    let ids = plan_ids(&config);
    let challenge = ids.iter().position(|id| id == AUTH_CHALLENGE).unwrap();
    let deposit = ids.iter().position(|id| id == DEPOSIT_MISSING_ASSET).unwrap();
    assert!(challenge < deposit);

    let catalog = default_catalog().unwrap();
    let deposit = catalog.get(&TestId::new(DEPOSIT_MISSING_ASSET)).unwrap();
    assert!(deposit.dependencies().fixed().is_none());
}

#[test]
fn signing_key_must_decode_with_valid_checksum() {
    assert!(is_valid_public_key("GCKFBEIYV2U22IO2BJ4KVJOIP7XPWQGQFKKWXR6DOSJBV7STMAQSMTGG"));
    assert!(!is_valid_public_key("SCKFBEIYV2U22IO2BJ4KVJOIP7XPWQGQFKKWXR6DOSJBV7STMAQSMTGG"));
    assert!(!is_valid_public_key("GCKFBEIYV2U22IO2BJ4KVJOIP7XPWQGQFKKWXR6DOSJBV7STMAQSMTG1"));
    assert!(!is_valid_public_key("GABC"));
    // Right length, alphabet, and prefix; corrupted checksum.
    assert!(!is_valid_public_key("GCKFBEIYV2U22IO2BJ4KVJOIP7XPWQGQFKKWXR6DOSJBV7STMAQSMTGH"));
    assert!(!is_valid_public_key("GDKFBEIYV2U22IO2BJ4KVJOIP7XPWQGQFKKWXR6DOSJBV7STMAQSMTGG"));
}
