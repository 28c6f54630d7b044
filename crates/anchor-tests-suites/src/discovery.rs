// crates/anchor-tests-suites/src/discovery.rs
// ============================================================================
// Module: Discovery File Suite
// Description: Checks for the anchor's published stellar.toml.
// Purpose: Fetch, parse, and publish discovery values used by other suites.
// Dependencies: anchor-tests-core, stellar-strkey, toml
// ============================================================================

//! ## Overview
//! The discovery file is fetched once by [`TOML_EXISTS`]; every other test in
//! this and the dependent suites reads its parsed contents from context.
//! Invariants:
//! - `toml_contents` is the parsed file as a JSON object.
//! - `network_passphrase` is only published when it names a known network.

// ============================================================================
// SECTION: Imports
// ============================================================================

use anchor_tests_core::CONNECTION_ERROR;
use anchor_tests_core::HarnessConfig;
use anchor_tests_core::HttpRequest;
use anchor_tests_core::ProtocolId;
use anchor_tests_core::ResponseExpectation;
use anchor_tests_core::RunContext;
use anchor_tests_core::TestDefinition;
use anchor_tests_core::TestError;
use anchor_tests_core::TestResult;
use serde_json::json;

use crate::support::body_text;
use crate::support::toml_str;
use crate::support::toml_to_json;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Discovery file protocol.
#[allow(clippy::unwrap_used, reason = "Evaluated at compile time; a zero literal fails the build.")]
pub const DISCOVERY: ProtocolId = ProtocolId::new(1).unwrap();
/// Group label for every test in this suite.
pub const GROUP: &str = "stellar.toml";
/// Well-known path of the discovery file.
pub const TOML_PATH: &str = "/.well-known/stellar.toml";

/// The discovery file exists and parses.
pub const TOML_EXISTS: &str = "toml.exists";
/// The discovery file is served with permissive CORS headers.
pub const TOML_CORS: &str = "toml.cors";
/// The discovery file names a known network passphrase.
pub const TOML_NETWORK_PASSPHRASE: &str = "toml.network_passphrase";
/// The discovery file carries a well-formed signing key.
pub const TOML_SIGNING_KEY: &str = "toml.signing_key";

/// Origin sent by the CORS check.
const CORS_ORIGIN: &str = "https://www.website.com";

/// Passphrases of the public Stellar networks.
pub const KNOWN_NETWORKS: [&str; 3] = [
    "Public Global Stellar Network ; September 2015",
    "Test SDF Network ; September 2015",
    "Test SDF Future Network ; October 2022",
];

// ============================================================================
// SECTION: Definitions
// ============================================================================

/// Returns the discovery suite in declaration order.
#[must_use]
pub fn definitions() -> Vec<TestDefinition> {
    vec![
        TestDefinition::new(TOML_EXISTS, DISCOVERY, GROUP, "stellar.toml exists and parses", toml_exists)
            .with_provides(&["toml_url", "toml_contents"])
            .with_failure_mode("NO_TOML", "no stellar.toml", "{url} did not return a stellar.toml: {reason}")
            .with_failure_mode("PARSE_ERROR", "parse error", "{url} is not valid TOML: {error}"),
        TestDefinition::new(TOML_CORS, DISCOVERY, GROUP, "stellar.toml has CORS headers", toml_cors)
            .with_dependencies([TOML_EXISTS])
            .with_expects(&["toml_url"])
            .with_failure_mode(
                "NO_CORS_HEADERS",
                "no CORS headers",
                "{url} returned no Access-Control-Allow-Origin header",
            )
            .with_failure_mode(
                "INCORRECT_CORS_HEADERS",
                "incorrect CORS headers",
                "Access-Control-Allow-Origin must be *, got {actual}",
            ),
        TestDefinition::new(
            TOML_NETWORK_PASSPHRASE,
            DISCOVERY,
            GROUP,
            "stellar.toml has a valid network passphrase",
            toml_network_passphrase,
        )
        .with_dependencies([TOML_EXISTS])
        .with_expects(&["toml_contents"])
        .with_provides(&["network_passphrase"])
        .with_failure_mode(
            "NETWORK_PASSPHRASE_NOT_FOUND",
            "network passphrase not found",
            "stellar.toml has no NETWORK_PASSPHRASE",
        )
        .with_failure_mode(
            "INVALID_NETWORK_PASSPHRASE",
            "invalid network passphrase",
            "NETWORK_PASSPHRASE {actual} is not a known network",
        ),
        TestDefinition::new(
            TOML_SIGNING_KEY,
            DISCOVERY,
            GROUP,
            "stellar.toml has a valid signing key",
            toml_signing_key,
        )
        .with_dependencies([TOML_EXISTS])
        .with_expects(&["toml_contents"])
        .with_failure_mode("SIGNING_KEY_NOT_FOUND", "signing key not found", "stellar.toml has no SIGNING_KEY")
        .with_failure_mode(
            "INVALID_SIGNING_KEY",
            "invalid signing key",
            "SIGNING_KEY {actual} is not a public account key",
        ),
    ]
}

/// Returns the discovery file URL for the configured domain.
#[must_use]
pub fn toml_url(config: &HarnessConfig) -> String {
    format!("{}{TOML_PATH}", config.home_url())
}

/// Returns true when `key` decodes as an ed25519 public account key.
///
/// Decoding checks the `G` version byte, the payload length, and the CRC16
/// checksum.
#[must_use]
pub fn is_valid_public_key(key: &str) -> bool {
    stellar_strkey::ed25519::PublicKey::from_string(key).is_ok()
}

// ============================================================================
// SECTION: Checks
// ============================================================================

/// Fetches and parses the discovery file.
fn toml_exists(ctx: &mut RunContext<'_>) -> Result<TestResult, TestError> {
    let url = toml_url(ctx.config());
    let response = match ctx.call(HttpRequest::get(url.clone()), &ResponseExpectation::status(200)) {
        Ok(response) => response,
        Err(TestError::Failed(failure)) if failure.kind != CONNECTION_ERROR => {
            return Err(ctx.fail("NO_TOML", &[("url", url), ("reason", failure.message)]));
        }
        Err(err) => return Err(err),
    };
    let table = match body_text(&response).parse::<toml::Table>() {
        Ok(table) => table,
        Err(err) => {
            return Err(ctx.fail("PARSE_ERROR", &[("url", url), ("error", err.message().to_string())]));
        }
    };
    let contents = toml_to_json(&table)?;
    ctx.provide("toml_url", url)?;
    ctx.provide("toml_contents", contents)?;
    Ok(TestResult::passed())
}

/// Checks the discovery file's CORS header.
fn toml_cors(ctx: &mut RunContext<'_>) -> Result<TestResult, TestError> {
    let url = ctx.require_str("toml_url")?.to_string();
    let request = HttpRequest::get(url.clone()).header("Origin", CORS_ORIGIN);
    let response = ctx.call(request, &ResponseExpectation::status(200))?;
    match response.header("access-control-allow-origin") {
        None => Err(ctx.fail("NO_CORS_HEADERS", &[("url", url)])),
        Some("*") => Ok(TestResult::passed()),
        Some(actual) => Err(ctx
            .failure("INCORRECT_CORS_HEADERS", &[("actual", actual.to_string())])
            .with_expected("*")
            .with_actual(actual)
            .into()),
    }
}

/// Checks the discovery file's network passphrase.
fn toml_network_passphrase(ctx: &mut RunContext<'_>) -> Result<TestResult, TestError> {
    let contents = ctx.require("toml_contents")?;
    let Some(passphrase) = toml_str(contents, "NETWORK_PASSPHRASE").map(str::to_string) else {
        return Err(ctx.fail("NETWORK_PASSPHRASE_NOT_FOUND", &[]));
    };
    if !KNOWN_NETWORKS.contains(&passphrase.as_str()) {
        return Err(ctx
            .failure("INVALID_NETWORK_PASSPHRASE", &[("actual", passphrase.clone())])
            .with_expected(json!(KNOWN_NETWORKS))
            .with_actual(passphrase)
            .into());
    }
    ctx.provide("network_passphrase", passphrase)?;
    Ok(TestResult::passed())
}

/// Checks the discovery file's signing key.
fn toml_signing_key(ctx: &mut RunContext<'_>) -> Result<TestResult, TestError> {
    let contents = ctx.require("toml_contents")?;
    let Some(key) = toml_str(contents, "SIGNING_KEY") else {
        return Err(ctx.fail("SIGNING_KEY_NOT_FOUND", &[]));
    };
    if is_valid_public_key(key) {
        Ok(TestResult::passed())
    } else {
        Err(ctx.fail("INVALID_SIGNING_KEY", &[("actual", key.to_string())]))
    }
}
