// crates/anchor-tests-suites/src/auth.rs
// ============================================================================
// Module: Web Auth Suite
// Description: Checks for the anchor's web authentication endpoint.
// Purpose: Locate the endpoint and request a challenge for the configured account.
// Dependencies: anchor-tests-core, url
// ============================================================================

//! ## Overview
//! The challenge check needs an account to authenticate as, read from
//! `[run.protocol_config.10] account`. Without it the test reports a
//! configuration error instead of a protocol failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use anchor_tests_core::HttpRequest;
use anchor_tests_core::ProtocolId;
use anchor_tests_core::ResponseExpectation;
use anchor_tests_core::RunContext;
use anchor_tests_core::TestDefinition;
use anchor_tests_core::TestError;
use anchor_tests_core::TestResult;
use serde_json::Value;
use url::Url;

use crate::discovery::TOML_EXISTS;
use crate::discovery::TOML_NETWORK_PASSPHRASE;
use crate::support::absolute_http_url;
use crate::support::toml_str;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Web authentication protocol.
#[allow(clippy::unwrap_used, reason = "Evaluated at compile time; a zero literal fails the build.")]
pub const WEB_AUTH: ProtocolId = ProtocolId::new(10).unwrap();
/// Group label for every test in this suite.
pub const GROUP: &str = "Web Auth";

/// The discovery file names a web auth endpoint.
pub const AUTH_ENDPOINT: &str = "auth.endpoint";
/// The endpoint issues a challenge for the configured account.
pub const AUTH_CHALLENGE: &str = "auth.challenge";

// ============================================================================
// SECTION: Definitions
// ============================================================================

/// Returns the web auth suite in declaration order.
#[must_use]
pub fn definitions() -> Vec<TestDefinition> {
    vec![
        TestDefinition::new(
            AUTH_ENDPOINT,
            WEB_AUTH,
            GROUP,
            "stellar.toml has a valid WEB_AUTH_ENDPOINT",
            auth_endpoint,
        )
        .with_dependencies([TOML_EXISTS])
        .with_expects(&["toml_contents"])
        .with_provides(&["web_auth_endpoint"])
        .with_failure_mode(
            "WEB_AUTH_ENDPOINT_NOT_FOUND",
            "web auth endpoint not found",
            "stellar.toml has no WEB_AUTH_ENDPOINT",
        )
        .with_failure_mode(
            "INVALID_WEB_AUTH_ENDPOINT",
            "invalid web auth endpoint",
            "WEB_AUTH_ENDPOINT {actual} is not an absolute http(s) URL",
        ),
        TestDefinition::new(
            AUTH_CHALLENGE,
            WEB_AUTH,
            GROUP,
            "returns a challenge transaction for the account",
            auth_challenge,
        )
        .with_dependencies([AUTH_ENDPOINT, TOML_NETWORK_PASSPHRASE])
        .with_expects(&["web_auth_endpoint", "network_passphrase"])
        .with_provides(&["challenge_transaction"])
        .with_failure_mode(
            "NO_TRANSACTION",
            "no transaction",
            "challenge response has no transaction",
        )
        .with_failure_mode(
            "NETWORK_PASSPHRASE_MISMATCH",
            "network passphrase mismatch",
            "challenge network_passphrase {actual} does not match stellar.toml {expected}",
        ),
    ]
}

// ============================================================================
// SECTION: Checks
// ============================================================================

/// Reads and validates the web auth endpoint.
fn auth_endpoint(ctx: &mut RunContext<'_>) -> Result<TestResult, TestError> {
    let contents = ctx.require("toml_contents")?;
    let Some(raw) = toml_str(contents, "WEB_AUTH_ENDPOINT").map(str::to_string) else {
        return Err(ctx.fail("WEB_AUTH_ENDPOINT_NOT_FOUND", &[]));
    };
    let Some(endpoint) = absolute_http_url(&raw) else {
        return Err(ctx.fail("INVALID_WEB_AUTH_ENDPOINT", &[("actual", raw)]));
    };
    ctx.provide("web_auth_endpoint", endpoint.as_str())?;
    Ok(TestResult::passed())
}

/// Requests a challenge for the configured account.
fn auth_challenge(ctx: &mut RunContext<'_>) -> Result<TestResult, TestError> {
    let Some(account) = ctx.config().protocol_str(WEB_AUTH, "account").map(str::to_string) else {
        return Err(TestError::Misconfigured(
            "[run.protocol_config.10] account is required".to_string(),
        ));
    };
    let endpoint = ctx.require_str("web_auth_endpoint")?;
    let mut url = Url::parse(endpoint).map_err(|err| TestError::Internal(err.to_string()))?;
    url.query_pairs_mut().append_pair("account", &account);
    let expected_passphrase = ctx.require_str("network_passphrase")?.to_string();

    let response = ctx.call(
        HttpRequest::get(url.as_str()),
        &ResponseExpectation::status(200).content_type("application/json"),
    )?;
    let transaction = response
        .json()
        .and_then(|body| body.get("transaction"))
        .and_then(Value::as_str)
        .filter(|transaction| !transaction.is_empty());
    let Some(transaction) = transaction else {
        return Err(ctx.fail("NO_TRANSACTION", &[]));
    };
    if let Some(actual) = response.json().and_then(|body| body.get("network_passphrase"))
        && actual.as_str() != Some(expected_passphrase.as_str())
    {
        let actual_text = actual.as_str().map_or_else(|| actual.to_string(), str::to_string);
        return Err(ctx
            .failure(
                "NETWORK_PASSPHRASE_MISMATCH",
                &[("expected", expected_passphrase.clone()), ("actual", actual_text)],
            )
            .with_expected(expected_passphrase)
            .with_actual(actual.clone())
            .into());
    }
    ctx.provide("challenge_transaction", transaction)?;
    Ok(TestResult::passed())
}
