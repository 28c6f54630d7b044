// crates/anchor-tests-suites/src/transfer.rs
// ============================================================================
// Module: Transfer Suite
// Description: Checks for the anchor's transfer server.
// Purpose: Validate /info and the deposit endpoint's input validation.
// Dependencies: anchor-tests-core, serde_json
// ============================================================================

//! ## Overview
//! [`TRANSFER_INFO`] fills in `asset_code` when none was configured, so later
//! checks in the same pass exercise the first enabled deposit asset.
//! [`DEPOSIT_MISSING_ASSET`] depends on the web auth challenge only when
//! `[run.protocol_config.6] authentication_required = true`; that mode also
//! needs a bearer token in `auth_token`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use anchor_tests_core::HarnessConfig;
use anchor_tests_core::HttpRequest;
use anchor_tests_core::ProtocolId;
use anchor_tests_core::ResponseExpectation;
use anchor_tests_core::RunContext;
use anchor_tests_core::TestDefinition;
use anchor_tests_core::TestError;
use anchor_tests_core::TestId;
use anchor_tests_core::TestResult;
use serde_json::Value;

use crate::auth::AUTH_CHALLENGE;
use crate::discovery::TOML_EXISTS;
use crate::schema::info_schema;
use crate::schema::violations;
use crate::support::absolute_http_url;
use crate::support::join_url;
use crate::support::toml_str;

// ============================================================================
// SECTION: Identifiers
// ============================================================================

/// Transfer protocol.
#[allow(clippy::unwrap_used, reason = "Evaluated at compile time; a zero literal fails the build.")]
pub const TRANSFER: ProtocolId = ProtocolId::new(6).unwrap();
/// Group label for server discovery and `/info` checks.
pub const INFO_GROUP: &str = "/info";
/// Group label for `/deposit` checks.
pub const DEPOSIT_GROUP: &str = "/deposit";

/// The discovery file names a transfer server.
pub const TRANSFER_SERVER: &str = "transfer.server";
/// `/info` returns a schema-valid document with deposit assets.
pub const TRANSFER_INFO: &str = "transfer.info";
/// The configured asset is enabled for deposit.
pub const INFO_ASSET_LISTED: &str = "transfer.info.asset_listed";
/// `/deposit` without `asset_code` is rejected with an error message.
pub const DEPOSIT_MISSING_ASSET: &str = "transfer.deposit.missing_asset";

// ============================================================================
// SECTION: Definitions
// ============================================================================

/// Returns the transfer suite in declaration order.
#[must_use]
pub fn definitions() -> Vec<TestDefinition> {
    vec![
        TestDefinition::new(
            TRANSFER_SERVER,
            TRANSFER,
            INFO_GROUP,
            "stellar.toml has a valid TRANSFER_SERVER",
            transfer_server,
        )
        .with_dependencies([TOML_EXISTS])
        .with_expects(&["toml_contents"])
        .with_provides(&["transfer_server"])
        .with_failure_mode(
            "TRANSFER_SERVER_NOT_FOUND",
            "transfer server not found",
            "stellar.toml has no TRANSFER_SERVER",
        )
        .with_failure_mode(
            "INVALID_TRANSFER_SERVER",
            "invalid transfer server",
            "TRANSFER_SERVER {actual} is not an absolute http(s) URL",
        ),
        TestDefinition::new(
            TRANSFER_INFO,
            TRANSFER,
            INFO_GROUP,
            "/info response matches the schema",
            transfer_info,
        )
        .with_dependencies([TRANSFER_SERVER])
        .with_expects(&["transfer_server"])
        .with_provides(&["info"])
        .with_failure_mode("INVALID_SCHEMA", "invalid schema", "/info response is invalid: {errors}")
        .with_failure_mode("NO_ASSETS", "no assets", "/info lists no assets enabled for deposit"),
        TestDefinition::new(
            INFO_ASSET_LISTED,
            TRANSFER,
            INFO_GROUP,
            "configured asset is enabled for deposit",
            info_asset_listed,
        )
        .with_dependencies([TRANSFER_INFO])
        .with_expects(&["info"])
        .with_failure_mode(
            "ASSET_NOT_FOUND",
            "asset not found",
            "{asset} is not enabled for deposit in /info",
        ),
        TestDefinition::new(
            DEPOSIT_MISSING_ASSET,
            TRANSFER,
            DEPOSIT_GROUP,
            "rejects a deposit without asset_code",
            deposit_missing_asset,
        )
        .with_dynamic_dependencies(deposit_dependencies)
        .with_expects(&["transfer_server"])
        .with_failure_mode(
            "NO_ERROR_MESSAGE",
            "no error message",
            "rejected deposit response has no error string",
        ),
    ]
}

/// Dependencies of [`DEPOSIT_MISSING_ASSET`] for `config`.
fn deposit_dependencies(config: &HarnessConfig) -> Vec<TestId> {
    let mut dependencies = vec![TestId::new(TRANSFER_SERVER)];
    if requires_auth(config) {
        dependencies.push(TestId::new(AUTH_CHALLENGE));
    }
    dependencies
}

/// Returns true when transfer endpoints require authentication.
fn requires_auth(config: &HarnessConfig) -> bool {
    config.protocol_flag(TRANSFER, "authentication_required")
}

// ============================================================================
// SECTION: Checks
// ============================================================================

/// Reads and validates the transfer server URL.
fn transfer_server(ctx: &mut RunContext<'_>) -> Result<TestResult, TestError> {
    let contents = ctx.require("toml_contents")?;
    let Some(raw) = toml_str(contents, "TRANSFER_SERVER").map(str::to_string) else {
        return Err(ctx.fail("TRANSFER_SERVER_NOT_FOUND", &[]));
    };
    if absolute_http_url(&raw).is_none() {
        return Err(ctx.fail("INVALID_TRANSFER_SERVER", &[("actual", raw)]));
    }
    ctx.provide("transfer_server", raw.trim().trim_end_matches('/'))?;
    Ok(TestResult::passed())
}

/// Fetches `/info`, validates it, and fills in the asset code.
fn transfer_info(ctx: &mut RunContext<'_>) -> Result<TestResult, TestError> {
    let url = join_url(ctx.require_str("transfer_server")?, "/info");
    let response = ctx.call(
        HttpRequest::get(url),
        &ResponseExpectation::status(200).content_type("application/json"),
    )?;
    let Some(info) = response.json() else {
        return Err(ctx.fail("INVALID_SCHEMA", &[("errors", "body is not JSON".to_string())]));
    };
    let errors = violations(&info_schema(), info).map_err(TestError::Internal)?;
    if !errors.is_empty() {
        return Err(ctx.fail("INVALID_SCHEMA", &[("errors", errors.join("; "))]));
    }
    let Some(first) = enabled_deposit_assets(info).into_iter().next() else {
        return Err(ctx.fail("NO_ASSETS", &[]));
    };
    if ctx.config().asset_code.is_none() {
        ctx.config_mut().asset_code = Some(first);
    }
    ctx.provide("info", info.clone())?;
    Ok(TestResult::passed())
}

/// Checks that the configured asset is enabled for deposit.
fn info_asset_listed(ctx: &mut RunContext<'_>) -> Result<TestResult, TestError> {
    let Some(asset) = ctx.config().asset_code.clone() else {
        return Err(TestError::Misconfigured("asset_code is required".to_string()));
    };
    let info = ctx.require("info")?;
    if enabled_deposit_assets(info).contains(&asset) {
        Ok(TestResult::passed())
    } else {
        Err(ctx.failure("ASSET_NOT_FOUND", &[("asset", asset.clone())]).with_actual(asset).into())
    }
}

/// Requests a deposit without an asset code and expects a 400 with a message.
fn deposit_missing_asset(ctx: &mut RunContext<'_>) -> Result<TestResult, TestError> {
    let mut request = HttpRequest::get(join_url(ctx.require_str("transfer_server")?, "/deposit"));
    if requires_auth(ctx.config()) {
        let Some(token) = ctx.config().protocol_str(TRANSFER, "auth_token") else {
            return Err(TestError::Misconfigured(
                "[run.protocol_config.6] auth_token is required when authentication_required = true"
                    .to_string(),
            ));
        };
        request = request.header("Authorization", format!("Bearer {token}"));
    }
    let response =
        ctx.call(request, &ResponseExpectation::status(400).content_type("application/json"))?;
    let has_message = response
        .json()
        .and_then(|body| body.get("error"))
        .and_then(Value::as_str)
        .is_some_and(|message| !message.trim().is_empty());
    if has_message { Ok(TestResult::passed()) } else { Err(ctx.fail("NO_ERROR_MESSAGE", &[])) }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the asset codes enabled for deposit, in key order.
fn enabled_deposit_assets(info: &Value) -> Vec<String> {
    info.get("deposit")
        .and_then(Value::as_object)
        .map(|assets| {
            assets
                .iter()
                .filter(|(_, entry)| entry.get("enabled").and_then(Value::as_bool) == Some(true))
                .map(|(code, _)| code.clone())
                .collect()
        })
        .unwrap_or_default()
}
