// crates/anchor-tests-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic starter file for `anchor-tests config example`.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for `anchor-tests.toml`. The output is deterministic and
//! is parsed by the crate tests so it never drifts from the model.

/// Returns a canonical example `anchor-tests.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[run]
domain = "testanchor.stellar.org"
protocols = [1, 10, 6]
# asset_code = "SRT"
verbose = false
request_timeout_ms = 30000

[run.protocol_config.10]
account = "GCKFBEIYV2U22IO2BJ4KVJOIP7XPWQGQFKKWXR6DOSJBV7STMAQSMTGG"

[run.protocol_config.6]
authentication_required = false
# auth_token = "<jwt from a web auth exchange>"

[output]
event_log = "none"
# event_log = "file"
# event_log_path = "anchor-tests.events.jsonl"
format = "text"
"#,
    )
}
