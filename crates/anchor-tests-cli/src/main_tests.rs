// crates/anchor-tests-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument parsing, overrides, and rendering.
// Purpose: Ensure flags merge over the config file and output stays stable.
// Dependencies: anchor-tests-cli main helpers
// ============================================================================

//! ## Overview
//! Exercises the CLI helpers without touching the network.

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

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;

use anchor_tests_config::OutputFormat;
use anchor_tests_core::Failure;
use anchor_tests_core::FailureKind;
use anchor_tests_core::HttpRequest;
use anchor_tests_core::NetworkCall;
use anchor_tests_core::ProtocolId;
use anchor_tests_core::RunSummary;
use anchor_tests_core::TestId;
use anchor_tests_core::TestRunRecord;
use anchor_tests_core::TestStatus;
use clap::Parser;
use tempfile::NamedTempFile;

use super::Cli;
use super::Commands;
use super::FormatArg;
use super::RunArgs;
use super::load_config;
use super::render_record;
use super::render_summary;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Writes a config file with the given contents.
fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

/// A failed record with one call that never got a response.
fn failed_record() -> TestRunRecord {
    TestRunRecord {
        test_id: TestId::new("toml.exists"),
        protocol: ProtocolId::new(1).unwrap(),
        group: "stellar.toml".to_string(),
        assertion: "stellar.toml exists and parses".to_string(),
        status: TestStatus::Failed,
        skipped: false,
        failure: Some(Failure {
            kind: FailureKind::new("NO_TOML"),
            name: "no stellar.toml".to_string(),
            message: "not found".to_string(),
            expected: None,
            actual: None,
        }),
        network_calls: vec![NetworkCall {
            request: HttpRequest::get("https://a.example/.well-known/stellar.toml"),
            response: None,
        }],
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn run_flags_parse_protocol_aliases_and_lists() {
    let cli = Cli::try_parse_from([
        "anchor-tests",
        "--config",
        "custom.toml",
        "run",
        "--domain",
        "a.example",
        "--protocol",
        "1,sep-10",
        "--protocol",
        "6",
        "--format",
        "json",
    ])
    .unwrap();
    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("custom.toml")));
    let Commands::Run(args) = cli.command else { panic!("expected run command") };
    assert_eq!(
        args.protocols,
        vec![ProtocolId::new(1).unwrap(), ProtocolId::new(10).unwrap(), ProtocolId::new(6).unwrap()]
    );
    assert_eq!(args.format, Some(FormatArg::Json));
}

#[test]
fn zero_protocol_is_rejected_by_the_parser() {
    assert!(Cli::try_parse_from(["anchor-tests", "list", "--protocol", "0"]).is_err());
}

#[test]
fn flags_override_file_values() {
    let file = config_file(
        "[run]\ndomain = \"file.example\"\nprotocols = [1]\n[output]\nformat = \"json\"\n",
    );
    let args = RunArgs {
        domain: Some("flag.example".to_string()),
        protocols: vec![ProtocolId::new(6).unwrap()],
        asset_code: Some("USDC".to_string()),
        verbose: true,
        format: Some(FormatArg::Text),
    };
    let config = load_config(Some(file.path()), &args).unwrap();
    assert_eq!(config.run.domain, "flag.example");
    assert_eq!(config.run.protocols, vec![ProtocolId::new(6).unwrap()]);
    assert_eq!(config.run.asset_code.as_deref(), Some("USDC"));
    assert!(config.run.verbose);
    assert_eq!(config.output.format, OutputFormat::Text);
}

#[test]
fn file_values_survive_empty_flags() {
    let file = config_file("[run]\ndomain = \"file.example\"\nprotocols = [1, 6]\n");
    let config = load_config(Some(file.path()), &RunArgs::default()).unwrap();
    assert_eq!(config.run.domain, "file.example");
    assert_eq!(config.run.protocols.len(), 2);
}

#[test]
fn incomplete_run_section_is_rejected() {
    let file = config_file("[run]\nprotocols = [1]\n");
    let err = load_config(Some(file.path()), &RunArgs::default()).unwrap_err();
    assert!(err.to_string().contains("domain must not be empty"), "{err}");
}

#[test]
fn explicit_missing_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let err = load_config(Some(&missing), &RunArgs::default()).unwrap_err();
    assert!(err.to_string().starts_with("failed to load config"), "{err}");
}

#[test]
fn text_record_lists_failure_and_calls_when_verbose() {
    let record = failed_record();
    let quiet = render_record(&record, OutputFormat::Text, false).unwrap();
    assert_eq!(
        quiet,
        vec![
            "FAIL [1] toml.exists (stellar.toml): stellar.toml exists and parses".to_string(),
            "     NO_TOML: not found".to_string(),
        ]
    );
    let verbose = render_record(&record, OutputFormat::Text, true).unwrap();
    assert_eq!(
        verbose[2],
        "     GET https://a.example/.well-known/stellar.toml -> no response"
    );
}

#[test]
fn json_record_is_one_line() {
    let lines = render_record(&failed_record(), OutputFormat::Json, true).unwrap();
    assert_eq!(lines.len(), 1);
    let value: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(value["status"], "failed");
    assert_eq!(value["failure"]["kind"], "NO_TOML");
}

#[test]
fn summary_marks_cancellation() {
    let summary = RunSummary { planned: 4, passed: 1, failed: 1, skipped: 0, cancelled: true };
    assert_eq!(
        render_summary(&summary, OutputFormat::Text).unwrap(),
        "1 passed, 1 failed, 0 skipped of 4 planned (cancelled)"
    );
    let json: serde_json::Value =
        serde_json::from_str(&render_summary(&summary, OutputFormat::Json).unwrap()).unwrap();
    assert_eq!(json["summary"]["cancelled"], true);
}
