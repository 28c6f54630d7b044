//! Config load validation tests for anchor-tests-config.
// crates/anchor-tests-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding).
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

use std::io::Write;
use std::path::Path;

use anchor_tests_config::AnchorTestsConfig;
use anchor_tests_config::ConfigError;
use tempfile::NamedTempFile;

type TestResult = Result<(), String>;

/// Asserts that `result` is an error whose message contains `needle`.
fn assert_invalid(result: Result<AnchorTestsConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

/// Writes `contents` to a temporary file.
fn write_temp(contents: &[u8]) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(contents).map_err(|err| err.to_string())?;
    Ok(file)
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    let path = Path::new(&long_path);
    assert_invalid(AnchorTestsConfig::load(Some(path)), "config path exceeds max length")?;
    Ok(())
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    let path = Path::new(&long_component);
    assert_invalid(AnchorTestsConfig::load(Some(path)), "config path component too long")?;
    Ok(())
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let file = write_temp(&vec![b'a'; 1_048_577])?;
    assert_invalid(AnchorTestsConfig::load(Some(file.path())), "config file exceeds size limit")?;
    Ok(())
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let file = write_temp(&[0xFF, 0xFE, 0xFF])?;
    assert_invalid(AnchorTestsConfig::load(Some(file.path())), "config file must be utf-8")?;
    Ok(())
}

#[test]
fn load_reports_missing_file_as_io_error() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let missing = dir.path().join("absent.toml");
    assert_invalid(AnchorTestsConfig::load(Some(&missing)), "config io error")?;
    Ok(())
}

#[test]
fn load_reports_toml_syntax_errors() -> TestResult {
    let file = write_temp(b"[run\ndomain = ")?;
    assert_invalid(AnchorTestsConfig::load(Some(file.path())), "config parse error")?;
    Ok(())
}

#[test]
fn load_accepts_minimal_file() -> TestResult {
    let file = write_temp(b"[run]\ndomain = \"anchor.example\"\nprotocols = [1]\n")?;
    let config = AnchorTestsConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.run.domain != "anchor.example" || config.run.protocols.len() != 1 {
        return Err(format!("unexpected run section: {}", config.run.domain));
    }
    config.validate_for_run().map_err(|err| err.to_string())?;
    Ok(())
}
