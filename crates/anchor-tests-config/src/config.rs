// crates/anchor-tests-config/src/config.rs
// ============================================================================
// Module: Anchor Tests Configuration
// Description: Configuration loading and validation for the harness.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: anchor-tests-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! The `[run]` section is the run configuration handed to the engine; the
//! `[output]` section selects the event log sink and result format.
//! Security posture: config inputs are untrusted and may carry bearer tokens;
//! tokens are never echoed into error messages.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use anchor_tests_core::FileEventSink;
use anchor_tests_core::HarnessConfig;
use anchor_tests_core::NoopEventSink;
use anchor_tests_core::RunEventSink;
use anchor_tests_core::StderrEventSink;
use anchor_tests_core::core::config::MAX_DOMAIN_LENGTH;
use anchor_tests_core::core::config::MAX_REQUEST_TIMEOUT_MS;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "anchor-tests.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "ANCHOR_TESTS_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of selected protocols.
pub(crate) const MAX_PROTOCOLS: usize = 64;
/// Maximum length of an asset code.
pub(crate) const MAX_ASSET_CODE_LENGTH: usize = 12;

// ============================================================================
// SECTION: Configuration Model
// ============================================================================

/// Top-level `anchor-tests.toml` model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnchorTestsConfig {
    /// Run configuration.
    #[serde(default)]
    pub run: HarnessConfig,
    /// Output configuration.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Event log sink selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLogTarget {
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to `event_log_path`.
    File,
    /// Events are discarded.
    #[default]
    None,
}

/// Result stream format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON record per line.
    Json,
}

/// `[output]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Event log sink.
    #[serde(default)]
    pub event_log: EventLogTarget,
    /// Event log path, required for the file sink.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_log_path: Option<String>,
    /// Result stream format.
    #[serde(default)]
    pub format: OutputFormat,
}

impl OutputConfig {
    /// Validates sink settings.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.event_log, &self.event_log_path) {
            (EventLogTarget::File, None) => Err(ConfigError::Invalid(
                "output.event_log_path is required when output.event_log = \"file\"".to_string(),
            )),
            (EventLogTarget::File, Some(path)) => validate_path_string("output.event_log_path", path),
            (_, Some(_)) => Err(ConfigError::Invalid(
                "output.event_log_path is only valid when output.event_log = \"file\"".to_string(),
            )),
            (_, None) => Ok(()),
        }
    }
}

impl AnchorTestsConfig {
    /// Wraps a run configuration with default output settings.
    #[must_use]
    pub fn from_run(run: HarnessConfig) -> Self {
        Self { run, output: OutputConfig::default() }
    }

    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::parse(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates file-level consistency.
    ///
    /// The domain and protocol list may be empty here because command-line
    /// flags can supply them; [`AnchorTestsConfig::validate_for_run`] checks
    /// the merged result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let run = &self.run;
        if run.domain.trim().len() > MAX_DOMAIN_LENGTH {
            return Err(ConfigError::Invalid("run.domain exceeds max length".to_string()));
        }
        if run.protocols.len() > MAX_PROTOCOLS {
            return Err(ConfigError::Invalid(format!(
                "run.protocols exceeds max of {MAX_PROTOCOLS} entries"
            )));
        }
        if run.request_timeout_ms == 0 || run.request_timeout_ms > MAX_REQUEST_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "run.request_timeout_ms must be between 1 and {MAX_REQUEST_TIMEOUT_MS}"
            )));
        }
        if let Some(asset) = &run.asset_code {
            validate_asset_code(asset)?;
        }
        for (key, section) in &run.protocol_config {
            validate_protocol_section(key, section)?;
        }
        self.output.validate()
    }

    /// Validates the merged configuration before a run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the run section cannot drive a pass.
    pub fn validate_for_run(&self) -> Result<(), ConfigError> {
        self.validate()?;
        self.run.validate().map_err(|err| ConfigError::Invalid(format!("run: {err}")))
    }

    /// Builds the configured event sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the event log cannot be opened.
    pub fn event_sink(&self) -> Result<Arc<dyn RunEventSink>, ConfigError> {
        match (self.output.event_log, &self.output.event_log_path) {
            (EventLogTarget::Stderr, _) => Ok(Arc::new(StderrEventSink)),
            (EventLogTarget::File, Some(path)) => FileEventSink::new(Path::new(path))
                .map(|sink| Arc::new(sink) as Arc<dyn RunEventSink>)
                .map_err(|err| ConfigError::Io(err.to_string())),
            (EventLogTarget::File, None) => Err(ConfigError::Invalid(
                "output.event_log_path is required when output.event_log = \"file\"".to_string(),
            )),
            (EventLogTarget::None, _) => Ok(Arc::new(NoopEventSink)),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Returns the path that [`AnchorTestsConfig::load`] would read.
///
/// # Errors
///
/// Returns [`ConfigError`] when the environment override is too long.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    resolve_path(None)
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates an asset code: 1-12 ASCII alphanumerics.
fn validate_asset_code(asset: &str) -> Result<(), ConfigError> {
    let valid = !asset.is_empty()
        && asset.len() <= MAX_ASSET_CODE_LENGTH
        && asset.chars().all(|ch| ch.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "run.asset_code must be 1-{MAX_ASSET_CODE_LENGTH} ascii alphanumerics"
        )))
    }
}

/// Validates a `[run.protocol_config.<id>]` section.
fn validate_protocol_section(key: &str, section: &Value) -> Result<(), ConfigError> {
    let numeric = key.parse::<u16>().is_ok_and(|id| id != 0);
    if !numeric {
        return Err(ConfigError::Invalid(format!(
            "run.protocol_config key {key} must be a non-zero protocol number"
        )));
    }
    if !section.is_object() {
        return Err(ConfigError::Invalid(format!("run.protocol_config.{key} must be a table")));
    }
    Ok(())
}
