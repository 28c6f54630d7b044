// crates/anchor-tests-core/src/core/config.rs
// ============================================================================
// Module: Anchor Tests Run Configuration
// Description: The configuration threaded through one execution pass.
// Purpose: Describe the target anchor, selected protocols, and per-protocol options.
// Dependencies: serde, serde_json, thiserror, url
// ============================================================================

//! ## Overview
//! [`HarnessConfig`] is owned by a single execution. It is moved into the
//! execution, lent mutably to each test, and handed back at the end. Early tests
//! may fill defaults (for example an asset code) that later tests observe.
//!
//! Unknown fields are accepted so that per-protocol options can grow without
//! breaking older configuration files.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::core::identifiers::ProtocolId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default per-request timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
/// Upper bound on the per-request timeout in milliseconds.
pub const MAX_REQUEST_TIMEOUT_MS: u64 = 300_000;
/// Maximum length of the target domain.
pub const MAX_DOMAIN_LENGTH: usize = 2048;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Pass-level configuration errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessConfigError {
    /// The target domain is empty.
    #[error("domain must not be empty")]
    EmptyDomain,
    /// The target domain does not form a valid URL.
    #[error("invalid domain: {0}")]
    InvalidDomain(String),
    /// No protocol was selected.
    #[error("at least one protocol must be selected")]
    NoProtocols,
    /// The request timeout is outside the supported range.
    #[error("request_timeout_ms must be between 1 and {MAX_REQUEST_TIMEOUT_MS}")]
    InvalidTimeout,
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Run configuration for one execution pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Target domain, with or without a scheme.
    #[serde(default)]
    pub domain: String,
    /// Selected protocols.
    #[serde(default)]
    pub protocols: Vec<ProtocolId>,
    /// Asset code under test; may be filled by discovery tests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_code: Option<String>,
    /// Per-protocol sub-configuration keyed by protocol number.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub protocol_config: BTreeMap<String, Value>,
    /// Verbose output flag.
    #[serde(default)]
    pub verbose: bool,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            protocols: Vec::new(),
            asset_code: None,
            protocol_config: BTreeMap::new(),
            verbose: false,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl HarnessConfig {
    /// Creates a configuration for `domain` and `protocols`.
    #[must_use]
    pub fn new(domain: impl Into<String>, protocols: Vec<ProtocolId>) -> Self {
        Self { domain: domain.into(), protocols, ..Self::default() }
    }

    /// Validates pass-level structure.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessConfigError`] when the configuration cannot drive a run.
    pub fn validate(&self) -> Result<(), HarnessConfigError> {
        let domain = self.domain.trim();
        if domain.is_empty() {
            return Err(HarnessConfigError::EmptyDomain);
        }
        if domain.len() > MAX_DOMAIN_LENGTH {
            return Err(HarnessConfigError::InvalidDomain("domain too long".to_string()));
        }
        let url = Url::parse(&self.home_url())
            .map_err(|err| HarnessConfigError::InvalidDomain(err.to_string()))?;
        if url.host_str().is_none() {
            return Err(HarnessConfigError::InvalidDomain(format!("{domain} has no host")));
        }
        if self.protocols.is_empty() {
            return Err(HarnessConfigError::NoProtocols);
        }
        if self.request_timeout_ms == 0 || self.request_timeout_ms > MAX_REQUEST_TIMEOUT_MS {
            return Err(HarnessConfigError::InvalidTimeout);
        }
        Ok(())
    }

    /// Returns the anchor home URL without a trailing slash.
    ///
    /// A domain without a scheme is treated as `https`.
    #[must_use]
    pub fn home_url(&self) -> String {
        let domain = self.domain.trim().trim_end_matches('/');
        if domain.starts_with("http://") || domain.starts_with("https://") {
            domain.to_string()
        } else {
            format!("https://{domain}")
        }
    }

    /// Returns the sub-configuration object for `protocol`.
    #[must_use]
    pub fn protocol_config(&self, protocol: ProtocolId) -> Option<&Value> {
        self.protocol_config.get(&protocol.to_string())
    }

    /// Returns a string option from the protocol sub-configuration.
    #[must_use]
    pub fn protocol_str(&self, protocol: ProtocolId, key: &str) -> Option<&str> {
        self.protocol_config(protocol)
            .and_then(|section| section.get(key))
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// Returns a boolean option, false when absent or not a boolean.
    #[must_use]
    pub fn protocol_flag(&self, protocol: ProtocolId, key: &str) -> bool {
        self.protocol_config(protocol)
            .and_then(|section| section.get(key))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Returns true when `protocol` was selected.
    #[must_use]
    pub fn has_protocol(&self, protocol: ProtocolId) -> bool {
        self.protocols.contains(&protocol)
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Serde default for the request timeout.
const fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use serde_json::json;

    use super::HarnessConfig;
    use super::HarnessConfigError;
    use crate::core::identifiers::ProtocolId;

    #[test]
    fn validate_rejects_structural_misconfiguration() {
        let empty = HarnessConfig::new("  ", vec![ProtocolId::new(1).unwrap()]);
        assert_eq!(empty.validate(), Err(HarnessConfigError::EmptyDomain));

        let none = HarnessConfig::new("anchor.example", Vec::new());
        assert_eq!(none.validate(), Err(HarnessConfigError::NoProtocols));

        let zero: Result<HarnessConfig, _> =
            serde_json::from_value(json!({"domain": "anchor.example", "protocols": [0]}));
        assert!(zero.is_err());

        let mut slow = HarnessConfig::new("anchor.example", vec![ProtocolId::new(1).unwrap()]);
        slow.request_timeout_ms = 0;
        assert_eq!(slow.validate(), Err(HarnessConfigError::InvalidTimeout));
    }

    #[test]
    fn home_url_defaults_to_https() {
        let config = HarnessConfig::new("anchor.example/", vec![ProtocolId::new(1).unwrap()]);
        assert_eq!(config.home_url(), "https://anchor.example");
        let local = HarnessConfig::new("http://127.0.0.1:8000", vec![ProtocolId::new(1).unwrap()]);
        assert_eq!(local.home_url(), "http://127.0.0.1:8000");
        assert!(local.validate().is_ok());
    }

    #[test]
    fn protocol_options_are_read_leniently() {
        let mut config = HarnessConfig::new("anchor.example", vec![ProtocolId::new(6).unwrap()]);
        config.protocol_config.insert(
            "6".to_string(),
            json!({"authentication_required": true, "auth_token": "", "account": 7}),
        );
        let transfer = ProtocolId::new(6).unwrap();
        assert!(config.protocol_flag(transfer, "authentication_required"));
        assert!(!config.protocol_flag(transfer, "missing"));
        assert_eq!(config.protocol_str(transfer, "auth_token"), None);
        assert_eq!(config.protocol_str(transfer, "account"), None);
        assert!(config.protocol_config(ProtocolId::new(10).unwrap()).is_none());
    }

    #[test]
    fn deserializes_with_defaults_and_unknown_fields() {
        let config: HarnessConfig = serde_json::from_value(json!({
            "domain": "anchor.example",
            "protocols": [1, 6],
            "future_option": true
        }))
        .unwrap();
        assert_eq!(config.request_timeout_ms, super::DEFAULT_REQUEST_TIMEOUT_MS);
        assert!(config.has_protocol(ProtocolId::new(6).unwrap()));
        assert!(config.asset_code.is_none());
    }
}
