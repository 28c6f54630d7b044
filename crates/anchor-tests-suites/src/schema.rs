// crates/anchor-tests-suites/src/schema.rs
// ============================================================================
// Module: Response Schemas
// Description: JSON Schemas for anchor responses and a validation helper.
// Purpose: Validate response documents with Draft 2020-12 schemas.
// Dependencies: jsonschema, serde_json
// ============================================================================

//! ## Overview
//! Schemas are plain [`Value`] documents compiled on demand. Validation
//! collects every error so a single failure can report all violations.

// ============================================================================
// SECTION: Imports
// ============================================================================

use jsonschema::Draft;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Schemas
// ============================================================================

/// Schema for one asset entry of a `/info` operation section.
fn asset_entry_schema() -> Value {
    json!({
        "type": "object",
        "required": ["enabled"],
        "properties": {
            "enabled": { "type": "boolean" },
            "authentication_required": { "type": "boolean" },
            "fee_fixed": { "type": "number", "minimum": 0 },
            "fee_percent": { "type": "number", "minimum": 0 },
            "min_amount": { "type": "number", "minimum": 0 },
            "max_amount": { "type": "number", "minimum": 0 },
            "fields": { "type": "object" }
        }
    })
}

/// Schema for an optional endpoint flag section such as `fee`.
fn endpoint_flag_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "enabled": { "type": "boolean" },
            "authentication_required": { "type": "boolean" }
        }
    })
}

/// Returns the schema of a transfer server `/info` response.
#[must_use]
pub fn info_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "type": "object",
        "required": ["deposit", "withdraw"],
        "properties": {
            "deposit": { "type": "object", "additionalProperties": asset_entry_schema() },
            "withdraw": { "type": "object", "additionalProperties": asset_entry_schema() },
            "fee": endpoint_flag_schema(),
            "transaction": endpoint_flag_schema(),
            "transactions": endpoint_flag_schema()
        }
    })
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates `instance` against `schema`, returning every violation.
///
/// # Errors
///
/// Returns an error message when `schema` itself does not compile.
pub fn violations(schema: &Value, instance: &Value) -> Result<Vec<String>, String> {
    let validator = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(schema)
        .map_err(|err| format!("failed to compile schema: {err}"))?;
    Ok(validator.iter_errors(instance).map(|err| err.to_string()).collect())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions are permitted.")]

    use serde_json::json;

    use super::info_schema;
    use super::violations;

    #[test]
    fn minimal_info_document_is_valid() {
        let info = json!({
            "deposit": { "USDC": { "enabled": true, "fee_fixed": 1.5 } },
            "withdraw": {}
        });
        assert!(violations(&info_schema(), &info).unwrap().is_empty());
    }

    #[test]
    fn every_violation_is_reported() {
        let info = json!({ "deposit": { "USDC": { "enabled": "yes" } } });
        let errors = violations(&info_schema(), &info).unwrap();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn invalid_schema_is_an_error() {
        let err = violations(&json!({ "type": 12 }), &json!({})).unwrap_err();
        assert!(err.starts_with("failed to compile schema"));
    }
}
