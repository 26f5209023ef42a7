//! Per-column de-identification policy model.
//!
//! The gateway catalog stores each API's policy as JSON text keyed by column
//! name. [`parse_policy_map`] decodes that text; the option record keeps the
//! stored field names so existing policies load unchanged. Option values are
//! deliberately loose (strings for the numeric parameters): a malformed
//! parameter must not fail the export, it degrades the affected column to an
//! in-band error constant when the function table is compiled.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{PrivGateError, Result};

/// Anonymization method selector for one column.
///
/// Unrecognized method strings deserialize to `Unknown`, which compiles to
/// the drop-to-empty function rather than rejecting the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnonymizeMethod {
    Encryption,
    Rounding,
    DataRange,
    BlankImpute,
    PiiReduction,
    Non,
    #[serde(other)]
    Unknown,
}

/// Union of the per-method option parameters.
///
/// Field names match the stored JSON. Every method reads only its own
/// fields; the rest stay at their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymizeOptions {
    /// Masker: leading characters to keep
    #[serde(default)]
    pub fore: String,
    /// Masker: trailing characters to keep
    #[serde(default)]
    pub aft: String,
    /// Masker: fill string for the masked span
    #[serde(default, rename = "maskChar")]
    pub mask_char: String,
    /// Masker: keep the original length or collapse the span
    #[serde(default, rename = "keepLength")]
    pub keep_length: String,
    /// Encryptor / Rounder: algorithm selector
    #[serde(default)]
    pub algorithm: String,
    /// Rounder: decimal position, sign selects the side of the point
    #[serde(default)]
    pub position: i32,
    /// Encryptor: HMAC key
    #[serde(default)]
    pub key: String,
    /// Encryptor: HMAC digest selector
    #[serde(default)]
    pub digest: String,
    /// Ranger: inclusive lower bound
    #[serde(default)]
    pub lower: String,
    /// Ranger: upper bound
    #[serde(default)]
    pub upper: String,
    /// Ranger: bin count
    #[serde(default)]
    pub bin: String,
}

/// Policy entry for one column: method, its options, and the privacy level
/// that decides whether the column participates in k-anonymity evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPolicy {
    pub method: AnonymizeMethod,
    #[serde(default)]
    pub options: AnonymizeOptions,
    #[serde(default)]
    pub level: i32,
}

/// Mapping from column name to its policy entry.
pub type PolicyMap = HashMap<String, ColumnPolicy>;

/// Decodes the policy JSON stored by the catalog into a [`PolicyMap`].
///
/// Empty or whitespace-only text yields an empty map (no column is
/// anonymized and the evaluator stays disabled).
///
/// # Errors
/// Returns a policy error when the text is present but not valid JSON for
/// the expected shape.
pub fn parse_policy_map(raw: &str) -> Result<PolicyMap> {
    if raw.trim().is_empty() {
        return Ok(PolicyMap::new());
    }
    serde_json::from_str(raw)
        .map_err(|e| PrivGateError::policy_invalid("stored de-identification options", e))
}

/// True when at least one column's policy requests k-anonymity evaluation.
///
/// An empty policy map, or one where every level is zero, disables the
/// evaluator regardless of map iteration order.
pub fn evaluation_enabled(policy: &PolicyMap) -> bool {
    policy.values().any(|p| p.level > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_policy() {
        assert!(parse_policy_map("").unwrap().is_empty());
        assert!(parse_policy_map("   ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_policy_map() {
        let raw = r#"{
            "name": {
                "method": "pii_reduction",
                "options": {"fore": "1", "aft": "1", "maskChar": "*", "keepLength": "false"},
                "level": 1
            },
            "salary": {
                "method": "rounding",
                "options": {"algorithm": "round", "position": -2},
                "level": 0
            }
        }"#;

        let policy = parse_policy_map(raw).unwrap();
        assert_eq!(policy.len(), 2);

        let name = &policy["name"];
        assert_eq!(name.method, AnonymizeMethod::PiiReduction);
        assert_eq!(name.options.mask_char, "*");
        assert_eq!(name.level, 1);

        let salary = &policy["salary"];
        assert_eq!(salary.method, AnonymizeMethod::Rounding);
        assert_eq!(salary.options.position, -2);
    }

    #[test]
    fn test_unknown_method_is_tolerated() {
        let raw = r#"{"ssn": {"method": "quantum_blur", "level": 2}}"#;
        let policy = parse_policy_map(raw).unwrap();
        assert_eq!(policy["ssn"].method, AnonymizeMethod::Unknown);
        assert_eq!(policy["ssn"].level, 2);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(parse_policy_map("{not json").is_err());
    }

    #[test]
    fn test_evaluation_enabled() {
        let mut policy = PolicyMap::new();
        assert!(!evaluation_enabled(&policy));

        policy.insert(
            "a".to_string(),
            ColumnPolicy {
                method: AnonymizeMethod::Non,
                options: AnonymizeOptions::default(),
                level: 0,
            },
        );
        assert!(!evaluation_enabled(&policy));

        policy.insert(
            "b".to_string(),
            ColumnPolicy {
                method: AnonymizeMethod::Encryption,
                options: AnonymizeOptions::default(),
                level: 1,
            },
        );
        assert!(evaluation_enabled(&policy));
    }
}
