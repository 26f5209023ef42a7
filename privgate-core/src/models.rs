//! Core data models for the export pipeline.
//!
//! These types describe what flows between the pipeline stages: the column
//! schema extracted from the source cursor, the typed scalar holders scanned
//! from each row, and the k-anonymity evaluation record the export returns.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Supported source database engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatabaseType {
    PostgreSQL,
    MySQL,
    SQLite,
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseType::PostgreSQL => write!(f, "PostgreSQL"),
            DatabaseType::MySQL => write!(f, "MySQL"),
            DatabaseType::SQLite => write!(f, "SQLite"),
        }
    }
}

/// Scan strategy for one result column, decided once from the declared type.
///
/// The per-row cost of normalization is a direct branch on this value; the
/// engine-specific type-name lookup happens only when the schema is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanKind {
    /// Signed integer of any width
    Int,
    /// Unsigned integer of any width
    Uint,
    /// 32- or 64-bit float
    Float,
    Bool,
    Text,
    /// Date-and-time value, rendered without a timezone suffix
    Timestamp,
    /// Raw byte sequence, interpreted as UTF-8
    Bytes,
    /// Anything the normalizer has no string form for
    Other,
}

/// One column of the export result: name plus scan strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDesc {
    pub name: String,
    pub scan: ScanKind,
}

impl ColumnDesc {
    pub fn new(name: impl Into<String>, scan: ScanKind) -> Self {
        Self {
            name: name.into(),
            scan,
        }
    }
}

/// A scalar holder filled by the source driver for one field of one row.
///
/// `Null` marks an absent value (normalized as the empty string); `Other`
/// marks a declared type the pipeline cannot stringify.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Text(String),
    Timestamp(NaiveDateTime),
    Bytes(Vec<u8>),
    Null,
    Other,
}

/// One result row as scanned from the cursor, positionally aligned to the
/// column schema.
pub type RawRow = Vec<RawValue>;

/// K-anonymity evaluation result published when an export completes.
///
/// `result` is `"true"` or `"false"` when the evaluator ran, or the literal
/// `"none"` when no column requested evaluation; `value` is the smallest
/// equivalence-class frequency observed (0 for an empty or unevaluated
/// stream).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(rename = "apiName")]
    pub api_name: String,
    pub result: String,
    pub value: i64,
}

impl Evaluation {
    /// Evaluation for an export whose policy disabled the evaluator.
    pub fn none(api_name: impl Into<String>) -> Self {
        Self {
            api_name: api_name.into(),
            result: "none".to_string(),
            value: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_type_display() {
        assert_eq!(DatabaseType::PostgreSQL.to_string(), "PostgreSQL");
        assert_eq!(DatabaseType::MySQL.to_string(), "MySQL");
        assert_eq!(DatabaseType::SQLite.to_string(), "SQLite");
    }

    #[test]
    fn test_evaluation_none() {
        let eval = Evaluation::none("a_payroll");
        assert_eq!(eval.result, "none");
        assert_eq!(eval.value, 0);
    }

    #[test]
    fn test_evaluation_serde_field_names() {
        let eval = Evaluation {
            api_name: "a_payroll".to_string(),
            result: "true".to_string(),
            value: 3,
        };
        let json = serde_json::to_string(&eval).unwrap();
        assert!(json.contains("\"apiName\":\"a_payroll\""));
        assert!(json.contains("\"result\":\"true\""));
        assert!(json.contains("\"value\":3"));

        let back: Evaluation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, eval);
    }
}
