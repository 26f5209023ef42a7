//! Shared foundation for the PrivGate de-identification gateway.
//!
//! This crate provides the types shared between the gateway layer and the
//! export engine: the per-column anonymization policy model, the column
//! schema and scalar holders that flow through the pipeline, the error
//! taxonomy, and the export configuration.
//!
//! # Security Guarantees
//! - Connection strings are sanitized before appearing in errors or logs
//! - Malformed policy parameters degrade a single column, never the export
//! - No process-wide mutable state; everything is passed by parameter

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod policy;

// Re-export commonly used types
pub use config::ExportConfig;
pub use error::{PrivGateError, Result, redact_database_url};
pub use models::{ColumnDesc, DatabaseType, Evaluation, RawRow, RawValue, ScanKind};
pub use policy::{
    AnonymizeMethod, AnonymizeOptions, ColumnPolicy, PolicyMap, evaluation_enabled,
    parse_policy_map,
};
