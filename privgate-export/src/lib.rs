//! Streaming de-identification export engine for PrivGate.
//!
//! This crate implements the gateway's export path: rows are drawn from an
//! upstream source, every field is rewritten by a per-column anonymization
//! policy, the redacted rows stream out as CSV, and the k-anonymity of the
//! emitted set is evaluated in line.
//!
//! # Architecture
//! - [`sources`]: object-safe adapters over the supported source engines
//! - [`pipeline`]: the four-stage bounded-queue pipeline and its coordinator
//! - [`anonymize`]: the per-column function library compiled per request
//! - [`kanon`]: the incremental k-anonymity tester
//! - [`csv`] / [`sink`]: wire encoding and the response sink abstraction
//!
//! # Security Guarantees
//! - All per-request state dies with the request; exports share nothing
//! - Source credentials never appear in errors or logs
//! - Bounded queues cap memory at O(queue capacity) rows per export

pub mod anonymize;
pub mod csv;
pub mod kanon;
pub mod pipeline;
pub mod sink;
pub mod sources;

// Re-export commonly used types
pub use anonymize::{FieldFn, compile_function_table};
pub use kanon::AnonymityTester;
pub use pipeline::export_stream;
pub use sink::{BufferSink, ChannelSink, ExportSink, apply_export_headers};
pub use sources::{SourceAdapter, SourceRegistry, create_adapter, detect_database_type};
