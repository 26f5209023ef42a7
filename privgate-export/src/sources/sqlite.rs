//! SQLite source adapter.
//!
//! SQLite declares column affinities rather than strict types, so the scan
//! strategy comes from the declared type name with per-value fallbacks: a
//! value that does not decode under its column's strategy degrades to the
//! opaque holder instead of failing the export.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use futures::TryStreamExt;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Executor, Row, TypeInfo};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use privgate_core::{
    ColumnDesc, DatabaseType, PrivGateError, RawRow, RawValue, Result, ScanKind,
    redact_database_url,
};

use super::SourceAdapter;

/// Adapter over a SQLite connection pool.
pub struct SqliteSource {
    pool: SqlitePool,
}

impl SqliteSource {
    /// Connects to a SQLite database.
    ///
    /// In-memory databases are pinned to a single connection so every
    /// statement sees the same database.
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let max_connections = if connection_string.contains(":memory:") {
            1
        } else {
            5
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(connection_string)
            .await
            .map_err(|e| {
                PrivGateError::connection_failed(redact_database_url(connection_string), e)
            })?;
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Maps a declared SQLite type name to its scan strategy.
fn scan_kind(type_name: &str) -> ScanKind {
    match type_name.to_ascii_uppercase().as_str() {
        "INTEGER" | "INT" | "INT4" | "INT8" | "BIGINT" | "SMALLINT" | "TINYINT" => ScanKind::Int,
        "REAL" | "DOUBLE" | "FLOAT" | "NUMERIC" => ScanKind::Float,
        "BOOLEAN" => ScanKind::Bool,
        "TEXT" | "VARCHAR" | "CHAR" | "CLOB" | "NVARCHAR" => ScanKind::Text,
        "DATETIME" | "TIMESTAMP" => ScanKind::Timestamp,
        "DATE" | "TIME" => ScanKind::Text,
        "BLOB" => ScanKind::Bytes,
        // Untyped expression column: treat as string
        "NULL" => ScanKind::Text,
        _ => ScanKind::Other,
    }
}

/// Scans one field under the column's strategy.
fn scan_value(row: &SqliteRow, index: usize, kind: ScanKind) -> RawValue {
    match kind {
        ScanKind::Int | ScanKind::Uint => match row.try_get::<Option<i64>, _>(index) {
            Ok(Some(v)) => RawValue::Int(v),
            Ok(None) => RawValue::Null,
            Err(_) => RawValue::Other,
        },
        ScanKind::Float => match row.try_get::<Option<f64>, _>(index) {
            Ok(Some(v)) => RawValue::Float(v),
            Ok(None) => RawValue::Null,
            // Integer storage inside a REAL-affinity column
            Err(_) => match row.try_get::<Option<i64>, _>(index) {
                Ok(Some(v)) => RawValue::Float(v as f64),
                Ok(None) => RawValue::Null,
                Err(_) => RawValue::Other,
            },
        },
        ScanKind::Bool => match row.try_get::<Option<bool>, _>(index) {
            Ok(Some(v)) => RawValue::Bool(v),
            Ok(None) => RawValue::Null,
            Err(_) => RawValue::Other,
        },
        ScanKind::Text => match row.try_get::<Option<String>, _>(index) {
            Ok(Some(v)) => RawValue::Text(v),
            Ok(None) => RawValue::Null,
            Err(_) => RawValue::Other,
        },
        ScanKind::Timestamp => match row.try_get::<Option<NaiveDateTime>, _>(index) {
            Ok(Some(v)) => RawValue::Timestamp(v),
            Ok(None) => RawValue::Null,
            // Free-form datetime text that chrono cannot parse
            Err(_) => match row.try_get::<Option<String>, _>(index) {
                Ok(Some(v)) => RawValue::Text(v),
                Ok(None) => RawValue::Null,
                Err(_) => RawValue::Other,
            },
        },
        ScanKind::Bytes => match row.try_get::<Option<Vec<u8>>, _>(index) {
            Ok(Some(v)) => RawValue::Bytes(v),
            Ok(None) => RawValue::Null,
            Err(_) => RawValue::Other,
        },
        ScanKind::Other => RawValue::Other,
    }
}

#[async_trait]
impl SourceAdapter for SqliteSource {
    async fn test_connection(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PrivGateError::connection_failed("SQLite liveness probe", e))?;
        Ok(())
    }

    async fn describe_columns(&self, sql: &str) -> Result<Vec<ColumnDesc>> {
        let describe = self
            .pool
            .describe(sql)
            .await
            .map_err(|e| PrivGateError::query_failed("describing export query", e))?;

        Ok(describe
            .columns()
            .iter()
            .map(|column| ColumnDesc::new(column.name(), scan_kind(column.type_info().name())))
            .collect())
    }

    async fn stream_rows(
        &self,
        sql: &str,
        params: &[String],
        schema: &[ColumnDesc],
        tx: mpsc::Sender<RawRow>,
        cancel: CancellationToken,
    ) -> Result<u64> {
        let mut query = sqlx::query(sql);
        for param in params {
            query = query.bind(param.as_str());
        }

        let mut rows = query.fetch(&self.pool);
        let mut count = 0u64;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(PrivGateError::cancelled("export query cancelled"));
                }
                next = rows.try_next() => next,
            };
            match next {
                Ok(Some(row)) => {
                    let raw: RawRow = schema
                        .iter()
                        .enumerate()
                        .map(|(index, column)| scan_value(&row, index, column.scan))
                        .collect();
                    if tx.send(raw).await.is_err() {
                        // Downstream is gone; nothing left to produce for
                        break;
                    }
                    count += 1;
                }
                Ok(None) => break,
                Err(e) => return Err(PrivGateError::query_failed("advancing export cursor", e)),
            }
        }
        tracing::debug!("SQLite export streamed {} rows", count);
        Ok(count)
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::SQLite
    }
}
