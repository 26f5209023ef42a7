//! PostgreSQL source adapter.
//!
//! PostgreSQL reports exact wire types, so the scan strategy maps directly
//! from the declared type name. Narrow integer and float widths decode
//! through a widening cascade; timestamps with a zone collapse to their
//! UTC calendar value before normalization.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use futures::TryStreamExt;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Executor, Row, TypeInfo};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use privgate_core::{
    ColumnDesc, DatabaseType, PrivGateError, RawRow, RawValue, Result, ScanKind,
    redact_database_url,
};

use super::SourceAdapter;

/// Adapter over a PostgreSQL connection pool.
pub struct PostgresSource {
    pool: PgPool,
}

impl PostgresSource {
    /// Connects to a PostgreSQL database.
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await
            .map_err(|e| {
                PrivGateError::connection_failed(redact_database_url(connection_string), e)
            })?;
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps a PostgreSQL type name to its scan strategy.
fn scan_kind(type_name: &str) -> ScanKind {
    match type_name {
        "INT2" | "INT4" | "INT8" => ScanKind::Int,
        "FLOAT4" | "FLOAT8" => ScanKind::Float,
        "BOOL" => ScanKind::Bool,
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => ScanKind::Text,
        "TIMESTAMP" | "TIMESTAMPTZ" => ScanKind::Timestamp,
        "BYTEA" => ScanKind::Bytes,
        _ => ScanKind::Other,
    }
}

/// Scans one field under the column's strategy.
fn scan_value(row: &PgRow, index: usize, kind: ScanKind) -> RawValue {
    match kind {
        ScanKind::Int | ScanKind::Uint => {
            if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
                return v.map_or(RawValue::Null, RawValue::Int);
            }
            if let Ok(v) = row.try_get::<Option<i32>, _>(index) {
                return v.map_or(RawValue::Null, |v| RawValue::Int(i64::from(v)));
            }
            match row.try_get::<Option<i16>, _>(index) {
                Ok(v) => v.map_or(RawValue::Null, |v| RawValue::Int(i64::from(v))),
                Err(_) => RawValue::Other,
            }
        }
        ScanKind::Float => {
            if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
                return v.map_or(RawValue::Null, RawValue::Float);
            }
            match row.try_get::<Option<f32>, _>(index) {
                Ok(v) => v.map_or(RawValue::Null, |v| RawValue::Float(f64::from(v))),
                Err(_) => RawValue::Other,
            }
        }
        ScanKind::Bool => match row.try_get::<Option<bool>, _>(index) {
            Ok(v) => v.map_or(RawValue::Null, RawValue::Bool),
            Err(_) => RawValue::Other,
        },
        ScanKind::Text => match row.try_get::<Option<String>, _>(index) {
            Ok(v) => v.map_or(RawValue::Null, RawValue::Text),
            Err(_) => RawValue::Other,
        },
        ScanKind::Timestamp => {
            if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(index) {
                return v.map_or(RawValue::Null, RawValue::Timestamp);
            }
            match row.try_get::<Option<DateTime<Utc>>, _>(index) {
                Ok(v) => v.map_or(RawValue::Null, |v| RawValue::Timestamp(v.naive_utc())),
                Err(_) => RawValue::Other,
            }
        }
        ScanKind::Bytes => match row.try_get::<Option<Vec<u8>>, _>(index) {
            Ok(v) => v.map_or(RawValue::Null, RawValue::Bytes),
            Err(_) => RawValue::Other,
        },
        ScanKind::Other => RawValue::Other,
    }
}

#[async_trait]
impl SourceAdapter for PostgresSource {
    async fn test_connection(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PrivGateError::connection_failed("PostgreSQL liveness probe", e))?;
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
                        break;
                    }
                    count += 1;
                }
                Ok(None) => break,
                Err(e) => return Err(PrivGateError::query_failed("advancing export cursor", e)),
            }
        }
        tracing::debug!("PostgreSQL export streamed {} rows", count);
        Ok(count)
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::PostgreSQL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_kind_mapping() {
        assert_eq!(scan_kind("INT2"), ScanKind::Int);
        assert_eq!(scan_kind("INT8"), ScanKind::Int);
        assert_eq!(scan_kind("FLOAT4"), ScanKind::Float);
        assert_eq!(scan_kind("BOOL"), ScanKind::Bool);
        assert_eq!(scan_kind("VARCHAR"), ScanKind::Text);
        assert_eq!(scan_kind("TIMESTAMPTZ"), ScanKind::Timestamp);
        assert_eq!(scan_kind("BYTEA"), ScanKind::Bytes);
        assert_eq!(scan_kind("NUMERIC"), ScanKind::Other);
        assert_eq!(scan_kind("UUID"), ScanKind::Other);
    }
}
