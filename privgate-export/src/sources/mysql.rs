//! MySQL source adapter.
//!
//! MySQL is the one supported engine with unsigned integer columns, so its
//! type mapping distinguishes the unsigned widths. TIMESTAMP columns decode
//! through UTC and collapse to their calendar value; DATETIME decodes
//! directly.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use futures::TryStreamExt;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Executor, Row, TypeInfo};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use privgate_core::{
    ColumnDesc, DatabaseType, PrivGateError, RawRow, RawValue, Result, ScanKind,
    redact_database_url,
};

use super::SourceAdapter;

/// Adapter over a MySQL connection pool.
pub struct MySqlSource {
    pool: MySqlPool,
}

impl MySqlSource {
    /// Connects to a MySQL database.
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await
            .map_err(|e| {
                PrivGateError::connection_failed(redact_database_url(connection_string), e)
            })?;
        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// Maps a MySQL type name to its scan strategy.
fn scan_kind(type_name: &str) -> ScanKind {
    let upper = type_name.to_ascii_uppercase();
    if upper.contains("UNSIGNED") {
        return ScanKind::Uint;
    }
    match upper.as_str() {
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => ScanKind::Int,
        "FLOAT" | "DOUBLE" => ScanKind::Float,
        "BOOLEAN" => ScanKind::Bool,
        "CHAR" | "VARCHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" => {
            ScanKind::Text
        }
        "DATETIME" | "TIMESTAMP" => ScanKind::Timestamp,
        "DATE" | "TIME" => ScanKind::Text,
        "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
            ScanKind::Bytes
        }
        _ => ScanKind::Other,
    }
}

/// Scans one field under the column's strategy.
fn scan_value(row: &MySqlRow, index: usize, kind: ScanKind) -> RawValue {
    match kind {
        ScanKind::Int => match row.try_get::<Option<i64>, _>(index) {
            Ok(v) => v.map_or(RawValue::Null, RawValue::Int),
            Err(_) => RawValue::Other,
        },
        ScanKind::Uint => match row.try_get::<Option<u64>, _>(index) {
            Ok(v) => v.map_or(RawValue::Null, RawValue::Uint),
            Err(_) => RawValue::Other,
        },
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
impl SourceAdapter for MySqlSource {
    async fn test_connection(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PrivGateError::connection_failed("MySQL liveness probe", e))?;
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
        tracing::debug!("MySQL export streamed {} rows", count);
        Ok(count)
    }

    fn database_type(&self) -> DatabaseType {
        DatabaseType::MySQL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_kind_mapping() {
        assert_eq!(scan_kind("BIGINT"), ScanKind::Int);
        assert_eq!(scan_kind("BIGINT UNSIGNED"), ScanKind::Uint);
        assert_eq!(scan_kind("INT UNSIGNED"), ScanKind::Uint);
        assert_eq!(scan_kind("DOUBLE"), ScanKind::Float);
        assert_eq!(scan_kind("BOOLEAN"), ScanKind::Bool);
        assert_eq!(scan_kind("VARCHAR"), ScanKind::Text);
        assert_eq!(scan_kind("DATETIME"), ScanKind::Timestamp);
        assert_eq!(scan_kind("VARBINARY"), ScanKind::Bytes);
        assert_eq!(scan_kind("DECIMAL"), ScanKind::Other);
    }
}
