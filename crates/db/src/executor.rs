use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row};
use tracing::warn;

use licibot_core::domain::query::{ExecutionError, QueryExecutor, QueryResult};

use crate::DbPool;

/// `QueryExecutor` implementation bound to a request-scoped pool. Collects
/// at most `max_rows` rows and flags truncation; both the fetch and the
/// decode run under one deadline so a slow statement degrades instead of
/// hanging the caller.
#[derive(Clone)]
pub struct PoolQueryExecutor {
    pool: DbPool,
    max_rows: usize,
    timeout: Duration,
}

impl PoolQueryExecutor {
    pub fn new(pool: DbPool, max_rows: usize, timeout_secs: u64) -> Self {
        Self { pool, max_rows: max_rows.max(1), timeout: Duration::from_secs(timeout_secs.max(1)) }
    }
}

#[async_trait]
impl QueryExecutor for PoolQueryExecutor {
    async fn execute(&self, sql: &str) -> Result<QueryResult, ExecutionError> {
        let timeout_secs = self.timeout.as_secs();
        let fetched = tokio::time::timeout(self.timeout, sqlx::query(sql).fetch_all(&self.pool))
            .await
            .map_err(|_| ExecutionError::Timeout { timeout_secs })?;

        let rows = match fetched {
            Ok(rows) => rows,
            Err(error) => {
                warn!(
                    event_name = "assistant.executor.query_failed",
                    sql = %redact_sql(sql),
                    error = %error,
                    "query execution failed"
                );
                return Err(ExecutionError::Query(error.to_string()));
            }
        };

        let truncated = rows.len() > self.max_rows;
        let kept = if truncated { &rows[..self.max_rows] } else { &rows[..] };

        let columns = kept
            .first()
            .map(|row| row.columns().iter().map(|col| col.name().to_string()).collect::<Vec<_>>())
            .unwrap_or_default();

        let mut decoded = Vec::with_capacity(kept.len());
        for row in kept {
            decoded.push(decode_row(row, columns.len())?);
        }

        Ok(QueryResult { row_count: decoded.len(), columns, rows: decoded, truncated })
    }
}

fn decode_row(row: &SqliteRow, width: usize) -> Result<Vec<Value>, ExecutionError> {
    let mut cells = Vec::with_capacity(width);
    for index in 0..width {
        cells.push(decode_cell(row, index)?);
    }
    Ok(cells)
}

/// SQLite is dynamically typed per cell, so try the storage classes in
/// order instead of trusting the declared column type.
fn decode_cell(row: &SqliteRow, index: usize) -> Result<Value, ExecutionError> {
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return Ok(value.map(Value::from).unwrap_or(Value::Null));
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
        return Ok(value.map(Value::from).unwrap_or(Value::Null));
    }
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return Ok(value.map(Value::from).unwrap_or(Value::Null));
    }

    let column = row.columns().get(index).map(|col| col.name().to_string()).unwrap_or_default();
    Err(ExecutionError::Decode(format!("unsupported value in column `{column}`")))
}

/// Strip string-literal contents before the SQL reaches a log line.
fn redact_sql(sql: &str) -> String {
    let mut output = String::with_capacity(sql.len());
    let mut in_string = false;

    for ch in sql.chars() {
        if ch == '\'' {
            if in_string {
                output.push_str("…'");
            } else {
                output.push('\'');
            }
            in_string = !in_string;
            continue;
        }
        if !in_string {
            output.push(ch);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use licibot_core::domain::query::{ExecutionError, QueryExecutor};
    use serde_json::json;

    use crate::connection::connect_with_settings;
    use crate::ddl;
    use crate::DbPool;

    use super::{redact_sql, PoolQueryExecutor};

    async fn seeded_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
        ddl::create_all(&pool).await.expect("schema");
        for n in 0..12 {
            sqlx::query(
                "INSERT INTO licitaciones_cabecera \
                 (nomenclatura, entidad, descripcion, region, tipo_proceso, estado, \
                  monto_referencial, anio) \
                 VALUES (?, 'GOBIERNO REGIONAL', 'obra vial', 'LIMA', 'LICITACION PUBLICA', \
                         'CONVOCADO', ?, 2024)",
            )
            .bind(format!("LP-{n:03}-2024"))
            .bind(10_000.0 * f64::from(n + 1))
            .execute(&pool)
            .await
            .expect("insert");
        }
        pool
    }

    #[tokio::test]
    async fn executes_select_and_decodes_mixed_types() {
        let pool = seeded_pool().await;
        let executor = PoolQueryExecutor::new(pool.clone(), 100, 5);

        let result = executor
            .execute(
                "SELECT nomenclatura, monto_referencial, anio \
                 FROM licitaciones_cabecera ORDER BY id LIMIT 3",
            )
            .await
            .expect("execute");

        assert_eq!(result.row_count, 3);
        assert!(!result.truncated);
        assert_eq!(result.columns, vec!["nomenclatura", "monto_referencial", "anio"]);
        assert_eq!(result.rows[0][0], json!("LP-000-2024"));
        assert_eq!(result.rows[0][1], json!(10_000.0));
        assert_eq!(result.rows[0][2], json!(2024));

        pool.close().await;
    }

    #[tokio::test]
    async fn truncates_at_row_cap_and_flags_it() {
        let pool = seeded_pool().await;
        let executor = PoolQueryExecutor::new(pool.clone(), 5, 5);

        let result = executor
            .execute("SELECT nomenclatura FROM licitaciones_cabecera LIMIT 500")
            .await
            .expect("execute");

        assert_eq!(result.row_count, 5);
        assert!(result.truncated);

        pool.close().await;
    }

    #[tokio::test]
    async fn empty_result_is_not_an_error() {
        let pool = seeded_pool().await;
        let executor = PoolQueryExecutor::new(pool.clone(), 100, 5);

        let result = executor
            .execute("SELECT nomenclatura FROM licitaciones_cabecera WHERE region = 'TACNA'")
            .await
            .expect("execute");

        assert_eq!(result.row_count, 0);
        assert!(result.is_empty());
        assert!(!result.truncated);

        pool.close().await;
    }

    #[tokio::test]
    async fn malformed_sql_surfaces_as_query_failure() {
        let pool = seeded_pool().await;
        let executor = PoolQueryExecutor::new(pool.clone(), 100, 5);

        let error = executor
            .execute("SELECT contrasena FROM licitaciones_cabecera")
            .await
            .expect_err("should fail");

        assert!(matches!(error, ExecutionError::Query(_)));

        pool.close().await;
    }

    #[test]
    fn redaction_strips_string_literal_contents() {
        let redacted =
            redact_sql("SELECT * FROM licitaciones_cabecera WHERE region = 'LIMA' AND x = 'a;b'");
        assert!(!redacted.contains("LIMA"));
        assert!(!redacted.contains("a;b"));
        assert!(redacted.contains("region = '…'"));
    }
}
