use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Where a candidate statement came from. The two origins differ in data
/// and trust level, not behavior, so downstream stages match on the tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryOrigin {
    Template,
    Llm,
}

/// A SQL statement produced for one request, discarded after validation
/// and execution. Template builders record the slot values they inlined
/// so logs can show how the statement was assembled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateQuery {
    pub sql: String,
    pub origin: QueryOrigin,
    pub bindings: Vec<(&'static str, String)>,
}

impl CandidateQuery {
    pub fn from_template(sql: impl Into<String>, bindings: Vec<(&'static str, String)>) -> Self {
        Self { sql: sql.into(), origin: QueryOrigin::Template, bindings }
    }

    pub fn from_llm(sql: impl Into<String>) -> Self {
        Self { sql: sql.into(), origin: QueryOrigin::Llm, bindings: Vec::new() }
    }
}

/// Result set bounded by the executor's row cap.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub row_count: usize,
    pub truncated: bool,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Single-cell aggregate value, when the result is shaped like one.
    pub fn scalar(&self) -> Option<&Value> {
        match self.rows.as_slice() {
            [row] if row.len() == 1 => row.first(),
            _ => None,
        }
    }

    /// Rows as `{column: value}` objects for the wire payload.
    pub fn row_objects(&self) -> Vec<serde_json::Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect::<serde_json::Map<String, Value>>()
            })
            .collect()
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("query timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
    #[error("query failed: {0}")]
    Query(String),
    #[error("result decoding failed: {0}")]
    Decode(String),
}

/// Port implemented by the database layer. One executor per request-scoped
/// session; the assistant never owns pooling or schema migration.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<QueryResult, ExecutionError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::QueryResult;

    #[test]
    fn scalar_requires_single_cell() {
        let single = QueryResult {
            columns: vec!["total".to_string()],
            rows: vec![vec![json!(42)]],
            row_count: 1,
            truncated: false,
        };
        assert_eq!(single.scalar(), Some(&json!(42)));

        let wide = QueryResult {
            columns: vec!["a".to_string(), "b".to_string()],
            rows: vec![vec![json!(1), json!(2)]],
            row_count: 1,
            truncated: false,
        };
        assert_eq!(wide.scalar(), None);
    }

    #[test]
    fn row_objects_pair_columns_with_values() {
        let result = QueryResult {
            columns: vec!["region".to_string(), "total".to_string()],
            rows: vec![vec![json!("LIMA"), json!(7)]],
            row_count: 1,
            truncated: false,
        };

        let objects = result.row_objects();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].get("region"), Some(&json!("LIMA")));
        assert_eq!(objects[0].get("total"), Some(&json!(7)));
    }
}
