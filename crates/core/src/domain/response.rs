use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::query::QueryResult;

/// The sole externally visible output of `process_message`. Serializes as
/// `{"response": ..., "has_data": ..., "data": {"sql", "results"} | null}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssistantResponse {
    #[serde(rename = "response")]
    pub text: String,
    pub has_data: bool,
    pub data: Option<ResponseData>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
    pub sql: String,
    pub results: Vec<Map<String, Value>>,
}

impl AssistantResponse {
    /// Conversational answer with no backing query.
    pub fn conversational(text: impl Into<String>) -> Self {
        Self { text: text.into(), has_data: false, data: None }
    }

    pub fn with_data(text: impl Into<String>, sql: impl Into<String>, result: &QueryResult) -> Self {
        Self {
            text: text.into(),
            has_data: true,
            data: Some(ResponseData { sql: sql.into(), results: result.row_objects() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::domain::query::QueryResult;

    use super::AssistantResponse;

    #[test]
    fn conversational_serializes_with_null_data() {
        let response = AssistantResponse::conversational("Hola, soy el asistente de SEACE.");
        let value = serde_json::to_value(&response).expect("serialize");

        assert_eq!(value["response"], json!("Hola, soy el asistente de SEACE."));
        assert_eq!(value["has_data"], json!(false));
        assert_eq!(value["data"], json!(null));
    }

    #[test]
    fn data_payload_carries_sql_and_row_objects() {
        let result = QueryResult {
            columns: vec!["total".to_string()],
            rows: vec![vec![json!(12)]],
            row_count: 1,
            truncated: false,
        };
        let response = AssistantResponse::with_data(
            "Se encontraron 12 licitaciones en LIMA.",
            "SELECT COUNT(*) AS total FROM licitaciones_cabecera WHERE region = 'LIMA' LIMIT 100",
            &result,
        );

        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(value["has_data"], json!(true));
        assert!(value["data"]["sql"].as_str().unwrap_or_default().contains("region = 'LIMA'"));
        assert_eq!(value["data"]["results"][0]["total"], json!(12));
    }
}
