//! LLM-backed SQL generation, the fallback when no template matches. The
//! prompt is bounded: fixed system rules, the schema inventory (names
//! only), two worked examples, at most the configured window of prior
//! turns, and the question. The model's output is treated as one SQL
//! string; everything else about it is distrusted and re-checked by the
//! validator.

use std::sync::Arc;

use tracing::debug;

use licibot_core::domain::conversation::ConversationTurn;
use licibot_core::domain::query::CandidateQuery;

use crate::conversation::ContextWindow;
use crate::llm::{LlmClient, LlmError, Prompt};

/// Sentinel the model is told to emit when the question cannot be answered
/// with a query over the known schema.
pub const NO_QUERY_SENTINEL: &str = "NO_QUERY";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Generated {
    Query(CandidateQuery),
    /// The model judged the question non-answerable from the schema.
    Declined,
}

pub struct SqlGenerator {
    llm: Arc<dyn LlmClient>,
    schema_summary: String,
    window: ContextWindow,
}

impl SqlGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, schema_summary: String, window: ContextWindow) -> Self {
        Self { llm, schema_summary, window }
    }

    pub async fn generate(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<Generated, LlmError> {
        let prompt = self.build_prompt(question, history);
        let raw = self.llm.complete(&prompt).await?;
        let cleaned = strip_fences(&raw);

        if cleaned.eq_ignore_ascii_case(NO_QUERY_SENTINEL) {
            debug!(event_name = "assistant.generator.declined", "model declined to produce sql");
            return Ok(Generated::Declined);
        }

        Ok(Generated::Query(CandidateQuery::from_llm(cleaned)))
    }

    fn build_prompt(&self, question: &str, history: &[ConversationTurn]) -> Prompt {
        let system = format!(
            "Eres un traductor de preguntas en español a SQL (dialecto SQLite) sobre la base \
             de datos de contrataciones públicas del Perú.\n\
             Reglas estrictas:\n\
             - Genera exactamente UNA sentencia SELECT de solo lectura.\n\
             - Usa únicamente las tablas y columnas listadas; no inventes identificadores.\n\
             - Los valores de region, estado y tipo_proceso están en mayúsculas sin tildes.\n\
             - Incluye siempre una cláusula LIMIT razonable.\n\
             - Responde solo con el SQL, sin explicación ni formato markdown.\n\
             - Si la pregunta no puede responderse con estas tablas, responde exactamente \
             {NO_QUERY_SENTINEL}.\n\n\
             Tablas disponibles:\n{schema}\n\n\
             Ejemplos:\n\
             Pregunta: ¿Cuántas licitaciones hay en Lima?\n\
             SQL: SELECT COUNT(*) AS total FROM licitaciones_cabecera WHERE region = 'LIMA' LIMIT 1\n\
             Pregunta: ¿Qué empresas ganaron más adjudicaciones en 2023?\n\
             SQL: SELECT ganador_nombre, COUNT(*) AS total FROM adjudicaciones \
             JOIN licitaciones_cabecera ON licitaciones_cabecera.id = adjudicaciones.licitacion_id \
             WHERE anio = 2023 GROUP BY ganador_nombre ORDER BY total DESC LIMIT 10",
            schema = self.schema_summary,
        );

        let context = self.window.render(history);
        let user = if context.is_empty() {
            format!("Pregunta: {question}\nSQL:")
        } else {
            format!("Conversación reciente:\n{context}\n\nPregunta: {question}\nSQL:")
        };

        Prompt { system, user }
    }
}

/// Strip surrounding markdown fences and a leading `SQL:` label, exactly
/// once each, then trim.
fn strip_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = if let Some(rest) = trimmed.strip_prefix("```sql") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest
    } else {
        trimmed
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner).trim();
    inner.strip_prefix("SQL:").unwrap_or(inner).trim().to_string()
}
