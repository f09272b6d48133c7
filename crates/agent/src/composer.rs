//! Response composition. Template hits get deterministic Spanish phrasing
//! so the fast path is reproducible and testable; LLM-origin results are
//! narrated by the model under a grounding instruction, with a plain
//! deterministic rendering as the degradation path. The no-data cases
//! always produce a conversational answer, never an error surface.

use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use licibot_core::domain::query::QueryResult;
use licibot_core::domain::response::AssistantResponse;
use licibot_core::errors::PipelineError;

use crate::llm::{LlmClient, Prompt};
use crate::templates::{SlotValues, TemplateKind};

const NARRATION_ROW_BUDGET: usize = 30;

const CONVERSATIONAL_FALLBACK: &str = "Puedo ayudarte con datos de contrataciones públicas: \
    licitaciones, adjudicaciones, contratos y consorcios. \
    ¿Podrías reformular tu pregunta con alguno de esos temas?";

const TRUNCATION_NOTE: &str = "Nota: la lista se truncó al límite de filas configurado.";

pub struct ResponseComposer {
    llm: Arc<dyn LlmClient>,
}

impl ResponseComposer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Deterministic phrasing for a template-origin result.
    pub fn compose_template(
        &self,
        kind: TemplateKind,
        slots: &SlotValues,
        sql: &str,
        result: &QueryResult,
    ) -> AssistantResponse {
        let scope = scope_suffix(slots);
        let text = match kind {
            TemplateKind::CountTenders | TemplateKind::CountByTipo => {
                let total = scalar_i64(result);
                match total {
                    1 => format!("Se encontró 1 licitación{scope}."),
                    n => format!("Se encontraron {n} licitaciones{scope}."),
                }
            }
            TemplateKind::SumAmount => match scalar_f64(result) {
                Some(total) => format!(
                    "El monto referencial total{scope} asciende a S/ {total:.2}."
                ),
                None => format!("No hay montos registrados{scope}."),
            },
            TemplateKind::TopByAmount => {
                if result.is_empty() {
                    format!("No se encontraron licitaciones{scope}.")
                } else {
                    let mut lines = vec![format!(
                        "Estas son las {} licitaciones de mayor monto{scope}:",
                        result.row_count
                    )];
                    for row in result.row_objects() {
                        lines.push(format!(
                            "- {}: {} (S/ {})",
                            cell_text(row.get("nomenclatura")),
                            cell_text(row.get("descripcion")),
                            cell_money(row.get("monto_referencial")),
                        ));
                    }
                    lines.join("\n")
                }
            }
            TemplateKind::TopWinners => {
                if result.is_empty() {
                    format!("No se encontraron adjudicaciones{scope}.")
                } else {
                    let mut lines = vec![format!("Principales ganadores{scope}:")];
                    for row in result.row_objects() {
                        lines.push(format!(
                            "- {}: {} adjudicaciones",
                            cell_text(row.get("ganador_nombre")),
                            cell_text(row.get("total_adjudicaciones")),
                        ));
                    }
                    lines.join("\n")
                }
            }
        };

        let text = with_truncation_note(text, result.truncated);
        AssistantResponse::with_data(text, sql, result)
    }

    /// Narrate an LLM-origin result table. The grounding instruction keeps
    /// the model on the rows it was given; it reduces fabrication risk but
    /// cannot eliminate it, so narration failure falls back to a plain
    /// deterministic rendering rather than dropping the data.
    pub async fn compose_narrated(
        &self,
        question: &str,
        sql: &str,
        result: &QueryResult,
    ) -> AssistantResponse {
        if result.is_empty() {
            return AssistantResponse::with_data(
                "La consulta no devolvió resultados.",
                sql,
                result,
            );
        }

        let prompt = Prompt {
            system: "Redactas respuestas breves en español sobre datos de contrataciones \
                     públicas. Usa únicamente los hechos presentes en la tabla proporcionada; \
                     no agregues cifras ni nombres que no aparezcan en ella. \
                     Si la tabla no responde la pregunta, dilo."
                .to_string(),
            user: format!(
                "Pregunta: {question}\n\nTabla de resultados:\n{table}",
                table = render_table(result),
            ),
        };

        let text = match self.llm.complete(&prompt).await {
            Ok(narration) => narration.trim().to_string(),
            Err(error) => {
                warn!(
                    event_name = "assistant.composer.narration_failed",
                    error = %error,
                    "narration failed, using deterministic rendering"
                );
                describe_result(result)
            }
        };

        AssistantResponse::with_data(with_truncation_note(text, result.truncated), sql, result)
    }

    /// Degraded answer for a recovered pipeline failure.
    pub fn compose_failure(&self, error: &PipelineError) -> AssistantResponse {
        AssistantResponse::conversational(error.user_message())
    }

    /// Conversational answer for messages that are not answerable from the
    /// database. Degrades to a static fallback when the model is down.
    pub async fn compose_conversational(&self, question: &str) -> AssistantResponse {
        let prompt = Prompt {
            system: "Eres un asistente en español de un portal de contrataciones públicas. \
                     Responde en una o dos frases, sin inventar datos, y recuerda al usuario \
                     qué tipo de consultas sobre licitaciones puedes responder."
                .to_string(),
            user: question.to_string(),
        };

        match self.llm.complete(&prompt).await {
            Ok(answer) => AssistantResponse::conversational(answer.trim().to_string()),
            Err(_) => AssistantResponse::conversational(CONVERSATIONAL_FALLBACK),
        }
    }
}

fn with_truncation_note(text: String, truncated: bool) -> String {
    if truncated {
        format!("{text}\n{TRUNCATION_NOTE}")
    } else {
        text
    }
}

fn scope_suffix(slots: &SlotValues) -> String {
    let mut scope = String::new();
    if let Some(estado) = slots.estado {
        scope.push_str(&format!(" en estado {estado}"));
    }
    if let Some(tipo) = slots.tipo_proceso {
        scope.push_str(&format!(" de tipo {tipo}"));
    }
    if let Some(region) = slots.region {
        scope.push_str(&format!(" en {region}"));
    }
    if let Some(anio) = slots.anio {
        scope.push_str(&format!(" en {anio}"));
    }
    scope
}

fn scalar_i64(result: &QueryResult) -> i64 {
    result.scalar().and_then(Value::as_i64).unwrap_or(0)
}

fn scalar_f64(result: &QueryResult) -> Option<f64> {
    result.scalar().and_then(Value::as_f64)
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        Some(Value::Null) | None => "-".to_string(),
        Some(other) => other.to_string(),
    }
}

fn cell_money(value: Option<&Value>) -> String {
    match value.and_then(Value::as_f64) {
        Some(amount) => format!("{amount:.2}"),
        None => "-".to_string(),
    }
}

fn render_table(result: &QueryResult) -> String {
    let mut lines = vec![result.columns.join(" | ")];
    for row in result.rows.iter().take(NARRATION_ROW_BUDGET) {
        let cells: Vec<String> = row.iter().map(|value| cell_text(Some(value))).collect();
        lines.push(cells.join(" | "));
    }
    if result.rows.len() > NARRATION_ROW_BUDGET {
        lines.push(format!("({} filas adicionales omitidas)", result.rows.len() - NARRATION_ROW_BUDGET));
    }
    lines.join("\n")
}

fn describe_result(result: &QueryResult) -> String {
    match result.row_count {
        1 => "La consulta devolvió 1 fila.".to_string(),
        n => format!("La consulta devolvió {n} filas."),
    }
}
