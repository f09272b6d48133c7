use thiserror::Error;

use crate::domain::query::ExecutionError;

/// Per-request failures inside the assistant pipeline. Every variant is
/// recovered locally: `process_message` always degrades to a conversational
/// `AssistantResponse` with `has_data = false`, never a fault. A template
/// miss is not an error (it routes to the LLM path), and configuration
/// problems are `config::ConfigError`, rejected before any request runs.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("sql generation failed: {0}")]
    Generation(String),
    #[error("sql validation rejected: {0}")]
    ValidationRejected(String),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl PipelineError {
    /// Operator-facing Spanish message. Never a stack trace, never raw SQL.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Generation(_) => {
                "No pude generar una consulta para tu pregunta en este momento. \
                 Intenta reformularla o vuelve a intentarlo en unos minutos."
            }
            Self::ValidationRejected(_) => {
                "No puedo ejecutar esa consulta sobre la base de datos. \
                 Prueba con una pregunta sobre licitaciones, adjudicaciones o contratos."
            }
            Self::Execution(_) => {
                "La consulta no pudo completarse contra la base de datos. \
                 Intenta nuevamente con una pregunta más acotada."
            }
        }
    }
}
