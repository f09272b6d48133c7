//! The assistant runtime: one `process_message` call per request, no
//! shared mutable state beyond the read-only template registry. The LLM
//! client is injected at construction; the database executor and the
//! conversation history arrive with each call, so concurrent requests
//! never share a session.

use std::sync::Arc;

use tracing::{info, warn};

use licibot_core::config::AssistantConfig;
use licibot_core::domain::conversation::ConversationTurn;
use licibot_core::domain::query::{CandidateQuery, QueryExecutor};
use licibot_core::domain::response::AssistantResponse;
use licibot_core::errors::PipelineError;
use licibot_core::schema::SchemaWhitelist;

use crate::composer::ResponseComposer;
use crate::conversation::ContextWindow;
use crate::faq::FaqHandler;
use crate::generator::{Generated, SqlGenerator};
use crate::intent::IntentMatcher;
use crate::llm::LlmClient;
use crate::normalize;
use crate::templates::{SlotValues, TemplateKind, TemplateRegistry};
use crate::validator::{SqlValidator, ValidationVerdict};

/// Matches below this confidence are treated as misses and routed to the
/// LLM path. All standard templates sit above it; the threshold exists so
/// lower-confidence experimental templates degrade predictably.
const MIN_TEMPLATE_CONFIDENCE: u8 = 60;

pub struct AssistantRuntime {
    faq: FaqHandler,
    matcher: IntentMatcher,
    generator: SqlGenerator,
    validator: SqlValidator,
    composer: ResponseComposer,
}

impl AssistantRuntime {
    pub fn new(llm: Arc<dyn LlmClient>, assistant: &AssistantConfig) -> Result<Self, regex::Error> {
        let whitelist = SchemaWhitelist::standard();
        let registry = TemplateRegistry::standard()?;
        let window = ContextWindow::new(assistant.context_turns, assistant.context_char_budget);

        Ok(Self {
            faq: FaqHandler::new(),
            matcher: IntentMatcher::new(registry),
            generator: SqlGenerator::new(llm.clone(), whitelist.summary(), window),
            validator: SqlValidator::new(
                whitelist,
                assistant.max_limit,
                assistant.default_limit,
            ),
            composer: ResponseComposer::new(llm),
        })
    }

    /// Answer one message. Every failure path degrades to a conversational
    /// `AssistantResponse`; this function never errors.
    pub async fn process_message(
        &self,
        message: &str,
        executor: &dyn QueryExecutor,
        history: &[ConversationTurn],
    ) -> AssistantResponse {
        let canonical = normalize::canonicalize(message);

        if let Some(answer) = self.faq.answer(&canonical) {
            info!(event_name = "assistant.faq.answered", "answered from the static faq table");
            return AssistantResponse::conversational(answer);
        }

        let matched = self
            .matcher
            .match_message(&canonical)
            .filter(|matched| matched.confidence >= MIN_TEMPLATE_CONFIDENCE);

        let (candidate, template): (CandidateQuery, Option<(TemplateKind, SlotValues)>) =
            match matched {
                Some(matched) => {
                    info!(
                        event_name = "assistant.intent.matched",
                        template = ?matched.kind,
                        confidence = matched.confidence,
                        "question matched a local template"
                    );
                    (matched.query, Some((matched.kind, matched.slots)))
                }
                None => match self.generator.generate(message, history).await {
                    Ok(Generated::Query(query)) => {
                        info!(
                            event_name = "assistant.generator.produced",
                            "sql generated by the model"
                        );
                        (query, None)
                    }
                    Ok(Generated::Declined) => {
                        info!(
                            event_name = "assistant.generator.declined",
                            "question judged non-answerable from the schema"
                        );
                        return self.composer.compose_conversational(message).await;
                    }
                    Err(error) => {
                        warn!(
                            event_name = "assistant.generator.failed",
                            error = %error,
                            "sql generation failed, degrading to conversational answer"
                        );
                        return self
                            .composer
                            .compose_failure(&PipelineError::Generation(error.to_string()));
                    }
                },
            };

        let sql = match self.validator.validate(&candidate) {
            ValidationVerdict::Accepted { sql } => sql,
            ValidationVerdict::Rejected { reason } => {
                warn!(
                    event_name = "assistant.validator.rejected",
                    origin = ?candidate.origin,
                    reason = %reason,
                    "candidate statement rejected, nothing executed"
                );
                return self
                    .composer
                    .compose_failure(&PipelineError::ValidationRejected(reason));
            }
        };

        let result = match executor.execute(&sql).await {
            Ok(result) => result,
            Err(error) => {
                warn!(
                    event_name = "assistant.executor.failed",
                    error = %error,
                    "query execution failed, degrading to conversational answer"
                );
                return self.composer.compose_failure(&PipelineError::Execution(error));
            }
        };

        info!(
            event_name = "assistant.response.composed",
            origin = ?candidate.origin,
            rows = result.row_count,
            truncated = result.truncated,
            "query executed and response composed"
        );

        match template {
            Some((kind, slots)) => self.composer.compose_template(kind, &slots, &sql, &result),
            None => self.composer.compose_narrated(message, &sql, &result).await,
        }
    }

    /// Build the history entry for a completed exchange, for callers that
    /// maintain the rolling window between requests.
    pub fn turn_for(message: &str, response: &AssistantResponse) -> ConversationTurn {
        let summary = response.text.lines().next().unwrap_or_default().to_string();
        ConversationTurn {
            message: message.to_string(),
            sql_used: response.data.as_ref().map(|data| data.sql.clone()),
            had_data: response.has_data,
            summary,
        }
    }
}
