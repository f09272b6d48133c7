use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use licibot_agent::runtime::AssistantRuntime;
use licibot_core::domain::conversation::ConversationTurn;
use licibot_core::domain::response::AssistantResponse;
use licibot_db::PoolQueryExecutor;

#[derive(Clone)]
pub struct ApiState {
    pub runtime: Arc<AssistantRuntime>,
    pub executor: PoolQueryExecutor,
}

/// Wire request: the caller owns the conversation history and sends the
/// recent turns (oldest first) with every message.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
}

pub fn router(state: ApiState) -> Router {
    Router::new().route("/api/chat", post(chat)).with_state(state)
}

pub async fn chat(
    State(state): State<ApiState>,
    Json(request): Json<ChatRequest>,
) -> (StatusCode, Json<AssistantResponse>) {
    if request.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(AssistantResponse::conversational(
                "Escribe una pregunta sobre licitaciones, adjudicaciones o contratos.",
            )),
        );
    }

    let correlation_id = Uuid::new_v4();
    info!(
        event_name = "api.chat.received",
        correlation_id = %correlation_id,
        history_turns = request.history.len(),
        "chat message received"
    );

    let response = state
        .runtime
        .process_message(&request.message, &state.executor, &request.history)
        .await;

    info!(
        event_name = "api.chat.answered",
        correlation_id = %correlation_id,
        has_data = response.has_data,
        "chat message answered"
    );

    (StatusCode::OK, Json(response))
}
