//! End-to-end pipeline tests over a seeded in-memory database: real
//! matcher, validator, executor, and composer; only the model is faked.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use licibot_agent::llm::{LlmClient, LlmError, Prompt};
use licibot_agent::runtime::AssistantRuntime;
use licibot_core::config::AssistantConfig;
use licibot_core::domain::query::{ExecutionError, QueryExecutor, QueryResult};
use licibot_db::{connect_with_settings, DbPool, PoolQueryExecutor, SeedDataset};

struct FailingLlm;

#[async_trait]
impl LlmClient for FailingLlm {
    async fn complete(&self, _prompt: &Prompt) -> Result<String, LlmError> {
        Err(LlmError::Transport("simulated outage".to_string()))
    }
}

/// Replies from a fixed script, one entry per call, then errors.
struct ScriptedLlm {
    replies: Mutex<Vec<Result<String, LlmError>>>,
}

impl ScriptedLlm {
    fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self { replies: Mutex::new(replies) }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, _prompt: &Prompt) -> Result<String, LlmError> {
        let mut replies = self.replies.lock().expect("lock");
        if replies.is_empty() {
            return Err(LlmError::Empty);
        }
        replies.remove(0)
    }
}

struct SpyExecutor {
    inner: PoolQueryExecutor,
    calls: AtomicUsize,
}

impl SpyExecutor {
    fn new(inner: PoolQueryExecutor) -> Self {
        Self { inner, calls: AtomicUsize::new(0) }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryExecutor for SpyExecutor {
    async fn execute(&self, sql: &str) -> Result<QueryResult, ExecutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.execute(sql).await
    }
}

fn config() -> AssistantConfig {
    AssistantConfig {
        max_rows: 100,
        max_limit: 500,
        default_limit: 100,
        context_turns: 5,
        context_char_budget: 1200,
        query_timeout_secs: 10,
    }
}

async fn seeded_pool() -> DbPool {
    let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
    SeedDataset::load(&pool).await.expect("seed");
    pool
}

#[tokio::test]
async fn count_by_region_scenario_end_to_end() {
    let pool = seeded_pool().await;
    let executor = PoolQueryExecutor::new(pool.clone(), 100, 10);
    let runtime =
        AssistantRuntime::new(Arc::new(FailingLlm), &config()).expect("runtime");

    let response =
        runtime.process_message("¿Cuántas licitaciones hay en Lima?", &executor, &[]).await;

    assert!(response.has_data);
    assert_eq!(response.text, "Se encontraron 4 licitaciones en LIMA.");

    let data = response.data.expect("data");
    assert!(data.sql.contains("region = 'LIMA'"));
    assert_eq!(data.results.len(), 1);
    assert_eq!(data.results[0].get("total"), Some(&serde_json::json!(4)));

    pool.close().await;
}

#[tokio::test]
async fn appended_injection_is_rejected_and_nothing_executes() {
    let pool = seeded_pool().await;
    let spy = SpyExecutor::new(PoolQueryExecutor::new(pool.clone(), 100, 10));
    // Simulate a prompt-injected model that parrots the attack.
    let runtime = AssistantRuntime::new(
        Arc::new(ScriptedLlm::new(vec![Ok(
            "SELECT COUNT(*) FROM licitaciones_cabecera; DROP TABLE Licitaciones_Cabecera;"
                .to_string(),
        )])),
        &config(),
    )
    .expect("runtime");

    let response = runtime
        .process_message(
            "Dame el reporte\"; DROP TABLE Licitaciones_Cabecera;\"",
            &spy,
            &[],
        )
        .await;

    assert!(!response.has_data);
    assert!(response.data.is_none());
    assert_eq!(spy.calls(), 0, "rejected statements must never reach the executor");

    // The table survived.
    let table_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'licitaciones_cabecera'",
    )
    .fetch_one(&pool)
    .await
    .expect("sqlite_master");
    assert_eq!(table_count, 1);

    pool.close().await;
}

#[tokio::test]
async fn greeting_answers_with_zero_database_calls() {
    let pool = seeded_pool().await;
    let spy = SpyExecutor::new(PoolQueryExecutor::new(pool.clone(), 100, 10));
    let runtime =
        AssistantRuntime::new(Arc::new(FailingLlm), &config()).expect("runtime");

    let response = runtime.process_message("Hola, ¿cómo estás?", &spy, &[]).await;

    assert!(!response.has_data);
    assert_eq!(spy.calls(), 0);

    pool.close().await;
}

#[tokio::test]
async fn oversized_llm_limit_is_clamped_and_result_truncated() {
    let pool = seeded_pool().await;
    // Tight row cap so the seed overflows it.
    let executor = PoolQueryExecutor::new(pool.clone(), 5, 10);
    // First call generates the SQL; the narration call then fails, which
    // exercises the deterministic degradation with data intact.
    let runtime = AssistantRuntime::new(
        Arc::new(ScriptedLlm::new(vec![Ok(
            "SELECT nomenclatura FROM licitaciones_cabecera LIMIT 100000".to_string(),
        )])),
        &config(),
    )
    .expect("runtime");

    let response = runtime
        .process_message("lista todas las licitaciones del sistema", &executor, &[])
        .await;

    assert!(response.has_data);
    let data = response.data.expect("data");
    assert!(data.sql.ends_with("LIMIT 500"), "limit clamped to ceiling: {}", data.sql);
    assert_eq!(data.results.len(), 5, "executor truncates at its row cap");
    assert!(response.text.contains("se truncó"), "truncation is surfaced: {}", response.text);

    pool.close().await;
}

#[tokio::test]
async fn sum_template_aggregates_seeded_amounts() {
    let pool = seeded_pool().await;
    let executor = PoolQueryExecutor::new(pool.clone(), 100, 10);
    let runtime =
        AssistantRuntime::new(Arc::new(FailingLlm), &config()).expect("runtime");

    let response = runtime
        .process_message("¿Cuál es el monto total de las licitaciones en Cusco?", &executor, &[])
        .await;

    assert!(response.has_data);
    assert_eq!(
        response.text,
        "El monto referencial total en CUSCO asciende a S/ 10330000.00."
    );

    pool.close().await;
}

#[tokio::test]
async fn top_by_amount_template_lists_largest_first() {
    let pool = seeded_pool().await;
    let executor = PoolQueryExecutor::new(pool.clone(), 100, 10);
    let runtime =
        AssistantRuntime::new(Arc::new(FailingLlm), &config()).expect("runtime");

    let response = runtime
        .process_message("Top 3 licitaciones por monto en Lima", &executor, &[])
        .await;

    assert!(response.has_data);
    let first_entry = response
        .text
        .lines()
        .nth(1)
        .unwrap_or_default()
        .to_string();
    assert!(first_entry.contains("LP-002-2023-GRL"), "largest tender leads: {first_entry}");
    assert_eq!(response.data.expect("data").results.len(), 3);

    pool.close().await;
}

#[tokio::test]
async fn follow_up_history_is_accepted_without_state() {
    let pool = seeded_pool().await;
    let executor = PoolQueryExecutor::new(pool.clone(), 100, 10);
    let runtime =
        AssistantRuntime::new(Arc::new(FailingLlm), &config()).expect("runtime");

    let first =
        runtime.process_message("¿Cuántas licitaciones hay en Lima?", &executor, &[]).await;
    let history = vec![AssistantRuntime::turn_for("¿Cuántas licitaciones hay en Lima?", &first)];

    // A second template question with history supplied by the caller.
    let second = runtime
        .process_message("¿Cuántas licitaciones hay en Cusco?", &executor, &history)
        .await;

    assert!(second.has_data);
    assert_eq!(second.text, "Se encontraron 3 licitaciones en CUSCO.");

    pool.close().await;
}
