use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use licibot_agent::llm::HttpLlmClient;
use licibot_agent::runtime::AssistantRuntime;
use licibot_core::config::{AppConfig, ConfigError, LoadOptions};
use licibot_db::{connect_read_only, connect_with_settings, DbPool, PoolQueryExecutor};

pub struct Application {
    pub config: AppConfig,
    /// Read-write pool for health checks and operational tooling.
    pub db_pool: DbPool,
    pub runtime: Arc<AssistantRuntime>,
    pub executor: PoolQueryExecutor,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("llm client initialization failed: {0}")]
    Llm(String),
    #[error("assistant runtime initialization failed: {0}")]
    Runtime(String),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;

    // Assistant queries run on their own query_only pool; nothing that
    // reaches it can mutate the database.
    let query_pool = connect_read_only(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database pools established"
    );

    let llm = HttpLlmClient::from_config(&config.llm)
        .map_err(|error| BootstrapError::Llm(error.to_string()))?;
    let runtime = AssistantRuntime::new(Arc::new(llm), &config.assistant)
        .map_err(|error| BootstrapError::Runtime(error.to_string()))?;

    let executor = PoolQueryExecutor::new(
        query_pool,
        config.assistant.max_rows,
        config.assistant.query_timeout_secs,
    );

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        "assistant runtime initialized"
    );

    Ok(Application { config, db_pool, runtime: Arc::new(runtime), executor })
}

#[cfg(test)]
mod tests {
    use licibot_core::config::{ConfigOverrides, LoadOptions};

    use super::bootstrap;

    fn options(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_succeeds_with_defaults_and_memory_database() {
        let app = bootstrap(options("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed");

        let value: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&app.db_pool)
            .await
            .expect("pool should be usable");
        assert_eq!(value, 1);

        app.db_pool.close().await;
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_invalid_database_url() {
        let result = bootstrap(options("postgres://not-supported")).await;
        let message = result.err().expect("error").to_string();
        assert!(message.contains("database.url"));
    }
}
