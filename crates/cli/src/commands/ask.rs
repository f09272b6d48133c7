use std::sync::Arc;

use licibot_agent::llm::HttpLlmClient;
use licibot_agent::runtime::AssistantRuntime;
use licibot_core::config::{AppConfig, LoadOptions};
use licibot_db::{connect_read_only, PoolQueryExecutor};

use super::CommandResult;

/// One-shot question against the configured database, with no prior
/// conversation history.
pub fn run(question: &str, json_output: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure("ask", "config", error.to_string(), 78),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure("ask", "runtime", error.to_string(), 70),
    };

    runtime.block_on(async {
        let pool = match connect_read_only(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => pool,
            Err(error) => {
                return CommandResult::failure("ask", "database", error.to_string(), 69)
            }
        };

        let llm = match HttpLlmClient::from_config(&config.llm) {
            Ok(llm) => llm,
            Err(error) => return CommandResult::failure("ask", "llm", error.to_string(), 69),
        };

        let assistant = match AssistantRuntime::new(Arc::new(llm), &config.assistant) {
            Ok(assistant) => assistant,
            Err(error) => return CommandResult::failure("ask", "runtime", error.to_string(), 70),
        };

        let executor = PoolQueryExecutor::new(
            pool.clone(),
            config.assistant.max_rows,
            config.assistant.query_timeout_secs,
        );

        let response = assistant.process_message(question, &executor, &[]).await;
        pool.close().await;

        let output = if json_output {
            serde_json::to_string_pretty(&response).unwrap_or_else(|_| response.text.clone())
        } else {
            render_human(&response)
        };

        CommandResult { exit_code: 0, output }
    })
}

fn render_human(response: &licibot_core::domain::response::AssistantResponse) -> String {
    let mut output = response.text.clone();
    if let Some(data) = &response.data {
        output.push_str(&format!("\n\nSQL: {}", data.sql));
    }
    output
}
