use licibot_core::config::{AppConfig, LoadOptions};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ConfigView {
    database: DatabaseView,
    llm: LlmView,
    server: ServerView,
    assistant: AssistantView,
    logging: LoggingView,
}

#[derive(Debug, Serialize)]
struct DatabaseView {
    url: String,
    max_connections: u32,
    timeout_secs: u64,
}

#[derive(Debug, Serialize)]
struct LlmView {
    provider: String,
    api_key: &'static str,
    base_url: Option<String>,
    model: String,
    temperature: f32,
    timeout_secs: u64,
    max_retries: u32,
}

#[derive(Debug, Serialize)]
struct ServerView {
    bind_address: String,
    port: u16,
    graceful_shutdown_secs: u64,
}

#[derive(Debug, Serialize)]
struct AssistantView {
    max_rows: usize,
    max_limit: u32,
    default_limit: u32,
    context_turns: usize,
    context_char_budget: usize,
    query_timeout_secs: u64,
}

#[derive(Debug, Serialize)]
struct LoggingView {
    level: String,
    format: String,
}

pub fn run() -> String {
    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            let view = ConfigView {
                database: DatabaseView {
                    url: config.database.url.clone(),
                    max_connections: config.database.max_connections,
                    timeout_secs: config.database.timeout_secs,
                },
                llm: LlmView {
                    provider: format!("{:?}", config.llm.provider).to_ascii_lowercase(),
                    api_key: if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" },
                    base_url: config.llm.base_url.clone(),
                    model: config.llm.model.clone(),
                    temperature: config.llm.temperature,
                    timeout_secs: config.llm.timeout_secs,
                    max_retries: config.llm.max_retries,
                },
                server: ServerView {
                    bind_address: config.server.bind_address.clone(),
                    port: config.server.port,
                    graceful_shutdown_secs: config.server.graceful_shutdown_secs,
                },
                assistant: AssistantView {
                    max_rows: config.assistant.max_rows,
                    max_limit: config.assistant.max_limit,
                    default_limit: config.assistant.default_limit,
                    context_turns: config.assistant.context_turns,
                    context_char_budget: config.assistant.context_char_budget,
                    query_timeout_secs: config.assistant.query_timeout_secs,
                },
                logging: LoggingView {
                    level: config.logging.level.clone(),
                    format: format!("{:?}", config.logging.format).to_ascii_lowercase(),
                },
            };

            serde_json::to_string_pretty(&view)
                .unwrap_or_else(|error| format!("config serialization failed: {error}"))
        }
        Err(error) => format!("config load failed: {error}"),
    }
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn output_never_contains_a_raw_api_key() {
        let output = run();
        assert!(output.contains("api_key"));
        assert!(output.contains("<redacted>") || output.contains("<unset>"));
        assert!(!output.contains("sk-"));
    }
}
