//! LLM client seam. The pipeline only ever sees the `LlmClient` trait;
//! `HttpLlmClient` speaks the OpenAI-compatible chat-completions protocol
//! (OpenAI itself or a local Ollama), with an explicit request timeout and
//! a bounded retry budget. Tests plug in fakes.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use licibot_core::config::{LlmConfig, LlmProvider};

/// One bounded completion request: fixed system instructions plus the
/// user-facing content. No tool calls, no streaming.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LlmError {
    #[error("llm request failed: {0}")]
    Transport(String),
    #[error("llm returned status {0}")]
    Status(u16),
    #[error("llm response could not be decoded: {0}")]
    Decode(String),
    #[error("llm returned an empty completion")]
    Empty,
}

impl LlmError {
    /// Server-side and transport failures are worth one more attempt;
    /// client errors (bad key, bad model) are not.
    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status(code) => *code >= 500 || *code == 429,
            Self::Decode(_) | Self::Empty => false,
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &Prompt) -> Result<String, LlmError>;
}

pub struct HttpLlmClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<SecretString>,
    model: String,
    temperature: f32,
    max_retries: u32,
}

impl HttpLlmClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|error| LlmError::Transport(error.to_string()))?;

        let endpoint = match config.provider {
            LlmProvider::OpenAi => config
                .base_url
                .clone()
                .unwrap_or_else(|| "https://api.openai.com".to_string()),
            LlmProvider::Ollama => config
                .base_url
                .clone()
                .unwrap_or_else(|| "http://localhost:11434".to_string()),
        };
        let endpoint = format!("{}/v1/chat/completions", endpoint.trim_end_matches('/'));

        Ok(Self {
            http,
            endpoint,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }

    async fn attempt(&self, prompt: &Prompt) -> Result<String, LlmError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![
                ChatMessage { role: "system", content: &prompt.system },
                ChatMessage { role: "user", content: &prompt.user },
            ],
        };

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|error| LlmError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Status(status.as_u16()));
        }

        let payload: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|error| LlmError::Decode(error.to_string()))?;

        let content = payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(LlmError::Empty);
        }
        Ok(content)
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &Prompt) -> Result<String, LlmError> {
        let mut last_error = LlmError::Empty;

        for attempt in 0..=self.max_retries {
            match self.attempt(prompt).await {
                Ok(content) => return Ok(content),
                Err(error) => {
                    warn!(
                        event_name = "assistant.llm.attempt_failed",
                        attempt,
                        error = %error,
                        "llm completion attempt failed"
                    );
                    let retryable = error.is_retryable();
                    last_error = error;
                    if !retryable {
                        break;
                    }
                }
            }
        }

        Err(last_error)
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}
