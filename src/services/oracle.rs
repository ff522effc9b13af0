//! External categorization oracle.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Category, OracleConfig};

/// Black-box text categorizer consulted when keyword rules are inconclusive.
#[async_trait]
pub trait CategoryOracle: Send + Sync {
    /// Return a category label for `text`.
    async fn classify_text(&self, text: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Oracle backed by an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct OpenAiOracle {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    system_prompt: String,
}

impl OpenAiOracle {
    pub fn new(client: Client, config: &OracleConfig, api_key: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.into(),
            system_prompt: Self::system_prompt(),
        }
    }

    /// Build from configuration, reading the API key from the environment.
    pub fn from_env(config: &OracleConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| AppError::config(format!("{} not set", config.api_key_env)))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self::new(client, config, api_key))
    }

    /// Instruction listing every valid verdict.
    pub fn system_prompt() -> String {
        let labels: Vec<&str> = Category::PUBLISHABLE
            .iter()
            .chain(std::iter::once(&Category::NotApplicable))
            .map(|c| c.label())
            .collect();
        format!(
            "다음 공지사항을 아래 카테고리 중 하나로 분류하세요. \
             카테고리 이름만 정확히 그대로 답하세요.\n{}",
            labels
                .iter()
                .map(|l| format!("- {l}"))
                .collect::<Vec<_>>()
                .join("\n")
        )
    }
}

#[async_trait]
impl CategoryOracle for OpenAiOracle {
    async fn classify_text(&self, text: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::classification(format!("oracle unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::classification(format!(
                "oracle returned {status}: {body}"
            )));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::classification(format!("malformed oracle reply: {e}")))?;

        let verdict = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::classification("oracle returned no verdict"))?;

        log::debug!("Oracle verdict: {}", verdict);
        Ok(verdict)
    }
}
