//! Chat-completion client abstraction.
//!
//! [`ChatModel`] is the seam between the planning logic and the LLM
//! backend; [`MistralChat`] is the production implementation against the
//! Mistral chat-completions API. Tests substitute scripted fakes.
//!
//! Calls are single-shot: a timeout, transport error, or non-2xx status
//! fails the operation immediately with no retry.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::LlmConfig;
use crate::error::{PlanError, PlanResult};

/// A chat-completion backend.
///
/// One system message and one user message in, the assistant's text out.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str, max_tokens: u32) -> PlanResult<String>;
}

/// Chat client for the Mistral chat-completions API.
///
/// Reads the API key from the environment variable named by
/// `llm.api_key_env` at call time, so a missing key fails the call rather
/// than construction. Requested token counts are capped by the configured
/// `llm.max_tokens`.
pub struct MistralChat {
    config: LlmConfig,
    client: reqwest::Client,
}

impl MistralChat {
    pub fn new(config: LlmConfig) -> PlanResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PlanError::ExternalServiceFailure(e.to_string()))?;
        Ok(Self { config, client })
    }

    /// The configured `llm.max_tokens` is a ceiling on what any single
    /// call may request.
    fn effective_max_tokens(&self, requested: u32) -> u32 {
        requested.min(self.config.max_tokens)
    }
}

#[async_trait]
impl ChatModel for MistralChat {
    async fn complete(&self, system: &str, user: &str, max_tokens: u32) -> PlanResult<String> {
        let api_key = std::env::var(&self.config.api_key_env).map_err(|_| {
            PlanError::ExternalServiceFailure(format!(
                "{} environment variable not set",
                self.config.api_key_env
            ))
        })?;

        let max_tokens = self.effective_max_tokens(max_tokens);
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "temperature": self.config.temperature,
            "max_tokens": max_tokens,
        });

        debug!(model = %self.config.model, max_tokens, "sending chat completion request");

        let response = self
            .client
            .post(&self.config.url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| PlanError::ExternalServiceFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(PlanError::ExternalServiceFailure(format!(
                "chat API error {}: {}",
                status, body_text
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PlanError::ExternalServiceFailure(e.to_string()))?;

        extract_message_content(&json)
    }
}

/// Pull `choices[0].message.content` out of a chat-completions response.
fn extract_message_content(json: &serde_json::Value) -> PlanResult<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|content| content.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            PlanError::ParseFailure("chat response missing choices[0].message.content".to_string())
        })
}
