use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::Generator;
use super::types::{ChatMessage, GenerationParams};
use crate::core::config::GeneratorSettings;
use crate::core::errors::ApiError;

/// Chat-completions client for OpenAI-compatible endpoints such as OpenRouter.
#[derive(Clone)]
pub struct OpenAiCompatGenerator {
    base_url: String,
    api_key: String,
    client: Client,
}

impl OpenAiCompatGenerator {
    pub fn new(settings: &GeneratorSettings, client: Client) -> Self {
        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            client,
        }
    }
}

#[async_trait]
impl Generator for OpenAiCompatGenerator {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ApiError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = json!({
            "model": params.model,
            "messages": [ChatMessage::system(system_prompt), ChatMessage::user(user_prompt)],
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
            "stream": false,
        });

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", "https://localhost")
            .header("X-Title", "convo-rag")
            .json(&body)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!(
                "Chat completion error ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await?;
        extract_content(&payload)
    }
}

fn extract_content(payload: &Value) -> Result<String, ApiError> {
    payload["choices"][0]["message"]["content"]
        .as_str()
        .map(|content| content.trim().to_string())
        .ok_or_else(|| {
            ApiError::Upstream("Chat completion response has no message content".to_string())
        })
}
