use async_trait::async_trait;

use super::types::GenerationParams;
use crate::core::errors::ApiError;

#[async_trait]
pub trait Generator: Send + Sync {
    /// return the provider name (e.g. "openrouter")
    fn name(&self) -> &str;

    /// single-shot chat completion built from a system and a user prompt
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ApiError>;
}
