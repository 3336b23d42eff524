//! Seams to the embedding service and the combined embed+store entry point.

use async_trait::async_trait;

use super::types::{IngestResult, Metadata};
use crate::core::errors::ApiError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbedResponse {
    pub embeddings: Vec<Vec<f32>>,
    pub dimension: Option<usize>,
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed each text; one vector per input, in order.
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ApiError>;
}

/// Embeds one conversation and stores it, returning the assigned id.
#[async_trait]
pub trait ConversationIngestor: Send + Sync {
    async fn ingest(&self, messages: &[String], metadata: Metadata)
        -> Result<IngestResult, ApiError>;
}
