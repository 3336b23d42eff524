//! In-process ingestion: preprocess → embed → add to the vector store.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::embedder::{ConversationIngestor, Embedder};
use super::preprocess::Preprocessor;
use super::store::{AddRecords, VectorStore};
use super::types::{IngestResult, Metadata};
use crate::core::errors::ApiError;

#[derive(Clone)]
pub struct LocalIngestor {
    preprocessor: Preprocessor,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    collection: String,
}

impl LocalIngestor {
    pub fn new(
        preprocessor: Preprocessor,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            preprocessor,
            embedder,
            store,
            collection: collection.into(),
        }
    }
}

#[async_trait]
impl ConversationIngestor for LocalIngestor {
    async fn ingest(
        &self,
        messages: &[String],
        metadata: Metadata,
    ) -> Result<IngestResult, ApiError> {
        let document = self.preprocessor.preprocess(messages).await;
        if document.is_empty() {
            return Err(ApiError::BadRequest(
                "conversation has no non-blank messages".to_string(),
            ));
        }

        let response = self.embedder.embed(std::slice::from_ref(&document)).await?;
        let vector = response
            .embeddings
            .into_iter()
            .next()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ApiError::Upstream("Embedding service returned no vector".to_string())
            })?;
        let vector_dimension = Some(response.dimension.unwrap_or(vector.len()));

        let id = Uuid::new_v4().to_string();
        self.store.get_or_create(&self.collection).await?;
        self.store
            .add(
                &self.collection,
                AddRecords {
                    ids: vec![id.clone()],
                    embeddings: Some(vec![vector]),
                    documents: Some(vec![document]),
                    metadatas: Some(vec![metadata]),
                },
            )
            .await?;

        tracing::debug!("Stored conversation {} in '{}'", id, self.collection);
        Ok(IngestResult {
            id,
            vector_dimension,
        })
    }
}
