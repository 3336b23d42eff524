//! Ingestion orchestrator: forwards conversation records to the storage collaborator.

use std::sync::Arc;

use serde_json::{json, Value};

use super::embedder::ConversationIngestor;
use super::types::{BatchIngestSummary, ConversationRecord, IngestResult, Metadata};
use crate::core::errors::ApiError;

#[derive(Clone)]
pub struct IngestOrchestrator {
    ingestor: Arc<dyn ConversationIngestor>,
}

impl IngestOrchestrator {
    pub fn new(ingestor: Arc<dyn ConversationIngestor>) -> Self {
        Self { ingestor }
    }

    /// Stores one conversation. `messages` must be non-empty.
    pub async fn ingest_single(
        &self,
        messages: Vec<String>,
        metadata: Metadata,
    ) -> Result<IngestResult, ApiError> {
        if messages.is_empty() {
            return Err(ApiError::BadRequest("messages[] is required".to_string()));
        }
        let result = self.ingestor.ingest(&messages, metadata).await?;
        tracing::debug!("Ingested conversation {} ({} messages)", result.id, messages.len());
        Ok(result)
    }

    /// Stores every record in input order, one at a time.
    ///
    /// The first failure aborts the batch; results gathered so far are discarded.
    pub async fn ingest_batch(
        &self,
        records: Vec<ConversationRecord>,
        source_tag: &str,
    ) -> Result<BatchIngestSummary, ApiError> {
        let total = records.len();
        let mut items = Vec::with_capacity(total);

        for (index, record) in records.into_iter().enumerate() {
            let metadata = source_metadata(source_tag);
            let result = self
                .ingestor
                .ingest(record.messages(), metadata)
                .await
                .map_err(|err| {
                    tracing::warn!(
                        "Batch ingestion aborted at record {}/{}: {}",
                        index + 1,
                        total,
                        err
                    );
                    err
                })?;
            items.push(result);
        }

        tracing::info!("Ingested {} conversations from '{}'", items.len(), source_tag);
        Ok(BatchIngestSummary {
            count: items.len(),
            items,
        })
    }
}

fn source_metadata(source_tag: &str) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("source".to_string(), json!(source_tag));
    metadata
}

/// Keeps only scalar metadata values; nested objects and arrays are dropped.
pub fn scalar_metadata(metadata: Option<Metadata>) -> Metadata {
    metadata
        .unwrap_or_default()
        .into_iter()
        .filter(|(_, value)| {
            matches!(
                value,
                Value::String(_) | Value::Number(_) | Value::Bool(_)
            )
        })
        .collect()
}
