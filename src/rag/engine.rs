//! HTTP client for the RAG engine (`/rag/embed`, `/rag/ingest`).

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::{json, Value};

use super::embedder::{ConversationIngestor, EmbedResponse, Embedder};
use super::types::{IngestResult, Metadata};
use crate::core::errors::ApiError;

#[derive(Clone)]
pub struct EngineClient {
    base_url: String,
    client: Client,
}

impl EngineClient {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let res = self.client.post(&url).json(body).send().await?;
        read_payload(res, path).await
    }
}

#[async_trait]
impl Embedder for EngineClient {
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ApiError> {
        let payload = self.post("/rag/embed", &json!({ "texts": texts })).await?;
        Ok(parse_embed_response(&payload))
    }
}

#[async_trait]
impl ConversationIngestor for EngineClient {
    async fn ingest(
        &self,
        messages: &[String],
        metadata: Metadata,
    ) -> Result<IngestResult, ApiError> {
        let body = json!({ "messages": messages, "metadata": metadata });
        let payload = self.post("/rag/ingest", &body).await?;
        parse_ingest_response(&payload)
    }
}

async fn read_payload(res: Response, path: &str) -> Result<Value, ApiError> {
    if !res.status().is_success() {
        let status = res.status();
        let text = res.text().await.unwrap_or_default();
        return Err(ApiError::Upstream(format!(
            "RAG engine {} failed ({}): {}",
            path, status, text
        )));
    }
    res.json().await.map_err(|e| {
        ApiError::Upstream(format!("RAG engine {} returned invalid JSON: {}", path, e))
    })
}

/// Lenient decoding: a body whose `embeddings` is not an array of numeric
/// arrays contributes no vectors instead of failing.
pub fn parse_embed_response(payload: &Value) -> EmbedResponse {
    let embeddings = payload
        .get("embeddings")
        .and_then(|v| v.as_array())
        .map(|rows| {
            rows.iter()
                .filter_map(|row| row.as_array())
                .map(|vals| {
                    vals.iter()
                        .filter_map(|v| v.as_f64().map(|f| f as f32))
                        .collect::<Vec<f32>>()
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let dimension = payload
        .get("dimension")
        .and_then(|v| v.as_u64())
        .map(|d| d as usize);

    EmbedResponse {
        embeddings,
        dimension,
    }
}

fn parse_ingest_response(payload: &Value) -> Result<IngestResult, ApiError> {
    let id = match payload.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            return Err(ApiError::Upstream(
                "RAG engine /rag/ingest response has no id".to_string(),
            ))
        }
    };
    let vector_dimension = payload
        .get("vector_dim")
        .and_then(|v| v.as_u64())
        .map(|d| d as usize);
    Ok(IngestResult {
        id,
        vector_dimension,
    })
}
