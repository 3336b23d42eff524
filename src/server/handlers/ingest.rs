use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::rag::ingest::scalar_metadata;
use crate::rag::{normalize, Metadata};
use crate::state::AppState;

const UPLOAD_SOURCE_TAG: &str = "upload";

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub messages: Option<Vec<String>>,
    pub metadata: Option<Metadata>,
}

pub async fn ingest(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<IngestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let messages = payload
        .messages
        .filter(|messages| !messages.is_empty())
        .ok_or_else(|| ApiError::BadRequest("messages[] is required".to_string()))?;

    let result = state
        .ingest
        .ingest_single(messages, scalar_metadata(payload.metadata))
        .await?;
    Ok(Json(result))
}

pub async fn ingest_batch(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {}", e)))?;
        upload = Some((file_name, data.to_vec()));
        break;
    }

    let (file_name, data) = upload
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| ApiError::BadRequest("file is required".to_string()))?;
    if data.is_empty() {
        return Err(ApiError::BadRequest("file is empty".to_string()));
    }

    let records = normalize(&file_name, &data)?;
    tracing::info!(
        "Parsed {} conversations from upload '{}'",
        records.len(),
        file_name
    );

    let summary = state.ingest.ingest_batch(records, UPLOAD_SOURCE_TAG).await?;
    Ok(Json(summary))
}
