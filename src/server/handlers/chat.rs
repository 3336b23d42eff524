use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::rag::IncludeSet;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub collection: String,
    pub question: String,
    pub top_k: Option<usize>,
    #[serde(default)]
    pub include: Vec<String>,
}

pub async fn answer(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AnswerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let collection = payload.collection.trim();
    if collection.is_empty() {
        return Err(ApiError::BadRequest("collection is required".to_string()));
    }
    let question = payload.question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest("question is required".to_string()));
    }

    let include = IncludeSet::from_wire(&payload.include);
    let hits = state
        .retriever
        .retrieve(collection, question, payload.top_k, &include)
        .await?;
    let result = state.composer.compose(question, hits).await;

    Ok(Json(result))
}
