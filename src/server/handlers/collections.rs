use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::rag::{AddRecords, IncludeSet, QueryInput, QueryRequest};
use crate::state::AppState;

const DEFAULT_GET_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub struct CreateCollectionRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct GetRecordsQuery {
    pub limit: Option<usize>,
    /// Comma-separated include fields.
    pub include: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryCollectionRequest {
    pub query_embeddings: Option<Vec<Vec<f32>>>,
    pub query_texts: Option<Vec<String>>,
    pub n_results: Option<usize>,
    #[serde(default)]
    pub include: Vec<String>,
}

pub async fn list_collections(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let collections = state.store.list_collections().await?;
    Ok(Json(json!({ "collections": collections })))
}

pub async fn create_collection(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCollectionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("name is required".to_string()));
    }
    let collection = state.store.create_collection(name).await?;
    Ok(Json(collection))
}

pub async fn get_records(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<GetRecordsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_GET_LIMIT);
    let include = params
        .include
        .as_deref()
        .map(|raw| IncludeSet::from_wire(raw.split(',').map(str::trim)))
        .unwrap_or_default()
        .or(IncludeSet::get_default());

    let records = state.store.get(&name, limit, &include).await?;
    Ok(Json(records))
}

pub async fn add_records(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(records): Json<AddRecords>,
) -> Result<impl IntoResponse, ApiError> {
    records.validate()?;
    let count = records.ids.len();
    state.store.add(&name, records).await?;
    Ok(Json(json!({ "added": count })))
}

pub async fn query_collection(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(payload): Json<QueryCollectionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = match (payload.query_embeddings, payload.query_texts) {
        (Some(embeddings), _) => QueryInput::Embeddings(embeddings),
        (None, Some(texts)) => QueryInput::Texts(texts),
        (None, None) => {
            return Err(ApiError::BadRequest(
                "queryEmbeddings or queryTexts is required".to_string(),
            ))
        }
    };

    let request = QueryRequest {
        input,
        n_results: payload
            .n_results
            .filter(|n| *n > 0)
            .unwrap_or(state.settings.default_top_k),
        include: IncludeSet::from_wire(&payload.include).or(IncludeSet::query_default()),
    };
    let result = state.store.query(&name, request).await?;
    Ok(Json(result))
}
