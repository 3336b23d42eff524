use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "started_at": state.started_at,
        "generator_configured": state.composer.has_generator(),
        "ingest_backend": state.settings.ingest_backend,
    }))
}
