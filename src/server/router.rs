use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{chat, collections, health, ingest};
use crate::state::AppState;

/// Creates the main application router with all routes and middleware.
///
/// This function sets up:
/// - CORS middleware
/// - Health check endpoint
/// - Answer, ingestion and collection endpoints
///
/// # Arguments
///
/// * `state` - Shared application state
pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.settings.cors_origins);
    let body_limit = DefaultBodyLimit::max(state.settings.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health))
        .route("/chat/answer", post(chat::answer))
        .route("/rag/ingest", post(ingest::ingest))
        .route("/rag/ingest-batch", post(ingest::ingest_batch))
        .route(
            "/chroma/collections",
            get(collections::list_collections).post(collections::create_collection),
        )
        .route("/chroma/collections/:name", get(collections::get_records))
        .route(
            "/chroma/collections/:name/add",
            post(collections::add_records),
        )
        .route(
            "/chroma/collections/:name/query",
            post(collections::query_collection),
        )
        .with_state(state)
        .layer(body_limit)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

/// An empty origin list allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allowed_origins = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE]);

    if allowed_origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer
            .allow_origin(AllowOrigin::list(allowed_origins))
            .allow_credentials(true)
    }
}
