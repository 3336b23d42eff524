use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("upstream error: {0}")]
    Upstream(String),
    #[error("upstream timeout: {0}")]
    Timeout(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else {
            ApiError::Upstream(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            ApiError::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg.clone()),
        };

        if status.is_server_error() {
            tracing::warn!("Request failed with {}: {}", status, message);
        }

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

/// Rejections raised while turning an uploaded batch into conversation records.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("unsupported file type (.txt/.json/.jsonl): {0}")]
    UnsupportedFormat(String),
    #[error("empty txt")]
    EmptyInput,
    #[error("invalid jsonl line {line}: {reason}")]
    InvalidLine { line: usize, reason: String },
    #[error("invalid json: {0}")]
    InvalidJson(String),
}

impl From<NormalizeError> for ApiError {
    fn from(err: NormalizeError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}
