use std::path::PathBuf;

use thiserror::Error;

use super::settings::Settings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {reason}")]
    Yaml { path: PathBuf, reason: String },
    #[error("{key} has an invalid value '{value}'")]
    Parse { key: &'static str, value: String },
    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    validate_host("CHROMA_HOST", &settings.chroma_host)?;
    validate_port("CHROMA_PORT", settings.chroma_port)?;
    validate_host("RAG_ENGINE_HOST", &settings.rag_engine_host)?;
    validate_port("RAG_ENGINE_PORT", settings.rag_engine_port)?;
    validate_host("HOST", &settings.server_host)?;

    if settings.chroma_collection.trim().is_empty() {
        return Err(invalid("CHROMA_COLLECTION", "must not be empty"));
    }

    validate_range("DEFAULT_TOP_K", settings.default_top_k as u64, 1, 1_000)?;
    validate_range("HTTP_TIMEOUT_SECS", settings.http_timeout_secs, 1, 3_600)?;
    validate_range(
        "MAX_UPLOAD_BYTES",
        settings.max_upload_bytes as u64,
        1,
        1_000_000_000,
    )?;

    let base_url = settings.openrouter_base_url.trim();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(invalid(
            "OPENROUTER_BASE_URL",
            "must start with http:// or https://",
        ));
    }

    if settings.openrouter_model.trim().is_empty() {
        return Err(invalid("OPENROUTER_MODEL", "must not be empty"));
    }

    Ok(())
}

fn validate_host(field: &'static str, host: &str) -> Result<(), ConfigError> {
    if host.trim().is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    if host.contains(char::is_whitespace) || host.contains('/') {
        return Err(invalid(field, "must be a bare host name"));
    }
    Ok(())
}

fn validate_port(field: &'static str, port: u16) -> Result<(), ConfigError> {
    if port == 0 {
        return Err(invalid(field, "must be a non-zero port"));
    }
    Ok(())
}

fn validate_range(field: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(invalid(
            field,
            &format!("must be between {} and {}", min, max),
        ));
    }
    Ok(())
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
