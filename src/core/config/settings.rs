use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::defaults;
use super::paths::AppPaths;
use super::validation::{validate_settings, ConfigError};

const REDACT_PLACEHOLDER: &str = "****";

/// Which collaborator performs the combined embed+add step of ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestBackend {
    /// Remote RAG engine exposing `POST /rag/ingest`.
    Engine,
    /// In-process preprocess, embed and add against the vector store.
    Local,
}

impl FromStr for IngestBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "engine" => Ok(IngestBackend::Engine),
            "local" => Ok(IngestBackend::Local),
            other => Err(format!("unknown ingest backend '{other}'")),
        }
    }
}

/// Connection details for the generative model. Present only when an API key is set.
#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub api_key: String,
    pub base_url: String,
}

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub chroma_host: String,
    pub chroma_port: u16,
    pub chroma_collection: String,
    pub rag_engine_host: String,
    pub rag_engine_port: u16,
    pub openrouter_api_key: Option<String>,
    pub openrouter_base_url: String,
    pub openrouter_model: String,
    pub default_top_k: usize,
    pub http_timeout_secs: u64,
    pub ingest_backend: IngestBackend,
    pub max_upload_bytes: usize,
    pub server_host: String,
    pub server_port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chroma_host: defaults::CHROMA_HOST.to_string(),
            chroma_port: defaults::CHROMA_PORT,
            chroma_collection: defaults::CHROMA_COLLECTION.to_string(),
            rag_engine_host: defaults::RAG_ENGINE_HOST.to_string(),
            rag_engine_port: defaults::RAG_ENGINE_PORT,
            openrouter_api_key: None,
            openrouter_base_url: defaults::OPENROUTER_BASE_URL.to_string(),
            openrouter_model: defaults::OPENROUTER_MODEL.to_string(),
            default_top_k: defaults::DEFAULT_TOP_K,
            http_timeout_secs: defaults::HTTP_TIMEOUT_SECS,
            ingest_backend: IngestBackend::Engine,
            max_upload_bytes: defaults::MAX_UPLOAD_BYTES,
            server_host: defaults::SERVER_HOST.to_string(),
            server_port: defaults::SERVER_PORT,
            cors_origins: Vec::new(),
        }
    }
}

impl Settings {
    /// Loads the YAML overlay (if any), applies the process environment on top and validates.
    pub fn load(paths: &AppPaths) -> Result<Self, ConfigError> {
        let file = load_yaml_file(&paths.config_path())?;
        Self::from_sources(&file, |key| env::var(key).ok())
    }

    /// Builds settings from a parsed config file and an environment lookup.
    ///
    /// Keys are looked up as upper-case environment names first, then as the
    /// lower-case key of the file mapping.
    pub fn from_sources<F>(file: &Value, env_lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = Source { file, env_lookup };
        let mut settings = Settings::default();

        source.string("CHROMA_HOST", &mut settings.chroma_host);
        source.parse("CHROMA_PORT", &mut settings.chroma_port)?;
        source.string("CHROMA_COLLECTION", &mut settings.chroma_collection);
        source.string("RAG_ENGINE_HOST", &mut settings.rag_engine_host);
        source.parse("RAG_ENGINE_PORT", &mut settings.rag_engine_port)?;
        settings.openrouter_api_key = source
            .get("OPENROUTER_API_KEY")
            .filter(|key| !key.trim().is_empty());
        source.string("OPENROUTER_BASE_URL", &mut settings.openrouter_base_url);
        source.string("OPENROUTER_MODEL", &mut settings.openrouter_model);
        source.parse("DEFAULT_TOP_K", &mut settings.default_top_k)?;
        source.parse("HTTP_TIMEOUT_SECS", &mut settings.http_timeout_secs)?;
        source.parse("INGEST_BACKEND", &mut settings.ingest_backend)?;
        source.parse("MAX_UPLOAD_BYTES", &mut settings.max_upload_bytes)?;
        source.string("HOST", &mut settings.server_host);
        source.parse("PORT", &mut settings.server_port)?;
        if let Some(origins) = source.get("CORS_ORIGIN") {
            settings.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect();
        }

        validate_settings(&settings)?;
        Ok(settings)
    }

    pub fn chroma_url(&self) -> String {
        format!("http://{}:{}", self.chroma_host, self.chroma_port)
    }

    pub fn rag_engine_url(&self) -> String {
        format!("http://{}:{}", self.rag_engine_host, self.rag_engine_port)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn generator(&self) -> Option<GeneratorSettings> {
        self.openrouter_api_key
            .as_ref()
            .map(|api_key| GeneratorSettings {
                api_key: api_key.clone(),
                base_url: self.openrouter_base_url.trim_end_matches('/').to_string(),
            })
    }

    /// JSON view of the settings with secrets masked, safe to log.
    pub fn redacted(&self) -> Value {
        json!({
            "chroma_url": self.chroma_url(),
            "chroma_collection": self.chroma_collection,
            "rag_engine_url": self.rag_engine_url(),
            "openrouter_api_key": self.openrouter_api_key.as_ref().map(|_| REDACT_PLACEHOLDER),
            "openrouter_base_url": self.openrouter_base_url,
            "openrouter_model": self.openrouter_model,
            "default_top_k": self.default_top_k,
            "http_timeout_secs": self.http_timeout_secs,
            "ingest_backend": self.ingest_backend,
            "max_upload_bytes": self.max_upload_bytes,
            "bind_addr": self.bind_addr(),
            "cors_origins": self.cors_origins,
        })
    }
}

struct Source<'a, F> {
    file: &'a Value,
    env_lookup: F,
}

impl<F> Source<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = (self.env_lookup)(key) {
            return Some(value);
        }
        match self.file.get(key.to_ascii_lowercase()) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .filter_map(|item| item.as_str())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            _ => None,
        }
    }

    fn string(&self, key: &str, target: &mut String) {
        if let Some(value) = self.get(key) {
            let value = value.trim();
            *target = value.to_string();
        }
    }

    fn parse<T>(&self, key: &'static str, target: &mut T) -> Result<(), ConfigError>
    where
        T: FromStr,
    {
        if let Some(raw) = self.get(key) {
            *target = raw.trim().parse().map_err(|_| ConfigError::Parse {
                key,
                value: raw.clone(),
            })?;
        }
        Ok(())
    }
}

fn load_yaml_file(path: &Path) -> Result<Value, ConfigError> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    match serde_yaml::from_str::<Value>(&contents) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(Value::Null) => Ok(Value::Object(Map::new())),
        Ok(_) => Err(ConfigError::Invalid {
            field: "config",
            reason: format!("{} must contain a mapping", path.display()),
        }),
        Err(err) => Err(ConfigError::Yaml {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }),
    }
}
