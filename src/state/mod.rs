use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::config::{AppPaths, IngestBackend, Settings};
use crate::llm::{Generator, OpenAiCompatGenerator};
use crate::rag::{
    AnswerComposer, ChromaStore, ConversationIngestor, Embedder, EngineClient,
    IngestOrchestrator, LocalIngestor, Preprocessor, Retriever, VectorStore,
};

pub mod error;

use error::InitializationError;

/// Application state shared across all routes.
///
/// Every collaborator handle is created here once and injected into the
/// orchestrators; nothing reaches for a global client.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<dyn VectorStore>,
    pub retriever: Retriever,
    pub composer: AnswerComposer,
    pub ingest: IngestOrchestrator,
    pub started_at: DateTime<Utc>,
}

/// The collaborators an [`AppState`] is assembled from.
pub struct Collaborators {
    pub store: Arc<dyn VectorStore>,
    pub embedder: Arc<dyn Embedder>,
    pub ingestor: Arc<dyn ConversationIngestor>,
    pub generator: Option<Arc<dyn Generator>>,
}

impl AppState {
    /// Loads settings and wires the HTTP-backed collaborators.
    pub fn initialize(paths: &AppPaths) -> Result<Arc<Self>, InitializationError> {
        let settings = Settings::load(paths)?;
        Self::from_settings(settings)
    }

    pub fn from_settings(settings: Settings) -> Result<Arc<Self>, InitializationError> {
        let client = reqwest::Client::builder()
            .timeout(settings.http_timeout())
            .build()
            .map_err(InitializationError::HttpClient)?;

        let store: Arc<dyn VectorStore> =
            Arc::new(ChromaStore::new(settings.chroma_url(), client.clone()));
        let engine = Arc::new(EngineClient::new(settings.rag_engine_url(), client.clone()));
        let embedder: Arc<dyn Embedder> = engine.clone();

        let generator = match settings.generator() {
            Some(generator_settings) => {
                let generator: Arc<dyn Generator> = Arc::new(OpenAiCompatGenerator::new(
                    &generator_settings,
                    client.clone(),
                ));
                Some(generator)
            }
            None => {
                tracing::info!("No generator API key configured; answers use retrieved context only");
                None
            }
        };

        let ingestor: Arc<dyn ConversationIngestor> = match settings.ingest_backend {
            IngestBackend::Engine => engine as Arc<dyn ConversationIngestor>,
            IngestBackend::Local => Arc::new(LocalIngestor::new(
                Preprocessor::new(generator.clone(), settings.openrouter_model.clone()),
                embedder.clone(),
                store.clone(),
                settings.chroma_collection.clone(),
            )),
        };

        Ok(Self::from_parts(
            settings,
            Collaborators {
                store,
                embedder,
                ingestor,
                generator,
            },
        ))
    }

    pub fn from_parts(settings: Settings, collaborators: Collaborators) -> Arc<Self> {
        let Collaborators {
            store,
            embedder,
            ingestor,
            generator,
        } = collaborators;

        let retriever = Retriever::new(embedder, store.clone(), settings.default_top_k);
        let composer = AnswerComposer::new(generator, settings.openrouter_model.clone());
        let ingest = IngestOrchestrator::new(ingestor);

        Arc::new(AppState {
            settings: Arc::new(settings),
            store,
            retriever,
            composer,
            ingest,
            started_at: Utc::now(),
        })
    }
}
