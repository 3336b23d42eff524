//! In-memory collaborators for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::embedder::{ConversationIngestor, EmbedResponse, Embedder};
use super::store::{AddRecords, CollectionInfo, GetResult, QueryRequest, QueryResult, VectorStore};
use super::types::{IncludeSet, IngestResult, Metadata};
use crate::core::errors::ApiError;
use crate::llm::{GenerationParams, Generator};

/// Assigns `id-1`, `id-2`, ... and optionally fails on the n-th call.
#[derive(Default)]
pub struct FakeIngestor {
    counter: AtomicUsize,
    fail_on: Option<usize>,
    calls: Mutex<Vec<(Vec<String>, Metadata)>>,
}

impl FakeIngestor {
    pub fn failing_at(call: usize) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(Vec<String>, Metadata)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConversationIngestor for FakeIngestor {
    async fn ingest(
        &self,
        messages: &[String],
        metadata: Metadata,
    ) -> Result<IngestResult, ApiError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls.lock().unwrap().push((messages.to_vec(), metadata));
        if self.fail_on == Some(n) {
            return Err(ApiError::Upstream("engine unavailable".to_string()));
        }
        Ok(IngestResult {
            id: format!("id-{}", n),
            vector_dimension: Some(3),
        })
    }
}

pub enum EmbedBehavior {
    Vector(Vec<f32>),
    Malformed,
    Fail,
}

pub struct FakeEmbedder {
    behavior: EmbedBehavior,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeEmbedder {
    pub fn new(behavior: EmbedBehavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn returning(vector: Vec<f32>) -> Self {
        Self::new(EmbedBehavior::Vector(vector))
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ApiError> {
        self.calls.lock().unwrap().push(texts.to_vec());
        match &self.behavior {
            EmbedBehavior::Vector(v) => Ok(EmbedResponse {
                embeddings: texts.iter().map(|_| v.clone()).collect(),
                dimension: Some(v.len()),
            }),
            EmbedBehavior::Malformed => Ok(EmbedResponse::default()),
            EmbedBehavior::Fail => Err(ApiError::Timeout("embed timed out".to_string())),
        }
    }
}

/// Answers every query with a canned result and records adds.
#[derive(Default)]
pub struct FakeStore {
    query_result: QueryResult,
    queries: Mutex<Vec<(String, QueryRequest)>>,
    adds: Mutex<Vec<(String, AddRecords)>>,
    created: Mutex<Vec<String>>,
}

impl FakeStore {
    pub fn with_result(query_result: QueryResult) -> Self {
        Self {
            query_result,
            ..Self::default()
        }
    }

    pub fn queries(&self) -> Vec<(String, QueryRequest)> {
        self.queries.lock().unwrap().clone()
    }

    pub fn adds(&self) -> Vec<(String, AddRecords)> {
        self.adds.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorStore for FakeStore {
    async fn list_collections(&self) -> Result<Vec<String>, ApiError> {
        Ok(self.created())
    }

    async fn create_collection(&self, name: &str) -> Result<CollectionInfo, ApiError> {
        self.get_or_create(name).await
    }

    async fn get_or_create(&self, name: &str) -> Result<CollectionInfo, ApiError> {
        let mut created = self.created.lock().unwrap();
        if !created.iter().any(|c| c == name) {
            created.push(name.to_string());
        }
        Ok(CollectionInfo {
            id: format!("col-{}", name),
            name: name.to_string(),
            metadata: None,
        })
    }

    async fn get(
        &self,
        _collection: &str,
        _limit: usize,
        _include: &IncludeSet,
    ) -> Result<GetResult, ApiError> {
        Ok(GetResult::default())
    }

    async fn add(&self, collection: &str, records: AddRecords) -> Result<(), ApiError> {
        self.adds
            .lock()
            .unwrap()
            .push((collection.to_string(), records));
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        request: QueryRequest,
    ) -> Result<QueryResult, ApiError> {
        let empty = request.input.is_empty();
        self.queries
            .lock()
            .unwrap()
            .push((collection.to_string(), request));
        if empty {
            return Ok(QueryResult::default());
        }
        Ok(self.query_result.clone())
    }
}

pub enum GenerateBehavior {
    Reply(String),
    Fail,
}

pub struct FakeGenerator {
    behavior: GenerateBehavior,
    calls: Mutex<Vec<(String, String, GenerationParams)>>,
}

impl FakeGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            behavior: GenerateBehavior::Reply(text.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            behavior: GenerateBehavior::Fail,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, String, GenerationParams)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for FakeGenerator {
    fn name(&self) -> &str {
        "fake"
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, ApiError> {
        self.calls.lock().unwrap().push((
            system_prompt.to_string(),
            user_prompt.to_string(),
            params.clone(),
        ));
        match &self.behavior {
            GenerateBehavior::Reply(text) => Ok(text.clone()),
            GenerateBehavior::Fail => Err(ApiError::Upstream("502 from provider".to_string())),
        }
    }
}
