#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use convo_rag::core::config::Settings;
use convo_rag::core::errors::ApiError;
use convo_rag::llm::{GenerationParams, Generator};
use convo_rag::rag::{
    AddRecords, CollectionInfo, ConversationIngestor, EmbedResponse, Embedder, GetResult,
    IncludeSet, IngestResult, Metadata, QueryRequest, QueryResult, VectorStore,
};
use convo_rag::server;
use convo_rag::state::{AppState, Collaborators};

pub struct StaticEmbedder;

#[async_trait]
impl Embedder for StaticEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ApiError> {
        Ok(EmbedResponse {
            embeddings: texts.iter().map(|_| vec![0.1, 0.2, 0.3]).collect(),
            dimension: Some(3),
        })
    }
}

#[derive(Default)]
pub struct CannedStore {
    pub result: QueryResult,
    pub queries: Mutex<Vec<QueryRequest>>,
    pub gets: Mutex<Vec<(String, usize, IncludeSet)>>,
}

#[async_trait]
impl VectorStore for CannedStore {
    async fn list_collections(&self) -> Result<Vec<String>, ApiError> {
        Ok(vec!["conversations".to_string()])
    }

    async fn create_collection(&self, name: &str) -> Result<CollectionInfo, ApiError> {
        Ok(CollectionInfo {
            id: "c-1".to_string(),
            name: name.to_string(),
            metadata: None,
        })
    }

    async fn get_or_create(&self, name: &str) -> Result<CollectionInfo, ApiError> {
        self.create_collection(name).await
    }

    async fn get(
        &self,
        collection: &str,
        limit: usize,
        include: &IncludeSet,
    ) -> Result<GetResult, ApiError> {
        if collection == "missing" {
            return Err(ApiError::NotFound("collection 'missing' not found".to_string()));
        }
        self.gets
            .lock()
            .unwrap()
            .push((collection.to_string(), limit, include.clone()));
        Ok(GetResult::default())
    }

    async fn add(&self, _collection: &str, _records: AddRecords) -> Result<(), ApiError> {
        Ok(())
    }

    async fn query(
        &self,
        _collection: &str,
        request: QueryRequest,
    ) -> Result<QueryResult, ApiError> {
        self.queries.lock().unwrap().push(request);
        Ok(self.result.clone())
    }
}

#[derive(Default)]
pub struct CountingIngestor {
    counter: AtomicUsize,
    pub calls: Mutex<Vec<(Vec<String>, Metadata)>>,
}

#[async_trait]
impl ConversationIngestor for CountingIngestor {
    async fn ingest(
        &self,
        messages: &[String],
        metadata: Metadata,
    ) -> Result<IngestResult, ApiError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.calls
            .lock()
            .unwrap()
            .push((messages.to_vec(), metadata));
        Ok(IngestResult {
            id: format!("conv-{}", n),
            vector_dimension: Some(3),
        })
    }
}

pub struct BrokenGenerator;

#[async_trait]
impl Generator for BrokenGenerator {
    fn name(&self) -> &str {
        "broken"
    }

    async fn complete(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _params: &GenerationParams,
    ) -> Result<String, ApiError> {
        Err(ApiError::Timeout("generator timed out".to_string()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<CannedStore>,
    pub ingestor: Arc<CountingIngestor>,
}

pub fn app(result: QueryResult, generator: Option<Arc<dyn Generator>>) -> TestApp {
    let store = Arc::new(CannedStore {
        result,
        ..CannedStore::default()
    });
    let ingestor = Arc::new(CountingIngestor::default());
    let state = AppState::from_parts(
        Settings::default(),
        Collaborators {
            store: store.clone(),
            embedder: Arc::new(StaticEmbedder),
            ingestor: ingestor.clone(),
            generator,
        },
    );
    TestApp {
        router: server::router(state),
        store,
        ingestor,
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn upload_request(file_name: &str, contents: &str) -> Request<Body> {
    let boundary = "convo-rag-test-boundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\nContent-Type: application/octet-stream\r\n\r\n{c}\r\n--{b}--\r\n",
        b = boundary,
        f = file_name,
        c = contents
    );
    Request::builder()
        .method("POST")
        .uri("/rag/ingest-batch")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}
