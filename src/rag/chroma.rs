//! Chroma vector store over its HTTP API.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::store::{
    AddRecords, CollectionInfo, GetResult, QueryInput, QueryRequest, QueryResult, VectorStore,
};
use super::types::IncludeSet;
use crate::core::errors::ApiError;

#[derive(Clone)]
pub struct ChromaStore {
    base_url: String,
    client: Client,
}

impl ChromaStore {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn collections_url(&self) -> String {
        format!("{}/api/v1/collections", self.base_url)
    }

    fn collection_url(&self, segment: &str) -> String {
        format!("{}/{}", self.collections_url(), urlencoding::encode(segment))
    }

    /// Resolves a collection by name. Record operations address collections by id.
    async fn collection(&self, name: &str) -> Result<CollectionInfo, ApiError> {
        let res = self.client.get(self.collection_url(name)).send().await?;
        read_json(res, &format!("collection '{}'", name)).await
    }

    async fn create(&self, name: &str, get_or_create: bool) -> Result<CollectionInfo, ApiError> {
        let body = json!({ "name": name, "get_or_create": get_or_create });
        let res = self
            .client
            .post(self.collections_url())
            .json(&body)
            .send()
            .await?;
        read_json(res, &format!("create collection '{}'", name)).await
    }
}

#[async_trait]
impl VectorStore for ChromaStore {
    async fn list_collections(&self) -> Result<Vec<String>, ApiError> {
        let res = self.client.get(self.collections_url()).send().await?;
        let collections: Vec<Value> = read_json(res, "list collections").await?;
        Ok(collections
            .into_iter()
            .filter_map(|c| match c {
                Value::String(name) => Some(name),
                other => other
                    .get("name")
                    .and_then(|n| n.as_str())
                    .map(str::to_string),
            })
            .collect())
    }

    async fn create_collection(&self, name: &str) -> Result<CollectionInfo, ApiError> {
        self.create(name, false).await
    }

    async fn get_or_create(&self, name: &str) -> Result<CollectionInfo, ApiError> {
        self.create(name, true).await
    }

    async fn get(
        &self,
        collection: &str,
        limit: usize,
        include: &IncludeSet,
    ) -> Result<GetResult, ApiError> {
        let info = self.collection(collection).await?;
        let include = include.clone().or(IncludeSet::get_default());
        let body = json!({ "limit": limit, "include": include.as_wire() });
        let res = self
            .client
            .post(format!("{}/get", self.collection_url(&info.id)))
            .json(&body)
            .send()
            .await?;
        read_json(res, &format!("get from '{}'", collection)).await
    }

    async fn add(&self, collection: &str, records: AddRecords) -> Result<(), ApiError> {
        records.validate()?;
        let info = self.collection(collection).await?;
        let res = self
            .client
            .post(format!("{}/add", self.collection_url(&info.id)))
            .json(&records)
            .send()
            .await?;
        let _: Value = read_json(res, &format!("add to '{}'", collection)).await?;
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        request: QueryRequest,
    ) -> Result<QueryResult, ApiError> {
        // Chroma rejects an empty query batch; zero queries have zero results.
        if request.input.is_empty() {
            tracing::debug!("Empty query batch for '{}'; returning no results", collection);
            return Ok(QueryResult::default());
        }

        let info = self.collection(collection).await?;
        let body = query_body(&request);
        let res = self
            .client
            .post(format!("{}/query", self.collection_url(&info.id)))
            .json(&body)
            .send()
            .await?;
        read_json(res, &format!("query '{}'", collection)).await
    }
}

fn query_body(request: &QueryRequest) -> Value {
    let mut body = json!({
        "n_results": request.n_results,
        "include": request.include.as_wire(),
    });
    if let Some(obj) = body.as_object_mut() {
        match &request.input {
            QueryInput::Embeddings(embeddings) => {
                obj.insert("query_embeddings".to_string(), json!(embeddings));
            }
            QueryInput::Texts(texts) => {
                obj.insert("query_texts".to_string(), json!(texts));
            }
        }
    }
    body
}

async fn read_json<T: DeserializeOwned>(res: Response, what: &str) -> Result<T, ApiError> {
    let status = res.status();
    if status.is_success() {
        return res.json::<T>().await.map_err(|e| {
            ApiError::Upstream(format!("Chroma {} returned a malformed body: {}", what, e))
        });
    }
    let text = res.text().await.unwrap_or_default();
    Err(classify_failure(status, &text, what))
}

fn classify_failure(status: StatusCode, body: &str, what: &str) -> ApiError {
    let lowered = body.to_lowercase();
    if status == StatusCode::NOT_FOUND || lowered.contains("does not exist") {
        ApiError::NotFound(format!("{} not found", what))
    } else if status == StatusCode::CONFLICT || lowered.contains("already exists") {
        ApiError::BadRequest(format!("{}: already exists", what))
    } else {
        ApiError::Upstream(format!("Chroma {} failed ({}): {}", what, status, body))
    }
}
