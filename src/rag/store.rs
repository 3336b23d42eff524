//! VectorStore trait: the seam over the vector database.
//!
//! The pipeline only reads and writes through this trait. The primary
//! implementation is `ChromaStore` in the `chroma` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{IncludeSet, Metadata};
use crate::core::errors::ApiError;

/// A named collection as reported by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Records returned by a plain `get`. Optional arrays are absent unless requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetResult {
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default)]
    pub documents: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub metadatas: Option<Vec<Option<Metadata>>>,
    #[serde(default)]
    pub embeddings: Option<Vec<Option<Vec<f32>>>>,
}

/// Ranked results, one inner list per query.
///
/// Index `i` of each inner list refers to the same hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub ids: Vec<Vec<String>>,
    #[serde(default)]
    pub documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    pub metadatas: Option<Vec<Vec<Option<Metadata>>>>,
    #[serde(default)]
    pub distances: Option<Vec<Vec<Option<f64>>>>,
    #[serde(default)]
    pub embeddings: Option<Vec<Vec<Option<Vec<f32>>>>>,
}

/// Parallel arrays for an `add` call. `ids` drives the record count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddRecords {
    pub ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<Vec<f32>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "metadata")]
    pub metadatas: Option<Vec<Metadata>>,
}

impl AddRecords {
    /// Checks that every supplied optional array matches `ids` in length.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.ids.is_empty() {
            return Err(ApiError::BadRequest("ids[] is required".to_string()));
        }
        let expected = self.ids.len();
        let lengths = [
            ("embeddings", self.embeddings.as_ref().map(Vec::len)),
            ("documents", self.documents.as_ref().map(Vec::len)),
            ("metadatas", self.metadatas.as_ref().map(Vec::len)),
        ];
        for (name, len) in lengths {
            if let Some(len) = len {
                if len != expected {
                    return Err(ApiError::BadRequest(format!(
                        "{} has {} entries but ids has {}",
                        name, len, expected
                    )));
                }
            }
        }
        Ok(())
    }
}

/// What a similarity query searches with.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryInput {
    Embeddings(Vec<Vec<f32>>),
    Texts(Vec<String>),
}

impl QueryInput {
    pub fn is_empty(&self) -> bool {
        match self {
            QueryInput::Embeddings(items) => items.is_empty(),
            QueryInput::Texts(items) => items.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub input: QueryInput,
    pub n_results: usize,
    pub include: IncludeSet,
}

/// Abstract trait for vector storage backends.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Names of all collections.
    async fn list_collections(&self) -> Result<Vec<String>, ApiError>;

    /// Create a collection, failing if it already exists.
    async fn create_collection(&self, name: &str) -> Result<CollectionInfo, ApiError>;

    /// Fetch a collection, creating it when missing.
    async fn get_or_create(&self, name: &str) -> Result<CollectionInfo, ApiError>;

    /// List up to `limit` records of a collection.
    async fn get(
        &self,
        collection: &str,
        limit: usize,
        include: &IncludeSet,
    ) -> Result<GetResult, ApiError>;

    /// Append records to a collection.
    async fn add(&self, collection: &str, records: AddRecords) -> Result<(), ApiError>;

    /// Nearest-neighbour search. An empty query batch yields an empty result.
    async fn query(&self, collection: &str, request: QueryRequest)
        -> Result<QueryResult, ApiError>;
}
