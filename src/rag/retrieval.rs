//! Retrieval orchestrator: embed the question, query the store, zip the hits.

use std::sync::Arc;

use super::embedder::Embedder;
use super::store::{QueryInput, QueryRequest, QueryResult, VectorStore};
use super::types::{IncludeSet, RetrievalHit};
use crate::core::errors::ApiError;

#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    default_top_k: usize,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        default_top_k: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            default_top_k: default_top_k.max(1),
        }
    }

    /// Returns up to `top_k` hits, nearest first.
    ///
    /// A failed or malformed embedding call does not fail retrieval: the store
    /// is queried with an empty embedding batch and zero hits come back. Store
    /// failures are returned to the caller.
    pub async fn retrieve(
        &self,
        collection: &str,
        question: &str,
        top_k: Option<usize>,
        include: &IncludeSet,
    ) -> Result<Vec<RetrievalHit>, ApiError> {
        let query_embeddings = self.embed_question(question).await;

        let request = QueryRequest {
            input: QueryInput::Embeddings(query_embeddings),
            n_results: top_k.filter(|k| *k > 0).unwrap_or(self.default_top_k),
            include: include.clone().or(IncludeSet::query_default()),
        };
        tracing::debug!(
            "Querying '{}' for {} results (include: {:?})",
            collection,
            request.n_results,
            request.include.as_wire()
        );

        let result = self.store.query(collection, request).await?;
        let hits = zip_hits(result);
        tracing::debug!("Retrieved {} hits from '{}'", hits.len(), collection);
        Ok(hits)
    }

    async fn embed_question(&self, question: &str) -> Vec<Vec<f32>> {
        match self.embedder.embed(&[question.to_string()]).await {
            Ok(response) => match response.embeddings.into_iter().next() {
                Some(vector) if !vector.is_empty() => vec![vector],
                _ => {
                    tracing::warn!("Embedding service returned no vector for the question");
                    Vec::new()
                }
            },
            Err(err) => {
                tracing::warn!("Question embedding failed, continuing without it: {}", err);
                Vec::new()
            }
        }
    }
}

/// Zips the parallel arrays of the first query into hits.
///
/// Missing optional arrays or short rows yield `None` fields; the hit count
/// always follows `ids`.
pub fn zip_hits(result: QueryResult) -> Vec<RetrievalHit> {
    let QueryResult {
        ids,
        documents,
        metadatas,
        distances,
        ..
    } = result;

    let Some(ids) = ids.into_iter().next() else {
        return Vec::new();
    };
    let mut documents = first_row(documents);
    let mut metadatas = first_row(metadatas);
    let mut distances = first_row(distances);

    ids.into_iter()
        .enumerate()
        .map(|(i, id)| RetrievalHit {
            id,
            document: take_at(&mut documents, i),
            metadata: take_at(&mut metadatas, i),
            distance: take_at(&mut distances, i),
        })
        .collect()
}

fn first_row<T>(rows: Option<Vec<Vec<Option<T>>>>) -> Vec<Option<T>> {
    rows.and_then(|rows| rows.into_iter().next()).unwrap_or_default()
}

fn take_at<T>(row: &mut [Option<T>], index: usize) -> Option<T> {
    row.get_mut(index).and_then(Option::take)
}
