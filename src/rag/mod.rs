//! RAG (Retrieval-Augmented Generation) pipeline.
//!
//! This module provides:
//! - `normalizer`: uploaded batches → conversation records
//! - `IngestOrchestrator`: records → storage collaborator, in order
//! - `Retriever`: question → nearest stored passages
//! - `AnswerComposer`: passages → answer, with a deterministic fallback
//! - collaborator seams (`VectorStore`, `Embedder`, `ConversationIngestor`)
//!   and their HTTP/in-process implementations

pub mod chroma;
pub mod composer;
pub mod embedder;
pub mod engine;
pub mod ingest;
pub mod local;
pub mod normalizer;
pub mod preprocess;
pub mod retrieval;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use chroma::ChromaStore;
pub use composer::AnswerComposer;
pub use embedder::{ConversationIngestor, EmbedResponse, Embedder};
pub use engine::EngineClient;
pub use ingest::IngestOrchestrator;
pub use local::LocalIngestor;
pub use normalizer::normalize;
pub use preprocess::Preprocessor;
pub use retrieval::Retriever;
pub use store::{AddRecords, CollectionInfo, GetResult, QueryInput, QueryRequest, QueryResult, VectorStore};
pub use types::{
    AnswerResult, BatchIngestSummary, ConversationRecord, IncludeField, IncludeSet, IngestResult,
    Metadata, RetrievalHit,
};
