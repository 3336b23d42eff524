//! Request-scoped records flowing through ingestion and answering.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Scalar metadata attached to a stored record.
pub type Metadata = Map<String, Value>;

/// An ordered sequence of message strings, e.g. alternating Q/A turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConversationRecord(Vec<String>);

impl ConversationRecord {
    pub fn new(messages: Vec<String>) -> Self {
        Self(messages)
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

}

/// Outcome of storing one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResult {
    pub id: String,
    #[serde(rename = "vector_dim", skip_serializing_if = "Option::is_none", default)]
    pub vector_dimension: Option<usize>,
}

/// Outcome of a batch upload; `items` follows input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchIngestSummary {
    pub count: usize,
    pub items: Vec<IngestResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub id: String,
    pub document: Option<String>,
    pub metadata: Option<Metadata>,
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerResult {
    pub answer: String,
    /// Every retrieved hit, nearest first.
    pub contexts: Vec<RetrievalHit>,
}

/// Optional result fields a caller may request from the vector store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncludeField {
    Documents,
    Embeddings,
    Metadatas,
    Distances,
}

impl IncludeField {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "documents" => Some(IncludeField::Documents),
            "embeddings" => Some(IncludeField::Embeddings),
            "metadatas" => Some(IncludeField::Metadatas),
            "distances" => Some(IncludeField::Distances),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IncludeField::Documents => "documents",
            IncludeField::Embeddings => "embeddings",
            IncludeField::Metadatas => "metadatas",
            IncludeField::Distances => "distances",
        }
    }
}

/// Ordered, duplicate-free set of [`IncludeField`]s.
///
/// Built from wire strings with unknown values dropped, so only recognised
/// fields ever reach the vector store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IncludeSet(Vec<IncludeField>);

impl IncludeSet {
    pub fn new<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = IncludeField>,
    {
        let mut set = IncludeSet::default();
        for field in fields {
            if !set.0.contains(&field) {
                set.0.push(field);
            }
        }
        set
    }

    pub fn from_wire<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(
            values
                .into_iter()
                .filter_map(|value| IncludeField::parse(value.as_ref())),
        )
    }

    /// Default for similarity queries.
    pub fn query_default() -> Self {
        Self::new([
            IncludeField::Documents,
            IncludeField::Metadatas,
            IncludeField::Distances,
        ])
    }

    /// Default for plain record listing.
    pub fn get_default() -> Self {
        Self::new([IncludeField::Documents, IncludeField::Metadatas])
    }

    pub fn or(self, fallback: IncludeSet) -> Self {
        if self.is_empty() {
            fallback
        } else {
            self
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_wire(&self) -> Vec<&'static str> {
        self.0.iter().map(IncludeField::as_str).collect()
    }
}
