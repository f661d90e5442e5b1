//! Vector index trait — similarity search over categorized documents.
//!
//! Documents are tagged with a [`Category`] at indexing time; every search is
//! restricted to exactly one category.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RetrievalError;

/// Which corpus a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// How the model should behave / write queries.
    Instruction,
    /// Facts about the business domain.
    DomainKnowledge,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Instruction, Category::DomainKnowledge];

    /// The tag stored in the index's `source_file` field.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Category::Instruction => "instruction",
            Category::DomainKnowledge => "domain_knowledge",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "instruction" => Some(Category::Instruction),
            "domain_knowledge" => Some(Category::DomainKnowledge),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// One retrieved passage, ready to be composed into a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub source_tag: String,
    pub text: String,
    pub score: f32,
}

/// A document as stored in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub id: String,
    pub text: String,
    pub category: Category,
    pub embedding: Vec<f32>,
}

/// A k-NN search request.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub vector: Vec<f32>,
    pub k: usize,
    pub category: Category,
}

/// A ranked search hit returned by an index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    pub source_tag: String,
    pub score: f32,
}

impl From<SearchHit> for RetrievalResult {
    fn from(hit: SearchHit) -> Self {
        Self {
            source_tag: hit.source_tag,
            text: hit.text,
            score: hit.score,
        }
    }
}

/// The vector search backend.
///
/// Implementations: in-memory cosine index, OpenSearch k-NN.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// The backend name (e.g., "in_memory", "opensearch").
    fn name(&self) -> &str;

    /// Return up to `k` hits in `category`, ordered by descending score.
    async fn search(&self, request: SearchRequest) -> Result<Vec<SearchHit>, RetrievalError>;

    /// Insert or replace a document. Returns the stored id.
    async fn index(&self, document: IndexedDocument) -> Result<String, RetrievalError>;

    /// Number of indexed documents.
    async fn count(&self) -> Result<usize, RetrievalError>;

    /// Health check — is the backend reachable?
    async fn ping(&self) -> Result<bool, RetrievalError> {
        Ok(true)
    }
}
