//! In-memory vector index — brute-force cosine search, useful for tests,
//! demos, and corpora small enough to seed at startup.

use std::sync::Arc;

use async_trait::async_trait;
use ragchat_core::error::RetrievalError;
use ragchat_core::retrieval::{IndexedDocument, SearchHit, SearchRequest, VectorIndex};
use tokio::sync::RwLock;

use crate::vector::vector_search;

/// A vector index that stores documents in a Vec.
pub struct InMemoryVectorIndex {
    documents: Arc<RwLock<Vec<IndexedDocument>>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryVectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn search(&self, request: SearchRequest) -> Result<Vec<SearchHit>, RetrievalError> {
        let documents = self.documents.read().await;
        Ok(vector_search(
            documents.iter(),
            &request.vector,
            request.category,
            request.k,
        ))
    }

    async fn index(&self, document: IndexedDocument) -> Result<String, RetrievalError> {
        if document.embedding.is_empty() {
            return Err(RetrievalError::Indexing(format!(
                "Document '{}' has an empty embedding",
                document.id
            )));
        }

        let id = document.id.clone();
        let mut documents = self.documents.write().await;
        match documents.iter_mut().find(|d| d.id == id) {
            Some(existing) => *existing = document,
            None => documents.push(document),
        }
        Ok(id)
    }

    async fn count(&self) -> Result<usize, RetrievalError> {
        Ok(self.documents.read().await.len())
    }
}
