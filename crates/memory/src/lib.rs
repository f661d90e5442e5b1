//! Storage implementations for ragchat: session stores, vector indexes,
//! document ingestion, and the PostgreSQL query executor.

pub mod file_backend;
pub mod in_memory;
pub mod in_memory_index;
pub mod ingest;
pub mod opensearch;
pub mod vector;

#[cfg(feature = "postgres")]
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use ragchat_config::AppConfig;
use ragchat_core::error::RetrievalError;
use ragchat_core::retrieval::VectorIndex;
use ragchat_core::session::SessionStore;

pub use file_backend::FileSessionStore;
pub use in_memory::InMemorySessionStore;
pub use in_memory_index::InMemoryVectorIndex;
pub use ingest::{IngestReport, Ingestor};
pub use opensearch::OpenSearchIndex;
pub use vector::{cosine_similarity, vector_search};

#[cfg(feature = "postgres")]
pub use postgres::PostgresExecutor;

/// Build the session store selected by `sessions.backend`.
pub fn session_store_from_config(config: &AppConfig) -> Arc<dyn SessionStore> {
    match config.sessions.backend.as_str() {
        "file" => Arc::new(FileSessionStore::new(config.sessions_dir())),
        _ => Arc::new(InMemorySessionStore::new()),
    }
}

/// Build the vector index selected by `retrieval.backend`.
pub fn vector_index_from_config(config: &AppConfig) -> Result<Arc<dyn VectorIndex>, RetrievalError> {
    match config.retrieval.backend.as_str() {
        "opensearch" => Ok(Arc::new(OpenSearchIndex::from_config(
            &config.retrieval.opensearch,
            Duration::from_secs(config.timeouts.retrieval_secs),
        )?)),
        _ => Ok(Arc::new(InMemoryVectorIndex::new())),
    }
}
