//! Context retrieval: embed a query, then search one category of the index.

use std::sync::Arc;
use std::time::Duration;

use ragchat_config::{AppConfig, MAX_TOP_K};
use ragchat_core::error::{Error, RetrievalError, StateError};
use ragchat_core::provider::{EmbeddingRequest, Provider};
use ragchat_core::retrieval::{Category, RetrievalResult, SearchRequest, VectorIndex};
use tracing::debug;

/// Check a retrieval request before any network call is made.
pub fn validate_request(query: &str, top_k: usize) -> Result<(), Error> {
    if query.trim().is_empty() {
        return Err(Error::validation("query must not be empty"));
    }
    if !(1..=MAX_TOP_K).contains(&top_k) {
        return Err(Error::validation(format!(
            "top_k must be between 1 and {MAX_TOP_K}, got {top_k}"
        )));
    }
    Ok(())
}

/// Fetches the passages most similar to a query.
pub struct ContextRetriever {
    embedder: Arc<dyn Provider>,
    index: Arc<dyn VectorIndex>,
    embedding_model: String,
    dimension: usize,
    timeout: Duration,
}

impl ContextRetriever {
    pub fn new(
        embedder: Arc<dyn Provider>,
        index: Arc<dyn VectorIndex>,
        embedding_model: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            embedding_model: embedding_model.into(),
            dimension,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(
        embedder: Arc<dyn Provider>,
        index: Arc<dyn VectorIndex>,
        config: &AppConfig,
    ) -> Self {
        Self::new(
            embedder,
            index,
            &config.embedding.model,
            config.embedding.dimension,
        )
        .with_timeout(Duration::from_secs(config.timeouts.retrieval_secs))
    }

    /// Bound each embedding and search call (default: 30s).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Up to `top_k` passages of `category`, best match first.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        category: Category,
    ) -> Result<Vec<RetrievalResult>, Error> {
        validate_request(query, top_k)?;

        let vector = self.embed(query.trim()).await?;

        let request = SearchRequest {
            vector,
            k: top_k,
            category,
        };
        let mut hits = tokio::time::timeout(self.timeout, self.index.search(request))
            .await
            .map_err(|_| RetrievalError::Timeout(self.timeout.as_secs()))??;

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);

        debug!(
            index = self.index.name(),
            category = %category,
            top_k,
            hits = hits.len(),
            "Retrieved context"
        );

        Ok(hits.into_iter().map(RetrievalResult::from).collect())
    }

    /// The single best passage of `category`.
    ///
    /// Fails with [`StateError::NoContext`] when the category has no match.
    pub async fn retrieve_top(
        &self,
        query: &str,
        top_k: usize,
        category: Category,
    ) -> Result<RetrievalResult, Error> {
        self.retrieve(query, top_k, category)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                StateError::NoContext {
                    category: category.as_tag().to_string(),
                }
                .into()
            })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let request = EmbeddingRequest {
            model: self.embedding_model.clone(),
            inputs: vec![text.to_string()],
        };

        let response = tokio::time::timeout(self.timeout, self.embedder.embed(request))
            .await
            .map_err(|_| RetrievalError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        let vector = response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::Embedding("malformed response: no embedding".into()))?;

        if vector.len() != self.dimension {
            return Err(RetrievalError::Embedding(format!(
                "malformed response: expected dimension {}, got {}",
                self.dimension,
                vector.len()
            )));
        }

        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{KeywordEmbedder, MockIndex, seeded_index};
    use ragchat_core::ErrorKind;

    fn retriever(index: Arc<dyn VectorIndex>) -> ContextRetriever {
        ContextRetriever::new(Arc::new(KeywordEmbedder), index, "embed", KeywordEmbedder::DIM)
    }

    #[tokio::test]
    async fn retrieves_best_match_first() {
        let retriever = retriever(seeded_index().await);
        let results = retriever
            .retrieve("how fast do orders ship", 5, Category::DomainKnowledge)
            .await
            .unwrap();

        assert!(!results.is_empty());
        assert_eq!(results[0].source_tag, "domain_knowledge");
        assert!(results[0].text.contains("ship"));
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn results_are_restricted_to_the_category() {
        let retriever = retriever(seeded_index().await);
        let results = retriever
            .retrieve("ship orders", 20, Category::Instruction)
            .await
            .unwrap();
        assert!(results.iter().all(|r| r.source_tag == "instruction"));
    }

    #[tokio::test]
    async fn invalid_requests_fail_before_any_call() {
        let index = Arc::new(MockIndex::empty());
        let retriever = ContextRetriever::new(
            Arc::new(crate::test_helpers::FailingProvider),
            index.clone(),
            "embed",
            3,
        );

        for (query, top_k) in [("", 5), ("   ", 5), ("ok", 0), ("ok", 21)] {
            let err = retriever
                .retrieve(query, top_k, Category::Instruction)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "query={query:?} top_k={top_k}");
        }
        assert_eq!(index.search_calls(), 0);
    }

    #[tokio::test]
    async fn boundary_top_k_values_are_accepted() {
        let retriever = retriever(seeded_index().await);
        for top_k in [1, 20] {
            retriever
                .retrieve("orders", top_k, Category::DomainKnowledge)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn dimension_mismatch_is_a_collaborator_error() {
        let retriever = ContextRetriever::new(
            Arc::new(KeywordEmbedder),
            seeded_index().await,
            "embed",
            KeywordEmbedder::DIM + 1,
        );
        let err = retriever
            .retrieve("orders", 5, Category::DomainKnowledge)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Retrieval(RetrievalError::Embedding(_))));
        assert_eq!(err.kind(), ErrorKind::Collaborator);
    }

    #[tokio::test]
    async fn embedding_failure_is_a_collaborator_error() {
        let retriever = ContextRetriever::new(
            Arc::new(crate::test_helpers::FailingProvider),
            Arc::new(MockIndex::empty()),
            "embed",
            3,
        );
        let err = retriever
            .retrieve("orders", 5, Category::Instruction)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Retrieval(RetrievalError::Embedding(_))));
    }

    #[tokio::test]
    async fn search_failure_is_a_collaborator_error() {
        let retriever = retriever(Arc::new(MockIndex::failing()));
        let err = retriever
            .retrieve("orders", 5, Category::Instruction)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Retrieval(RetrievalError::Search(_))));
    }

    #[tokio::test]
    async fn top_of_empty_category_is_no_context() {
        let retriever = retriever(Arc::new(MockIndex::empty()));
        let err = retriever
            .retrieve_top("orders", 5, Category::DomainKnowledge)
            .await
            .unwrap_err();
        match err {
            Error::State(StateError::NoContext { category }) => {
                assert_eq!(category, "domain_knowledge")
            }
            other => panic!("expected NoContext, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn top_returns_first_result() {
        let retriever = retriever(seeded_index().await);
        let top = retriever
            .retrieve_top("write sql select", 5, Category::Instruction)
            .await
            .unwrap();
        assert_eq!(top.source_tag, "instruction");
        assert!(top.text.contains("SELECT"));
    }
}
