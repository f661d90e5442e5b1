//! Document ingestion — turns plain-text files into indexed documents.
//!
//! Every non-blank line of a file becomes one document. Its id is
//! `{tag}_{file_name}_{line_index}`, where the line index counts blank lines
//! too, so re-ingesting an unchanged file overwrites the same ids.

use std::path::Path;
use std::sync::Arc;

use ragchat_core::error::RetrievalError;
use ragchat_core::provider::{EmbeddingRequest, Provider};
use ragchat_core::retrieval::{Category, IndexedDocument, VectorIndex};
use serde::Serialize;
use tracing::{info, warn};

/// Outcome of ingesting one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub indexed: usize,
    pub skipped: usize,
}

/// Embeds lines with a provider and writes them into a vector index.
pub struct Ingestor {
    embedder: Arc<dyn Provider>,
    index: Arc<dyn VectorIndex>,
    model: String,
    dimension: usize,
}

impl Ingestor {
    pub fn new(
        embedder: Arc<dyn Provider>,
        index: Arc<dyn VectorIndex>,
        model: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            model: model.into(),
            dimension,
        }
    }

    /// Ingest a file under `category`.
    ///
    /// Fails only if the file cannot be read; a line that cannot be embedded
    /// or indexed is logged and counted as skipped.
    pub async fn ingest_file(
        &self,
        path: &Path,
        category: Category,
    ) -> Result<IngestReport, RetrievalError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            RetrievalError::Indexing(format!("Cannot read {}: {e}", path.display()))
        })?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        info!(file = %path.display(), category = %category, "Ingesting file");
        let report = self.ingest_text(&content, &file_name, category).await;
        info!(
            file = %path.display(),
            indexed = report.indexed,
            skipped = report.skipped,
            "Finished ingesting file"
        );
        Ok(report)
    }

    /// Ingest already-loaded text as if it were the file `file_name`.
    pub async fn ingest_text(&self, content: &str, file_name: &str, category: Category) -> IngestReport {
        let mut report = IngestReport::default();

        for (i, line) in content.lines().enumerate() {
            let text = line.trim();
            if text.is_empty() {
                continue;
            }

            let id = format!("{}_{file_name}_{i}", category.as_tag());
            match self.ingest_line(&id, text, category).await {
                Ok(()) => report.indexed += 1,
                Err(e) => {
                    warn!(id = %id, line = i, error = %e, "Skipping line");
                    report.skipped += 1;
                }
            }
        }

        report
    }

    async fn ingest_line(&self, id: &str, text: &str, category: Category) -> Result<(), RetrievalError> {
        let response = self
            .embedder
            .embed(EmbeddingRequest {
                model: self.model.clone(),
                inputs: vec![text.to_string()],
            })
            .await
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        let embedding = response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::Embedding("Empty embedding response".into()))?;

        if embedding.len() != self.dimension {
            return Err(RetrievalError::Embedding(format!(
                "Expected dimension {}, got {}",
                self.dimension,
                embedding.len()
            )));
        }

        self.index
            .index(IndexedDocument {
                id: id.to_string(),
                text: text.to_string(),
                category,
                embedding,
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory_index::InMemoryVectorIndex;
    use async_trait::async_trait;
    use ragchat_core::error::ProviderError;
    use ragchat_core::provider::{EmbeddingResponse, ProviderRequest, ProviderResponse};
    use ragchat_core::retrieval::SearchRequest;
    use tempfile::TempDir;

    /// Embeds text as `[len, 1.0]`; fails on any line containing "FAIL".
    struct LengthEmbedder;

    #[async_trait]
    impl Provider for LengthEmbedder {
        fn name(&self) -> &str {
            "length"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::NotConfigured("embeddings only".into()))
        }

        async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
            if request.inputs.iter().any(|t| t.contains("FAIL")) {
                return Err(ProviderError::Network("connection reset".into()));
            }
            Ok(EmbeddingResponse {
                embeddings: request
                    .inputs
                    .iter()
                    .map(|t| vec![t.len() as f32, 1.0])
                    .collect(),
                model: request.model,
                usage: None,
            })
        }
    }

    fn ingestor(index: Arc<InMemoryVectorIndex>) -> Ingestor {
        Ingestor::new(Arc::new(LengthEmbedder), index, "embed-model", 2)
    }

    #[tokio::test]
    async fn blank_lines_are_skipped_but_counted_in_ids() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let report = ingestor(index.clone())
            .ingest_text("first rule\n\n   \nsecond rule\n", "Instruction.txt", Category::Instruction)
            .await;

        assert_eq!(report, IngestReport { indexed: 2, skipped: 0 });
        let hits = index
            .search(SearchRequest {
                vector: vec![10.0, 1.0],
                k: 10,
                category: Category::Instruction,
            })
            .await
            .unwrap();
        let mut ids: Vec<String> = hits.into_iter().map(|h| h.id).collect();
        ids.sort();
        assert_eq!(
            ids,
            vec!["instruction_Instruction.txt_0", "instruction_Instruction.txt_3"]
        );
    }

    #[tokio::test]
    async fn failing_lines_are_skipped() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let report = ingestor(index.clone())
            .ingest_text("ok one\nFAIL here\nok two", "Domain.txt", Category::DomainKnowledge)
            .await;

        assert_eq!(report, IngestReport { indexed: 2, skipped: 1 });
        assert_eq!(index.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn wrong_dimension_is_skipped() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let ingestor = Ingestor::new(Arc::new(LengthEmbedder), index.clone(), "m", 3);
        let report = ingestor
            .ingest_text("anything", "Domain.txt", Category::DomainKnowledge)
            .await;
        assert_eq!(report, IngestReport { indexed: 0, skipped: 1 });
    }

    #[tokio::test]
    async fn ingest_file_uses_file_name_in_ids() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Domain.txt");
        std::fs::write(&path, "Orders ship in two days\nRefunds take a week\n").unwrap();

        let index = Arc::new(InMemoryVectorIndex::new());
        let report = ingestor(index.clone())
            .ingest_file(&path, Category::DomainKnowledge)
            .await
            .unwrap();
        assert_eq!(report.indexed, 2);

        let hits = index
            .search(SearchRequest {
                vector: vec![1.0, 0.0],
                k: 1,
                category: Category::DomainKnowledge,
            })
            .await
            .unwrap();
        assert!(hits[0].id.starts_with("domain_knowledge_Domain.txt_"));
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let index = Arc::new(InMemoryVectorIndex::new());
        let err = ingestor(index)
            .ingest_file(Path::new("/nonexistent/Instruction.txt"), Category::Instruction)
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Indexing(_)));
        assert!(err.to_string().contains("Instruction.txt"));
    }
}
