//! OpenSearch k-NN vector index.
//!
//! Documents live in a single index with the mapping:
//!
//! ```json
//! {
//!   "text_embedding": { "type": "knn_vector", "dimension": 1536 },
//!   "text":           { "type": "text" },
//!   "source_file":    { "type": "keyword" }
//! }
//! ```
//!
//! Searches use a `knn` query on `text_embedding` with a `term` filter on
//! `source_file` inside the k-NN clause, so the `k` neighbours are chosen
//! among documents of one category only.

use std::time::Duration;

use async_trait::async_trait;
use ragchat_config::OpenSearchConfig;
use ragchat_core::error::RetrievalError;
use ragchat_core::retrieval::{IndexedDocument, SearchHit, SearchRequest, VectorIndex};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

/// An OpenSearch-backed vector index reached over its REST API.
pub struct OpenSearchIndex {
    endpoint: String,
    index: String,
    credentials: Option<(String, String)>,
    client: reqwest::Client,
}

impl OpenSearchIndex {
    pub fn new(endpoint: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            index: index.into(),
            credentials: None,
            client: reqwest::Client::new(),
        }
    }

    /// Build from the `[retrieval.opensearch]` config section.
    pub fn from_config(config: &OpenSearchConfig, timeout: Duration) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RetrievalError::Search(format!("Failed to build HTTP client: {e}")))?;

        let mut index = Self::new(&config.endpoint, &config.index);
        index.client = client;
        if let Some(username) = &config.username {
            index = index.with_basic_auth(username, config.password.clone().unwrap_or_default());
        }
        Ok(index)
    }

    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.endpoint, path.trim_start_matches('/'));
        self.authorized(self.client.request(method, url))
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some((user, pass)) => builder.basic_auth(user, Some(pass)),
            None => builder,
        }
    }

    /// `{endpoint}/{index}/_doc/{id}?refresh=wait_for` with the id encoded
    /// as a single path segment.
    fn document_url(&self, id: &str) -> Result<reqwest::Url, RetrievalError> {
        let mut url = reqwest::Url::parse(&self.endpoint)
            .map_err(|e| RetrievalError::Indexing(format!("Invalid OpenSearch endpoint: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| RetrievalError::Indexing("OpenSearch endpoint cannot take a path".into()))?
            .pop_if_empty()
            .extend([self.index.as_str(), "_doc", id]);
        url.set_query(Some("refresh=wait_for"));
        Ok(url)
    }

    /// Body of a category-filtered k-NN query.
    fn search_body(request: &SearchRequest) -> serde_json::Value {
        json!({
            "size": request.k,
            "_source": ["text", "source_file"],
            "query": {
                "knn": {
                    "text_embedding": {
                        "vector": request.vector,
                        "k": request.k,
                        "filter": {
                            "term": { "source_file": request.category.as_tag() }
                        }
                    }
                }
            }
        })
    }

    fn document_body(document: &IndexedDocument) -> serde_json::Value {
        json!({
            "text_embedding": document.embedding,
            "text": document.text,
            "source_file": document.category.as_tag(),
        })
    }
}

fn transport_error(e: reqwest::Error) -> RetrievalError {
    RetrievalError::Search(format!("OpenSearch request failed: {e}"))
}

#[async_trait]
impl VectorIndex for OpenSearchIndex {
    fn name(&self) -> &str {
        "opensearch"
    }

    async fn search(&self, request: SearchRequest) -> Result<Vec<SearchHit>, RetrievalError> {
        debug!(
            index = %self.index,
            category = %request.category,
            k = request.k,
            "k-NN search"
        );

        let response = self
            .request(reqwest::Method::POST, &format!("{}/_search", self.index))
            .json(&Self::search_body(&request))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "OpenSearch search failed");
            return Err(RetrievalError::Search(format!(
                "OpenSearch returned {status}: {body}"
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::Search(format!("Malformed search response: {e}")))?;

        Ok(parsed
            .hits
            .hits
            .into_iter()
            .map(|hit| SearchHit {
                id: hit.id,
                text: hit.source.text,
                source_tag: hit.source.source_file,
                score: hit.score.unwrap_or(0.0),
            })
            .collect())
    }

    async fn index(&self, document: IndexedDocument) -> Result<String, RetrievalError> {
        let url = self.document_url(&document.id)?;
        let response = self
            .authorized(self.client.put(url))
            .json(&Self::document_body(&document))
            .send()
            .await
            .map_err(|e| RetrievalError::Indexing(format!("OpenSearch request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Indexing(format!(
                "OpenSearch returned {status} for '{}': {body}",
                document.id
            )));
        }

        let parsed: IndexResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::Indexing(format!("Malformed index response: {e}")))?;

        debug!(id = %parsed.id, result = %parsed.result, "Indexed document");
        Ok(parsed.id)
    }

    async fn count(&self) -> Result<usize, RetrievalError> {
        let response = self
            .request(reqwest::Method::GET, &format!("{}/_count", self.index))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(RetrievalError::Search(format!(
                "OpenSearch count returned {}",
                response.status()
            )));
        }

        let parsed: CountResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::Search(format!("Malformed count response: {e}")))?;
        Ok(parsed.count)
    }

    async fn ping(&self) -> Result<bool, RetrievalError> {
        let response = self
            .request(reqwest::Method::HEAD, "")
            .send()
            .await
            .map_err(transport_error)?;
        Ok(response.status().is_success())
    }
}

// --- OpenSearch API types (internal) ---

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score")]
    score: Option<f32>,
    #[serde(rename = "_source")]
    source: HitSource,
}

#[derive(Debug, Deserialize)]
struct HitSource {
    text: String,
    source_file: String,
}

#[derive(Debug, Deserialize)]
struct IndexResponse {
    #[serde(rename = "_id")]
    id: String,
    result: String,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragchat_core::retrieval::Category;

    #[test]
    fn search_body_filters_by_category() {
        let body = OpenSearchIndex::search_body(&SearchRequest {
            vector: vec![0.25, 0.5],
            k: 3,
            category: Category::DomainKnowledge,
        });

        assert_eq!(body["size"], 3);
        assert_eq!(body["_source"], json!(["text", "source_file"]));
        let knn = &body["query"]["knn"]["text_embedding"];
        assert_eq!(knn["k"], 3);
        assert_eq!(knn["vector"], json!([0.25, 0.5]));
        // The category filter applies while choosing neighbours, not after
        assert_eq!(knn["filter"]["term"]["source_file"], "domain_knowledge");
        assert!(body["query"].get("bool").is_none());
    }

    #[test]
    fn document_url_encodes_the_id() {
        let index = OpenSearchIndex::new("https://search.local:9200/", "vector-index");
        let url = index.document_url("instruction_notes#1?.txt_0").unwrap();
        assert_eq!(
            url.as_str(),
            "https://search.local:9200/vector-index/_doc/instruction_notes%231%3F.txt_0?refresh=wait_for"
        );

        let plain = index.document_url("domain_knowledge_Domain.txt_4").unwrap();
        assert_eq!(
            plain.as_str(),
            "https://search.local:9200/vector-index/_doc/domain_knowledge_Domain.txt_4?refresh=wait_for"
        );
    }

    #[test]
    fn document_body_uses_index_field_names() {
        let body = OpenSearchIndex::document_body(&IndexedDocument {
            id: "instruction_Instruction.txt_0".into(),
            text: "Only write SELECT statements".into(),
            category: Category::Instruction,
            embedding: vec![1.0, 0.0],
        });
        assert_eq!(body["text"], "Only write SELECT statements");
        assert_eq!(body["source_file"], "instruction");
        assert_eq!(body["text_embedding"], json!([1.0, 0.0]));
    }

    #[test]
    fn parse_search_response() {
        let data = r#"{
            "took": 4,
            "hits": {
                "total": {"value": 2, "relation": "eq"},
                "hits": [
                    {"_id": "domain_knowledge_Domain.txt_3", "_score": 0.91,
                     "_source": {"text": "Orders ship within 2 days", "source_file": "domain_knowledge"}},
                    {"_id": "domain_knowledge_Domain.txt_7", "_score": 0.55,
                     "_source": {"text": "Refunds take a week", "source_file": "domain_knowledge"}}
                ]
            }
        }"#;
        let parsed: SearchResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.hits.hits.len(), 2);
        assert_eq!(parsed.hits.hits[0].id, "domain_knowledge_Domain.txt_3");
        assert_eq!(parsed.hits.hits[0].source.text, "Orders ship within 2 days");
        assert!((parsed.hits.hits[1].score.unwrap() - 0.55).abs() < 1e-6);
    }

    #[test]
    fn parse_empty_search_response() {
        let parsed: SearchResponse =
            serde_json::from_str(r#"{"hits": {"total": {"value": 0}, "hits": []}}"#).unwrap();
        assert!(parsed.hits.hits.is_empty());
    }

    #[test]
    fn config_credentials_enable_basic_auth() {
        let config = OpenSearchConfig {
            endpoint: "https://search.local:9200/".into(),
            index: "vector-index".into(),
            username: Some("admin".into()),
            password: Some("secret".into()),
        };
        let index = OpenSearchIndex::from_config(&config, Duration::from_secs(5)).unwrap();
        assert_eq!(index.endpoint, "https://search.local:9200");
        assert_eq!(index.index, "vector-index");
        assert_eq!(
            index.credentials,
            Some(("admin".to_string(), "secret".to_string()))
        );
    }
}
