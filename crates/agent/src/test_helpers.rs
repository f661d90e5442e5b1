//! Shared test helpers: scripted providers, a keyword embedder, and mock
//! indexes and executors.

use std::sync::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ragchat_core::error::{PersistenceError, ProviderError, RetrievalError};
use ragchat_core::persistence::{QueryExecutor, Row};
use ragchat_core::provider::{
    EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse, Usage,
};
use ragchat_core::retrieval::{
    Category, IndexedDocument, SearchHit, SearchRequest, VectorIndex,
};
use ragchat_memory::InMemoryVectorIndex;

/// A mock provider that returns a sequence of scripted responses.
///
/// Each call to `complete` returns the next response in the queue.
/// Panics if more calls are made than responses provided.
pub struct SequentialMockProvider {
    responses: Mutex<Vec<ProviderResponse>>,
    call_count: Mutex<usize>,
}

impl SequentialMockProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_count: Mutex::new(0),
        }
    }

    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| make_text_response(t)).collect())
    }

    #[allow(dead_code)]
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut count = self.call_count.lock().unwrap();
        let responses = self.responses.lock().unwrap();

        if *count >= responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                *count,
                responses.len()
            );
        }

        let response = responses[*count].clone();
        *count += 1;
        Ok(response)
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        content: text.to_string(),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// A provider that records every request and answers from a script.
///
/// The last scripted answer repeats once the script is exhausted.
pub struct RecordingProvider {
    script: Vec<String>,
    requests: Mutex<Vec<ProviderRequest>>,
    delay: Option<Duration>,
}

impl RecordingProvider {
    pub fn new(answer: &str) -> Self {
        Self::scripted(&[answer])
    }

    pub fn scripted(answers: &[&str]) -> Self {
        Self {
            script: answers.iter().map(|a| a.to_string()).collect(),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for RecordingProvider {
    fn name(&self) -> &str {
        "recording_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len() - 1
        };
        let answer = self
            .script
            .get(index)
            .or_else(|| self.script.last())
            .cloned()
            .unwrap_or_default();
        Ok(make_text_response(&answer))
    }
}

/// A provider whose every call fails.
pub struct FailingProvider;

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::ApiError {
            status_code: 500,
            message: "upstream exploded".into(),
        })
    }

    async fn embed(&self, _request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        Err(ProviderError::Network("connection refused".into()))
    }
}

/// Answers the structured retrieval prompt with `SELECT 1` and anything
/// else with `done`, yielding to the runtime before every answer.
pub struct SqlThenAnswerProvider;

#[async_trait]
impl Provider for SqlThenAnswerProvider {
    fn name(&self) -> &str {
        "sql_then_answer_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        tokio::task::yield_now().await;
        let prompt = request.messages.first().map(|m| m.content()).unwrap_or_default();
        let last_user = prompt.rsplit("User: ").next().unwrap_or_default();
        let answer = if last_user.starts_with("[Domain]: ") { "SELECT 1" } else { "done" };
        Ok(make_text_response(answer))
    }
}

/// Embeds text as keyword counts over a tiny vocabulary, plus a constant
/// bias component so no vector is ever zero.
pub struct KeywordEmbedder;

impl KeywordEmbedder {
    const VOCABULARY: [&'static str; 6] = ["order", "ship", "sql", "select", "refund", "customer"];
    pub const DIM: usize = Self::VOCABULARY.len() + 1;

    pub fn vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        let mut v: Vec<f32> = Self::VOCABULARY
            .iter()
            .map(|word| lower.matches(word).count() as f32)
            .collect();
        v.push(1.0);
        v
    }
}

#[async_trait]
impl Provider for KeywordEmbedder {
    fn name(&self) -> &str {
        "keyword_embedder"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::NotConfigured("embeddings only".into()))
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
        Ok(EmbeddingResponse {
            embeddings: request.inputs.iter().map(|t| Self::vector(t)).collect(),
            model: request.model,
            usage: None,
        })
    }
}

/// An in-memory index holding a small instruction and domain corpus.
pub async fn seeded_index() -> Arc<dyn VectorIndex> {
    let index = InMemoryVectorIndex::new();
    let corpus = [
        (Category::Instruction, "Write one PostgreSQL SELECT statement and return only SQL"),
        (Category::Instruction, "Always answer politely"),
        (Category::DomainKnowledge, "Orders ship within two days of payment"),
        (Category::DomainKnowledge, "Refunds are issued to the original card"),
        (Category::DomainKnowledge, "Customers can hold several orders"),
    ];
    for (i, (category, text)) in corpus.into_iter().enumerate() {
        index
            .index(IndexedDocument {
                id: format!("{}_seed_{i}", category.as_tag()),
                text: text.into(),
                category,
                embedding: KeywordEmbedder::vector(text),
            })
            .await
            .unwrap();
    }
    Arc::new(index)
}

/// A vector index with canned behavior that counts searches.
pub struct MockIndex {
    behavior: MockIndexBehavior,
    search_calls: AtomicUsize,
}

enum MockIndexBehavior {
    Empty,
    Failing,
    Only(Category),
}

impl MockIndex {
    pub fn empty() -> Self {
        Self::with(MockIndexBehavior::Empty)
    }

    pub fn failing() -> Self {
        Self::with(MockIndexBehavior::Failing)
    }

    /// Returns one hit for `category` and nothing for any other.
    pub fn only(category: Category) -> Self {
        Self::with(MockIndexBehavior::Only(category))
    }

    fn with(behavior: MockIndexBehavior) -> Self {
        Self {
            behavior,
            search_calls: AtomicUsize::new(0),
        }
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorIndex for MockIndex {
    fn name(&self) -> &str {
        "mock_index"
    }

    async fn search(&self, request: SearchRequest) -> Result<Vec<SearchHit>, RetrievalError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            MockIndexBehavior::Empty => Ok(Vec::new()),
            MockIndexBehavior::Failing => Err(RetrievalError::Search("cluster red".into())),
            MockIndexBehavior::Only(category) if *category == request.category => {
                Ok(vec![SearchHit {
                    id: format!("{}_mock_0", category.as_tag()),
                    text: format!("the only {category} passage"),
                    source_tag: category.as_tag().to_string(),
                    score: 0.5,
                }])
            }
            MockIndexBehavior::Only(_) => Ok(Vec::new()),
        }
    }

    async fn index(&self, document: IndexedDocument) -> Result<String, RetrievalError> {
        Ok(document.id)
    }

    async fn count(&self) -> Result<usize, RetrievalError> {
        Ok(0)
    }
}

/// A query executor that returns fixed rows and records every query.
pub struct MockExecutor {
    rows: Vec<Row>,
    schema: String,
    queries: Mutex<Vec<String>>,
}

impl MockExecutor {
    /// `rows` must be a JSON array of objects.
    pub fn returning(rows: serde_json::Value) -> Self {
        let rows = match rows {
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    serde_json::Value::Object(map) => map,
                    other => panic!("MockExecutor rows must be objects, got {other}"),
                })
                .collect(),
            other => panic!("MockExecutor expects an array, got {other}"),
        };
        Self {
            rows,
            schema: "orders(id integer)".into(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for MockExecutor {
    fn name(&self) -> &str {
        "mock_executor"
    }

    async fn execute(&self, query: &str) -> Result<Vec<Row>, PersistenceError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.rows.clone())
    }

    async fn describe_schema(&self) -> Result<String, PersistenceError> {
        Ok(self.schema.clone())
    }
}
