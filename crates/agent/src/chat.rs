//! The chat service: orchestrates one request against one session.
//!
//! Two modes:
//!
//! - **Direct**: `{message}` is answered by a single pipeline run.
//! - **Retrieval**: `{query, top_k}` retrieves the best instruction and
//!   domain passages, asks the model for a SQL query over the composed
//!   prompt, runs that query read-only, then asks the model again with the
//!   result rows.
//!
//! The session guard is held from load to persist, and the History is only
//! written once every stage has succeeded.

use std::sync::Arc;

use ragchat_config::AppConfig;
use ragchat_core::error::{Error, PersistenceError};
use ragchat_core::message::{History, SessionId};
use ragchat_core::persistence::{QueryExecutor, rows_to_json};
use ragchat_core::retrieval::Category;
use ragchat_core::session::SessionStore;
use serde::Deserialize;
use tracing::{debug, info};

use crate::pipeline::ConversationPipeline;
use crate::prompt::compose;
use crate::retriever::{ContextRetriever, validate_request};
use crate::sql::{ensure_read_only, extract_sql};

/// A chat request body. The shape selects the mode.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChatRequest {
    Direct {
        message: String,
    },
    Retrieval {
        query: String,
        #[serde(default)]
        top_k: Option<i64>,
    },
}

/// Request orchestrator shared by every HTTP handler.
pub struct ChatService {
    sessions: Arc<dyn SessionStore>,
    pipeline: ConversationPipeline,
    retriever: ContextRetriever,
    executor: Option<Arc<dyn QueryExecutor>>,
    schema_override: Option<String>,
    default_top_k: usize,
}

impl ChatService {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        pipeline: ConversationPipeline,
        retriever: ContextRetriever,
    ) -> Self {
        Self {
            sessions,
            pipeline,
            retriever,
            executor: None,
            schema_override: None,
            default_top_k: 5,
        }
    }

    /// Apply the retrieval settings from config.
    pub fn configured(mut self, config: &AppConfig) -> Self {
        self.schema_override = config.retrieval.schema_override.clone();
        self.default_top_k = config.retrieval.default_top_k;
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn QueryExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn with_schema_override(mut self, schema: impl Into<String>) -> Self {
        self.schema_override = Some(schema.into());
        self
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn retriever(&self) -> &ContextRetriever {
        &self.retriever
    }

    pub fn executor(&self) -> Option<&Arc<dyn QueryExecutor>> {
        self.executor.as_ref()
    }

    /// Dispatch a request body to the matching mode.
    pub async fn handle(&self, session_id: &SessionId, request: ChatRequest) -> Result<String, Error> {
        match request {
            ChatRequest::Direct { message } => self.direct_chat(session_id, &message).await,
            ChatRequest::Retrieval { query, top_k } => {
                let top_k = match top_k {
                    None => self.default_top_k,
                    Some(k) => usize::try_from(k)
                        .map_err(|_| Error::validation(format!("top_k must be positive, got {k}")))?,
                };
                self.retrieval_chat(session_id, &query, top_k).await
            }
        }
    }

    /// Answer `message` in the context of the session's History.
    pub async fn direct_chat(&self, session_id: &SessionId, message: &str) -> Result<String, Error> {
        if message.trim().is_empty() {
            return Err(Error::validation("message must not be empty"));
        }

        let _guard = self.sessions.lock(session_id).await;
        let history = self.sessions.get(session_id).await?;

        let (response, updated) = self.pipeline.run(message, &history).await?;
        self.sessions.put(session_id, updated).await?;

        info!(
            session_id = %session_id,
            mode = "direct",
            turns = history.len() + 2,
            "Chat completed"
        );
        Ok(response)
    }

    /// Answer `query` from retrieved context and the rows of a generated query.
    pub async fn retrieval_chat(
        &self,
        session_id: &SessionId,
        query: &str,
        top_k: usize,
    ) -> Result<String, Error> {
        validate_request(query, top_k)?;
        let executor = self.executor.as_ref().ok_or(PersistenceError::NotConfigured)?;

        let _guard = self.sessions.lock(session_id).await;
        let history = self.sessions.get(session_id).await?;

        let (instruction, domain) = tokio::try_join!(
            self.retriever.retrieve_top(query, top_k, Category::Instruction),
            self.retriever.retrieve_top(query, top_k, Category::DomainKnowledge),
        )?;
        debug!(
            session_id = %session_id,
            instruction_score = instruction.score,
            domain_score = domain.score,
            "Context retrieved"
        );

        let schema = match &self.schema_override {
            Some(schema) => schema.clone(),
            None => executor.describe_schema().await?,
        };

        let prompt = compose(&domain.text, &instruction.text, &schema, query);
        let (answer, history_after_query) = self.pipeline.run(&prompt, &history).await?;

        let sql = extract_sql(&answer)?;
        ensure_read_only(&sql)?;
        let rows = executor.execute(&sql).await?;
        debug!(session_id = %session_id, rows = rows.len(), "Generated query executed");

        let rows_json = rows_to_json(&rows)?;
        let (response, updated) = self.pipeline.run(&rows_json, &history_after_query).await?;
        self.sessions.put(session_id, updated).await?;

        info!(
            session_id = %session_id,
            mode = "retrieval",
            top_k,
            rows = rows.len(),
            turns = history.len() + 4,
            "Chat completed"
        );
        Ok(response)
    }

    /// The stored History of a session; empty (and not created) if unseen.
    pub async fn history(&self, session_id: &SessionId) -> Result<History, Error> {
        Ok(self.sessions.get(session_id).await?)
    }
}
