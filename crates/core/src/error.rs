//! Error types for the ragchat domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external collaborator has its own error enum; the top-level
//! [`Error`] wraps them and classifies every failure into an [`ErrorKind`]
//! so the HTTP layer can pick a status code without inspecting details.

use thiserror::Error;

/// The top-level error type for all ragchat operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Caller input ---
    #[error("Validation error: {0}")]
    Validation(String),

    // --- Collaborator errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Session store error: {0}")]
    Session(#[from] SessionError),

    // --- Orchestration state ---
    #[error("State error: {0}")]
    State(#[from] StateError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], used for status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input from the caller.
    Validation,
    /// An external service (model, embedding, search, database, session store) failed.
    Collaborator,
    /// Orchestration could not proceed with what the collaborators returned.
    State,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Collaborator => "collaborator",
            ErrorKind::State => "state",
            ErrorKind::Internal => "internal",
        }
    }
}

impl Error {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Provider(_)
            | Error::Retrieval(_)
            | Error::Persistence(_)
            | Error::Session(_) => ErrorKind::Collaborator,
            Error::State(_) => ErrorKind::State,
            Error::Config { .. } | Error::Serialization(_) | Error::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// A message that is safe to hand back to an HTTP client.
    ///
    /// Collaborator failures are redacted to the name of the failing service;
    /// the full error is only ever logged.
    pub fn public_message(&self) -> String {
        match self {
            Error::Validation(msg) => msg.clone(),
            Error::Provider(_) => "language model unavailable".into(),
            Error::Retrieval(RetrievalError::Embedding(_)) => "embedding service unavailable".into(),
            Error::Retrieval(_) => "search backend unavailable".into(),
            Error::Persistence(_) => "database query failed".into(),
            Error::Session(_) => "session store unavailable".into(),
            Error::State(e) => e.to_string(),
            Error::Config { .. } | Error::Serialization(_) | Error::Internal(_) => {
                "internal error".into()
            }
        }
    }
}

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Search backend failed: {0}")]
    Search(String),

    #[error("Indexing failed: {0}")]
    Indexing(String),

    #[error("Retrieval timed out after {0}s")]
    Timeout(u64),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Query timed out after {0}s")]
    Timeout(u64),

    #[error("Persistence backend not configured")]
    NotConfigured,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Corrupted session {session_id}: {reason}")]
    Corrupted { session_id: String, reason: String },
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("No context found for category '{category}'")]
    NoContext { category: String },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}
