//! Query executor trait — the relational store the retrieval flow queries.

use async_trait::async_trait;

use crate::error::PersistenceError;

/// A result row: column name → JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Executes generated read-only queries against a relational store.
///
/// Implementations: PostgreSQL (sqlx).
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// The backend name (e.g., "postgres").
    fn name(&self) -> &str;

    /// Run a single read-only statement and return its rows.
    async fn execute(&self, query: &str) -> Result<Vec<Row>, PersistenceError>;

    /// A human-readable description of the tables and columns, fed to the
    /// model so it can write queries against them.
    async fn describe_schema(&self) -> Result<String, PersistenceError>;
}

/// Serialize rows as a compact JSON array.
pub fn rows_to_json(rows: &[Row]) -> Result<String, serde_json::Error> {
    serde_json::to_string(rows)
}
