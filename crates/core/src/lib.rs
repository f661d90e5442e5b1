//! # ragchat core
//!
//! Domain types, traits, and error definitions for the ragchat
//! retrieval-augmented chat backend. This crate has **no HTTP or database
//! dependencies**: it defines the domain model and the contracts of every
//! external collaborator that the other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator (language model, embedding service, vector index,
//! relational store, session storage) is a trait here. Implementations live
//! in their respective crates, which keeps them swappable via configuration
//! and trivially mockable in tests.

pub mod error;
pub mod message;
pub mod persistence;
pub mod provider;
pub mod retrieval;
pub mod session;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ErrorKind, Result};
pub use message::{History, Role, SessionId, Turn};
pub use persistence::{QueryExecutor, Row};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
pub use retrieval::{Category, IndexedDocument, RetrievalResult, SearchHit, SearchRequest, VectorIndex};
pub use session::{SessionGuard, SessionLocks, SessionStore};
