//! Session store trait — per-session conversation history.
//!
//! A store maps a [`SessionId`] to exactly one [`History`]. Reads of an
//! unseen session return an empty History; the session comes into existence
//! on its first `put`.
//!
//! Read-modify-write cycles on the same session must be serialized. Callers
//! hold the [`SessionGuard`] returned by [`SessionStore::lock`] from `get`
//! until `put`; requests on different sessions never contend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::SessionError;
use crate::message::{History, SessionId};

/// Exclusive access to one session, released on drop.
pub struct SessionGuard {
    session_id: SessionId,
    _guard: OwnedMutexGuard<()>,
}

impl SessionGuard {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("session_id", &self.session_id)
            .finish()
    }
}

/// A table of per-session async mutexes.
///
/// Shared by every store implementation so that serialization does not
/// depend on the backing storage.
#[derive(Default)]
pub struct SessionLocks {
    locks: std::sync::Mutex<HashMap<SessionId, Arc<Mutex<()>>>>,
}

/// Above this many idle entries the table is pruned on the next lock.
const PRUNE_THRESHOLD: usize = 10_000;

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `session_id`.
    pub async fn acquire(&self, session_id: &SessionId) -> SessionGuard {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            if locks.len() > PRUNE_THRESHOLD {
                // Only the table itself references an idle lock.
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks.entry(session_id.clone()).or_default().clone()
        };

        SessionGuard {
            session_id: session_id.clone(),
            _guard: lock.lock_owned().await,
        }
    }

    /// Number of sessions with a lock entry.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The core SessionStore trait.
///
/// Implementations: in-memory (default), JSON files on disk.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The backend name (e.g., "memory", "file").
    fn name(&self) -> &str;

    /// Acquire exclusive access to a session for a read-modify-write cycle.
    async fn lock(&self, session_id: &SessionId) -> SessionGuard;

    /// Load a session's History; empty if the session has never been written.
    async fn get(&self, session_id: &SessionId) -> Result<History, SessionError>;

    /// Replace a session's History.
    async fn put(&self, session_id: &SessionId, history: History) -> Result<(), SessionError>;

    /// Number of stored sessions.
    async fn len(&self) -> Result<usize, SessionError>;

    /// Drop every session.
    async fn clear(&self) -> Result<(), SessionError>;
}
