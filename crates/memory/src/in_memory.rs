//! In-memory session store — the default; sessions live for the process lifetime.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ragchat_core::error::SessionError;
use ragchat_core::message::{History, SessionId};
use ragchat_core::session::{SessionGuard, SessionLocks, SessionStore};
use tokio::sync::RwLock;

/// A session store that keeps every History in a HashMap.
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, History>>>,
    locks: SessionLocks,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            locks: SessionLocks::new(),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn lock(&self, session_id: &SessionId) -> SessionGuard {
        self.locks.acquire(session_id).await
    }

    async fn get(&self, session_id: &SessionId) -> Result<History, SessionError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).cloned().unwrap_or_default())
    }

    async fn put(&self, session_id: &SessionId, history: History) -> Result<(), SessionError> {
        self.sessions.write().await.insert(session_id.clone(), history);
        Ok(())
    }

    async fn len(&self) -> Result<usize, SessionError> {
        Ok(self.sessions.read().await.len())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        self.sessions.write().await.clear();
        Ok(())
    }
}
