//! File-based session store — one JSON document per session.
//!
//! Each session's History is stored as `<dir>/<encoded id>.json` and loaded
//! on demand, so sessions survive a restart. Session ids are opaque strings;
//! bytes outside `[A-Za-z0-9_-]` are percent-encoded in the file name.
//!
//! Storage location: `~/.ragchat/sessions/` unless `sessions.dir` is set.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ragchat_core::error::SessionError;
use ragchat_core::message::{History, SessionId};
use ragchat_core::session::{SessionGuard, SessionLocks, SessionStore};
use tracing::debug;

/// A file-backed session store.
///
/// Writes go to a temporary file that is renamed over the target, so a
/// reader never sees a half-written History.
pub struct FileSessionStore {
    dir: PathBuf,
    locks: SessionLocks,
}

impl FileSessionStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: PathBuf) -> Self {
        debug!(dir = %dir.display(), "File session store opened");
        Self {
            dir,
            locks: SessionLocks::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, session_id: &SessionId) -> PathBuf {
        self.dir.join(format!("{}.json", encode_file_stem(session_id.as_str())))
    }

    async fn session_files(&self) -> Result<Vec<PathBuf>, SessionError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(SessionError::Storage(format!(
                    "Failed to read session directory: {e}"
                )));
            }
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SessionError::Storage(format!("Failed to list sessions: {e}")))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }
}

fn encode_file_stem(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

#[async_trait]
impl SessionStore for FileSessionStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn lock(&self, session_id: &SessionId) -> SessionGuard {
        self.locks.acquire(session_id).await
    }

    async fn get(&self, session_id: &SessionId) -> Result<History, SessionError> {
        let path = self.path_for(session_id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(History::new()),
            Err(e) => {
                return Err(SessionError::Storage(format!(
                    "Failed to read session file: {e}"
                )));
            }
        };

        serde_json::from_str(&content).map_err(|e| SessionError::Corrupted {
            session_id: session_id.to_string(),
            reason: e.to_string(),
        })
    }

    async fn put(&self, session_id: &SessionId, history: History) -> Result<(), SessionError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            SessionError::Storage(format!("Failed to create session directory: {e}"))
        })?;

        let body = serde_json::to_string(&history)
            .map_err(|e| SessionError::Storage(format!("Failed to serialize session: {e}")))?;

        let path = self.path_for(session_id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| SessionError::Storage(format!("Failed to write session file: {e}")))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| SessionError::Storage(format!("Failed to replace session file: {e}")))?;

        debug!(session_id = %session_id, turns = history.len(), "Session written");
        Ok(())
    }

    async fn len(&self) -> Result<usize, SessionError> {
        Ok(self.session_files().await?.len())
    }

    async fn clear(&self) -> Result<(), SessionError> {
        for path in self.session_files().await? {
            tokio::fs::remove_file(&path).await.map_err(|e| {
                SessionError::Storage(format!("Failed to remove session file: {e}"))
            })?;
        }
        Ok(())
    }
}
