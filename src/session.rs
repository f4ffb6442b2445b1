use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::SmartPlateResult;

/// The authenticated identity. Either all three fields are present or the
/// session does not exist; partial sessions are never stored or returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub name: String,
    pub email: String,
    pub token: String,
}

/// Durable storage for the current session, one JSON file on disk.
///
/// Access is synchronous and uncontended: the store is only touched from the
/// single-threaded command flow, never from concurrent tasks.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store at the default per-user location,
    /// `<data_local_dir>/smartplate/session.json`.
    pub fn open_default() -> SmartPlateResult<Self> {
        let dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("smartplate");
        std::fs::create_dir_all(&dir)?;
        Ok(Self::at(dir.join("session.json")))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored session. A missing file is no session; a malformed or
    /// partial file is treated the same way and the slot is cleared so the
    /// next load takes the fast path. Never a hard error.
    pub fn load(&self) -> Option<Session> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "session file unreadable");
                return None;
            }
        };
        match serde_json::from_str::<Session>(&content) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "stored session malformed, clearing");
                self.clear();
                None
            }
        }
    }

    /// Write the session atomically: temp file in the same directory, then
    /// rename over the slot.
    pub fn persist(&self, session: &Session) -> SmartPlateResult<()> {
        let content = serde_json::to_string_pretty(session)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), email = %session.email, "session persisted");
        Ok(())
    }

    /// Remove the stored session. Ok if none exists.
    pub fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "session cleared"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "failed to clear session"),
        }
    }
}
