// In-memory session store, the default backing for single-process deployments

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::{SessionData, SessionStore};

/// Process-local [`SessionStore`] over a `RwLock<HashMap>`
///
/// Sessions do not survive a restart; an external store behind the same
/// trait is the extension point for that.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionData>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions, used by tests and diagnostics
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned
    pub fn len(&self) -> Result<usize> {
        Ok(self
            .sessions
            .read()
            .map_err(|_| anyhow!("session store lock poisoned"))?
            .len())
    }

    /// Whether the store holds no sessions
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionData>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| anyhow!("session store lock poisoned"))?;
        Ok(sessions.get(session_id).cloned())
    }

    async fn save(&self, session_id: &str, data: SessionData) -> Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| anyhow!("session store lock poisoned"))?;
        sessions.insert(session_id.to_string(), data);
        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> Result<()> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| anyhow!("session store lock poisoned"))?;
        sessions.remove(session_id);
        Ok(())
    }
}
