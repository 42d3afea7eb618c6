//! Server-side session state
//!
//! Sessions are scoped to one browser and addressed by an opaque session id
//! delivered via a signed cookie (see [`manager`]). The stored state is the
//! minimal pair the authentication flow needs: the pending anti-forgery
//! token while a login is in flight, and the authenticated-user snapshot
//! after it succeeds. Stores are pluggable behind [`SessionStore`].

pub mod manager;
pub mod memory;

pub use manager::{SessionManager, SESSION_COOKIE};
pub use memory::MemorySessionStore;

use crate::models::UserSnapshot;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Per-browser session state
///
/// `pending_state` is present only between login initiation and the callback;
/// it is consumed (cleared) by the first callback attempt, matching or not.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionData {
    pub pending_state: Option<String>,
    pub user: Option<UserSnapshot>,
}

impl SessionData {
    /// Whether this session holds an authenticated user
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Backing store for session state
///
/// Implementations must make a `save` visible to the next `load` for the
/// same session id (read-your-writes within one browser's request sequence).
/// No cross-session visibility is required or permitted.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the session state for an id, if any exists
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store is unreachable
    async fn load(&self, session_id: &str) -> Result<Option<SessionData>>;

    /// Persist the session state under an id, creating it if absent
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store rejects the write
    async fn save(&self, session_id: &str, data: SessionData) -> Result<()>;

    /// Remove all state for an id so the identifier no longer maps to anything
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store rejects the removal
    async fn destroy(&self, session_id: &str) -> Result<()>;
}
