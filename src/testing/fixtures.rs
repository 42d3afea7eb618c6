//! Test fixtures providing pre-built test objects

use std::sync::Arc;

use crate::models::UserProfile;
use crate::session::{MemorySessionStore, SessionManager};
use crate::settings::AuthgateSettings;
use crate::storage::{self, UserStore};

use super::constants::{TEST_EMAIL, TEST_PICTURE_URL, TEST_PROVIDER_ID, TEST_SESSION_KEY, TEST_USER_NAME};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Standard test settings: direct credentials, insecure cookies
    #[must_use]
    pub fn settings() -> AuthgateSettings {
        let mut settings = AuthgateSettings::default();
        settings.session.session_secret =
            String::from_utf8_lossy(TEST_SESSION_KEY).into_owned();
        settings.cookies.secure = false;
        settings.provider.client_id = Some("test-client-id".to_string());
        settings.provider.client_secret = Some("test-client-secret".to_string());
        // Direct values only: ambient CLIENT_ID/CLIENT_SECRET must not leak in
        settings.provider.client_id_env = None;
        settings.provider.client_secret_env = None;
        settings
    }

    /// Session manager over a fresh in-memory store
    #[must_use]
    pub fn session_manager() -> SessionManager {
        SessionManager::new(
            Arc::new(MemorySessionStore::new()),
            TEST_SESSION_KEY,
            false,
            24,
        )
    }

    /// User store over a fresh in-memory database with the schema applied
    ///
    /// The pool is capped at one connection: every new `:memory:` connection
    /// is its own empty database, so the schema only exists on the
    /// connection that ran the migration.
    ///
    /// # Panics
    ///
    /// Panics if the in-memory database cannot be opened
    pub async fn user_store() -> UserStore {
        use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
        use std::str::FromStr;

        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .expect("in-memory connect options should parse");
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .expect("in-memory database should open");
        storage::run_migrations(&pool)
            .await
            .expect("migration should succeed");
        UserStore::new(pool)
    }

    /// Standard provider profile
    #[must_use]
    pub fn profile() -> UserProfile {
        UserProfile {
            provider_id: Some(TEST_PROVIDER_ID.to_string()),
            email: TEST_EMAIL.to_string(),
            name: Some(TEST_USER_NAME.to_string()),
            picture_url: Some(TEST_PICTURE_URL.to_string()),
        }
    }
}
