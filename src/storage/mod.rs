//! User persistence over SQLite
//!
//! The users table is the one durable, shared resource in the system. Its
//! unique constraint on `email` is the consistency backstop for concurrent
//! duplicate callbacks: a create that loses the race is downgraded to the
//! update path instead of surfacing to the user.

use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{UserProfile, UserRecord};

/// Failures surfaced by the storage layer
#[derive(Debug, Error)]
pub enum StorageError {
    /// The database rejected or could not serve the operation
    #[error("user storage unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    /// A uniqueness conflict that could not be resolved by re-reading
    #[error("conflicting user record for {0}")]
    Conflict(String),
}

/// Open a connection pool, creating the database file if needed
///
/// # Errors
///
/// Returns an error if the URL is invalid or the database cannot be opened
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// Create the schema if it does not exist yet
///
/// # Errors
///
/// Returns an error if schema creation fails
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            provider_id TEXT,
            email TEXT NOT NULL UNIQUE,
            name TEXT,
            picture_url TEXT,
            created_at TEXT NOT NULL
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_provider_id ON users (provider_id)")
        .execute(pool)
        .await?;

    log::info!("Database migration completed");
    Ok(())
}

/// Repository for durable user records, keyed by email
#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Look up a user by email
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] if the query fails
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StorageError> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, provider_id, email, name, picture_url, created_at \
             FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// Create or update the user record for a profile's email
    ///
    /// Existing records are updated in place; `name`, `picture_url` and
    /// `provider_id` are overwritten only when the incoming value is
    /// non-empty, so a sparse profile never clobbers stored data. A create
    /// that collides on the unique email (two callbacks racing) is retried
    /// once as an update.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] on query failure, or
    /// [`StorageError::Conflict`] if a uniqueness conflict cannot be
    /// resolved by re-reading
    pub async fn upsert_by_email(&self, profile: &UserProfile) -> Result<UserRecord, StorageError> {
        if let Some(existing) = self.find_by_email(&profile.email).await? {
            log::debug!("User exists, updating profile fields");
            return self.update_existing(&existing, profile).await;
        }

        log::debug!("No user for email, creating record");
        match self.insert_new(profile).await {
            Ok(record) => Ok(record),
            Err(e) if is_unique_violation(&e) => {
                // Lost the create race to a concurrent callback; the other
                // writer's row is authoritative, take the update path
                log::warn!("Concurrent user creation detected, retrying as update");
                let existing = self
                    .find_by_email(&profile.email)
                    .await?
                    .ok_or_else(|| StorageError::Conflict(profile.email.clone()))?;
                self.update_existing(&existing, profile).await
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_existing(
        &self,
        existing: &UserRecord,
        profile: &UserProfile,
    ) -> Result<UserRecord, StorageError> {
        let name = merged(profile.name.as_ref(), existing.name.clone());
        let picture_url = merged(profile.picture_url.as_ref(), existing.picture_url.clone());
        let provider_id = merged(profile.provider_id.as_ref(), existing.provider_id.clone());

        sqlx::query(
            "UPDATE users SET name = ?, picture_url = ?, provider_id = ? WHERE email = ?",
        )
        .bind(name.as_deref())
        .bind(picture_url.as_deref())
        .bind(provider_id.as_deref())
        .bind(&existing.email)
        .execute(&self.pool)
        .await?;

        self.find_by_email(&existing.email)
            .await?
            .ok_or_else(|| StorageError::Conflict(existing.email.clone()))
    }

    async fn insert_new(&self, profile: &UserProfile) -> Result<UserRecord, sqlx::Error> {
        let id = Uuid::new_v4().to_string();
        let created_at = Utc::now();

        sqlx::query(
            "INSERT INTO users (id, provider_id, email, name, picture_url, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(profile.provider_id.as_deref())
        .bind(&profile.email)
        .bind(profile.name.as_deref())
        .bind(profile.picture_url.as_deref())
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, UserRecord>(
            "SELECT id, provider_id, email, name, picture_url, created_at \
             FROM users WHERE id = ?",
        )
        .bind(&id)
        .fetch_one(&self.pool)
        .await
    }
}

/// Non-destructive merge: keep the incoming value only when it is non-empty
fn merged(incoming: Option<&String>, current: Option<String>) -> Option<String> {
    match incoming {
        Some(value) if !value.is_empty() => Some(value.clone()),
        _ => current,
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}
