use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Durable user record persisted by the user store
///
/// Exactly one record exists per email address; the unique constraint on
/// `email` is enforced by the storage layer. `id` and `created_at` are set
/// once on creation and never change afterwards.
#[derive(FromRow, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub provider_id: Option<String>,
    pub email: String,
    pub name: Option<String>,
    pub picture_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Project the record into the session-resident snapshot
    #[must_use]
    pub fn snapshot(&self) -> UserSnapshot {
        UserSnapshot {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            picture_url: self.picture_url.clone(),
        }
    }
}

/// The subset of a user record that lives in the session after sign-in
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserSnapshot {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture_url: Option<String>,
}

/// Profile returned by the identity provider's userinfo endpoint
///
/// `email` is required: the provider client validates its presence right
/// after parsing, so downstream code never handles a missing natural key.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub provider_id: Option<String>,
    pub email: String,
    pub name: Option<String>,
    pub picture_url: Option<String>,
}
