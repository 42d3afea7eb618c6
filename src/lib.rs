#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the authgate application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod auth;
pub mod handlers;
pub mod models;
pub mod oauth;
pub mod session;
pub mod settings;
pub mod storage;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use auth::{AuthError, Authenticator};
pub use handlers::configure_services;
pub use oauth::OAuthClient;
pub use session::{MemorySessionStore, SessionManager};
pub use settings::AuthgateSettings;
pub use storage::UserStore;
