// HTTP request handlers for the authentication flow
pub mod auth;
pub mod callback;
pub mod health;
pub mod user;

#[cfg(test)]
mod tests;

// Re-export the main handler functions
pub use auth::{login_start, logout};
pub use callback::oauth_callback;
pub use health::health;
pub use user::{home, login_page, profile};

use actix_web::web;

/// Wire all routes; shared between `main` and the integration tests
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg
        // Authentication endpoints
        .route("/auth/start", web::get().to(login_start))
        .route("/auth/callback", web::get().to(oauth_callback))
        .route("/auth/logout", web::get().to(logout))
        // Protected resources
        .route("/profile", web::get().to(profile))
        // Public pages
        .route("/", web::get().to(home))
        .route("/login", web::get().to(login_page))
        // Health endpoint
        .route("/ping", web::get().to(health));
}
