#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use authgate::{
    auth::Authenticator,
    handlers::configure_services,
    oauth::OAuthClient,
    session::{MemorySessionStore, SessionManager},
    settings::AuthgateSettings,
    storage::{self, UserStore},
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env and initializes the logger
    let settings = AuthgateSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;

    // Open the database and apply the schema before accepting traffic
    let pool = storage::connect(&settings.database.url)
        .await
        .map_err(|e| std::io::Error::other(format!("Failed to open database: {e}")))?;
    storage::run_migrations(&pool)
        .await
        .map_err(|e| std::io::Error::other(format!("Failed to run migrations: {e}")))?;

    // Resolve provider credentials and endpoints once at startup
    let provider = OAuthClient::from_settings(&settings)
        .map_err(|e| std::io::Error::other(format!("Failed to initialize OAuth client: {e}")))?;

    let authenticator = Authenticator::new(Arc::new(provider), UserStore::new(pool));
    let session_manager = SessionManager::new(
        Arc::new(MemorySessionStore::new()),
        settings.session.session_secret.as_bytes(),
        settings.cookies.secure,
        settings.session.session_duration_hours,
    );

    start_server(authenticator, session_manager, settings).await
}

/// Start the HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(
    authenticator: Authenticator,
    session_manager: SessionManager,
    settings: AuthgateSettings,
) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(authenticator.clone()))
            .app_data(web::Data::new(session_manager.clone()))
            .app_data(web::Data::new(settings.clone()))
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn print_startup_info(bind_address: &str, settings: &AuthgateSettings) {
    println!("Starting Authgate OAuth2 sign-in service on http://{bind_address}");
    println!();
    println!("Authentication endpoints:");
    println!("  GET  /auth/start    - Begin provider login");
    println!("  GET  /auth/callback - OAuth callback");
    println!("  GET  /auth/logout   - Destroy session");
    println!();
    println!("Application endpoints:");
    println!("  GET  /         - Current user (or null)");
    println!("  GET  /login    - Login status with error code, if any");
    println!("  GET  /profile  - Authenticated user snapshot (protected)");
    println!("  GET  /ping     - Health check");
    println!();
    println!("OAuth callback URL to register with the provider:");
    println!("  {}", settings.redirect_uri());
}
