use std::sync::Arc;

use actix_web::cookie::{Cookie, SameSite};
use actix_web::HttpRequest;
use anyhow::Result;

use super::{SessionData, SessionStore};
use crate::models::UserSnapshot;
use crate::utils::crypto;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "authgate_session";

/// Session plumbing between HTTP and the session store
///
/// The cookie carries only an opaque session id plus an HMAC-SHA256 tag
/// derived from the configured session secret (`<id>.<tag>`). All state
/// lives server-side in the [`SessionStore`]; a cookie whose tag does not
/// verify is treated as absent.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    signing_key: Vec<u8>,
    cookie_secure: bool,
    session_duration_hours: u64,
}

impl SessionManager {
    #[must_use]
    pub fn new(
        store: Arc<dyn SessionStore>,
        session_secret: &[u8],
        cookie_secure: bool,
        session_duration_hours: u64,
    ) -> Self {
        Self {
            store,
            signing_key: session_secret.to_vec(),
            cookie_secure,
            session_duration_hours,
        }
    }

    /// Whether cookies are flagged `Secure`
    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }

    /// Extract and verify the session id from the request's cookie
    ///
    /// Returns `None` when the cookie is absent, malformed, or fails
    /// signature verification.
    #[must_use]
    pub fn session_id_from_request(&self, req: &HttpRequest) -> Option<String> {
        let cookie = req.cookie(SESSION_COOKIE)?;
        let (session_id, tag) = cookie.value().split_once('.')?;
        if crypto::verify(session_id, tag, &self.signing_key) {
            Some(session_id.to_string())
        } else {
            log::warn!("Session cookie failed signature verification");
            None
        }
    }

    /// Session id from the request, or a freshly generated one
    #[must_use]
    pub fn get_or_create_session_id(&self, req: &HttpRequest) -> String {
        self.session_id_from_request(req)
            .unwrap_or_else(crypto::generate_session_id)
    }

    /// Create the signed session cookie for an id
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails
    pub fn create_session_cookie(&self, session_id: &str) -> Result<Cookie<'static>> {
        let tag = crypto::sign(session_id, &self.signing_key)?;
        Ok(Cookie::build(SESSION_COOKIE, format!("{session_id}.{tag}"))
            .http_only(true)
            .secure(self.cookie_secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(actix_web::cookie::time::Duration::hours(
                i64::try_from(self.session_duration_hours).unwrap_or(24),
            ))
            .finish())
    }

    /// Create an expired cookie to clear the session from the browser
    #[must_use]
    pub fn create_expired_cookie(&self) -> Cookie<'static> {
        Cookie::build(SESSION_COOKIE, "")
            .http_only(true)
            .secure(self.cookie_secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(actix_web::cookie::time::Duration::seconds(-1))
            .finish()
    }

    /// Load the session state for an id, defaulting to a fresh session
    /// (create-if-absent on first contact)
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store is unreachable
    pub async fn load_session(&self, session_id: &str) -> Result<SessionData> {
        Ok(self.store.load(session_id).await?.unwrap_or_default())
    }

    /// Persist session state under an id
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store rejects the write
    pub async fn save_session(&self, session_id: &str, data: SessionData) -> Result<()> {
        self.store.save(session_id, data).await
    }

    /// Drop all server-side state for an id
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store rejects the removal
    pub async fn destroy_session(&self, session_id: &str) -> Result<()> {
        self.store.destroy(session_id).await
    }

    /// Authenticated user for the request, if its session holds one
    ///
    /// Pure read: verifies the cookie, loads the session, and projects the
    /// snapshot without mutating anything.
    pub async fn authenticated_user(&self, req: &HttpRequest) -> Option<UserSnapshot> {
        let session_id = self.session_id_from_request(req)?;
        match self.store.load(&session_id).await {
            Ok(Some(session)) => session.user,
            Ok(None) => None,
            Err(e) => {
                log::error!("Failed to load session: {e}");
                None
            }
        }
    }
}
