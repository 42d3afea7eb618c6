// Authentication handlers: login initiation and logout
use actix_web::{web, HttpRequest, HttpResponse, Result};
use log::{debug, error, info};

use crate::auth::Authenticator;
use crate::session::SessionManager;
use crate::utils::responses::{ResponseBuilder, LOGIN_PATH};

/// Login initiation handler
///
/// Requires an anonymous caller; an already-authenticated session is sent
/// back home. Otherwise a fresh anti-forgery token is stored as the
/// session's pending token and the browser is redirected to the provider.
///
/// # Errors
///
/// Never fails; internal errors degrade to an error redirect
pub async fn login_start(
    req: HttpRequest,
    authenticator: web::Data<Authenticator>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse> {
    let session_id = sessions.get_or_create_session_id(&req);
    let mut session = match sessions.load_session(&session_id).await {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to load session, starting fresh: {e}");
            crate::session::SessionData::default()
        }
    };

    if session.is_authenticated() {
        debug!("Authenticated session requested login start, redirecting home");
        return Ok(ResponseBuilder::redirect("/"));
    }

    let authorization_url = authenticator.begin_login(&mut session);

    if let Err(e) = sessions.save_session(&session_id, session).await {
        error!("Failed to persist pending login state: {e}");
        return Ok(ResponseBuilder::login_error_redirect("session_error"));
    }

    let session_cookie = match sessions.create_session_cookie(&session_id) {
        Ok(cookie) => cookie,
        Err(e) => {
            error!("Failed to create session cookie: {e}");
            return Ok(ResponseBuilder::login_error_redirect("session_error"));
        }
    };

    info!("Redirecting to provider authorization endpoint");
    Ok(ResponseBuilder::redirect_with_cookies(
        &authorization_url,
        vec![session_cookie],
    ))
}

/// Logout handler
///
/// Requires an authenticated caller. Destroys the server-side session and
/// expires the cookie; a store failure is logged but the cookie is cleared
/// regardless, so the local effect of logout is best-effort applied.
///
/// # Errors
///
/// Never fails; internal errors degrade to an error redirect
pub async fn logout(
    req: HttpRequest,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse> {
    let Some(session_id) = sessions.session_id_from_request(&req) else {
        return Ok(ResponseBuilder::redirect(LOGIN_PATH));
    };

    let authenticated = match sessions.load_session(&session_id).await {
        Ok(session) => session.is_authenticated(),
        Err(e) => {
            error!("Failed to load session during logout: {e}");
            false
        }
    };
    if !authenticated {
        return Ok(ResponseBuilder::redirect(LOGIN_PATH));
    }

    if let Err(e) = sessions.destroy_session(&session_id).await {
        error!("Failed to destroy session: {e}");
    }
    info!("User signed out and session destroyed");

    Ok(ResponseBuilder::redirect_with_cookies(
        LOGIN_PATH,
        vec![sessions.create_expired_cookie()],
    ))
}
