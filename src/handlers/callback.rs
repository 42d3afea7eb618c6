// OAuth callback handler
use actix_web::{web, HttpRequest, HttpResponse, Result};
use log::{error, info, warn};

use crate::auth::{AuthError, Authenticator};
use crate::oauth::CallbackParams;
use crate::session::SessionManager;
use crate::utils::responses::ResponseBuilder;

/// Provider callback handler, the critical path of the flow
///
/// Delegates validation, exchange and upsert to the orchestrator; its only
/// jobs are session plumbing and converting the error taxonomy into a
/// login-page redirect. The mutated session is written back on success and
/// failure alike so the pending token's single-use consumption sticks.
///
/// # Errors
///
/// Never fails; all orchestrator errors degrade to an error redirect
pub async fn oauth_callback(
    query: web::Query<CallbackParams>,
    req: HttpRequest,
    authenticator: web::Data<Authenticator>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse> {
    let Some(session_id) = sessions.session_id_from_request(&req) else {
        // No session to validate against: treat like a forged callback
        warn!("Callback received without a valid session cookie");
        return Ok(ResponseBuilder::login_error_redirect(
            AuthError::InvalidState.code(),
        ));
    };

    let mut session = match sessions.load_session(&session_id).await {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to load session for callback: {e}");
            return Ok(ResponseBuilder::login_error_redirect("session_error"));
        }
    };

    let result = authenticator.handle_callback(&mut session, &query).await;

    // Write-back happens before the outcome is inspected: even a rejected
    // callback must leave the consumed pending token cleared in the store
    if let Err(e) = sessions.save_session(&session_id, session).await {
        error!("Failed to persist session after callback: {e}");
        return Ok(ResponseBuilder::login_error_redirect("session_error"));
    }

    match result {
        Ok(snapshot) => {
            info!("Login completed for {}", snapshot.email);
            let cookie = match sessions.create_session_cookie(&session_id) {
                Ok(cookie) => cookie,
                Err(e) => {
                    error!("Failed to create session cookie: {e}");
                    return Ok(ResponseBuilder::login_error_redirect("session_error"));
                }
            };
            Ok(ResponseBuilder::redirect_with_cookies("/", vec![cookie]))
        }
        Err(e) => {
            warn!("Login callback failed: {e}");
            Ok(ResponseBuilder::login_error_redirect(e.code()))
        }
    }
}
