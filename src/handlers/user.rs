// User-facing endpoints: protected profile plus the public home/login pages
use actix_web::{web, HttpRequest, HttpResponse, Result};
use serde::Deserialize;
use serde_json::json;

use crate::session::SessionManager;
use crate::utils::responses::ResponseBuilder;

#[derive(Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

/// Protected profile endpoint
///
/// Returns the authenticated user snapshot, or 401 for anonymous callers.
///
/// # Errors
///
/// Never fails; anonymous access yields a 401 response
pub async fn profile(
    req: HttpRequest,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse> {
    match sessions.authenticated_user(&req).await {
        Some(user) => Ok(ResponseBuilder::ok_json(&json!({ "user": user }))),
        None => Ok(ResponseBuilder::unauthorized()),
    }
}

/// Home endpoint: the signed-in user, or null when anonymous
///
/// # Errors
///
/// Never fails
pub async fn home(req: HttpRequest, sessions: web::Data<SessionManager>) -> Result<HttpResponse> {
    let user = sessions.authenticated_user(&req).await;
    Ok(ResponseBuilder::ok_json(&json!({ "user": user })))
}

/// Login endpoint: echoes the error code a failed callback redirected with
///
/// # Errors
///
/// Never fails
pub async fn login_page(query: web::Query<LoginQuery>) -> Result<HttpResponse> {
    let query = query.into_inner();
    Ok(ResponseBuilder::ok_json(&json!({ "error": query.error })))
}
