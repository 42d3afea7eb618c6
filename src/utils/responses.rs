//! HTTP response helpers
//!
//! A trimmed-down unified interface for the response shapes this service
//! produces: redirects (with and without cookies), login-page error
//! redirects, and JSON errors. Common bodies are pre-serialized once.

use actix_web::{cookie::Cookie, http::header, HttpResponse};
use serde_json::json;
use std::sync::LazyLock;

/// Path of the login page that callback failures redirect to
pub const LOGIN_PATH: &str = "/login";

/// Pre-serialized body for the 401 response on protected resources
static UNAUTHORIZED_BODY: LazyLock<String> = LazyLock::new(|| {
    let body = json!({
        "error": "unauthorized",
        "error_description": "Authentication is required to access this resource"
    });
    serde_json::to_string(&body).expect("Failed to serialize JSON")
});

/// Unified response builder
pub struct ResponseBuilder;

impl ResponseBuilder {
    /// Create a redirect response (302 Found)
    #[must_use]
    pub fn redirect(location: &str) -> HttpResponse {
        HttpResponse::Found()
            .append_header(("Location", location.to_string()))
            .finish()
    }

    /// Create a redirect response with cookies attached
    #[must_use]
    pub fn redirect_with_cookies(location: &str, cookies: Vec<Cookie<'static>>) -> HttpResponse {
        let mut builder = HttpResponse::Found();
        for cookie in cookies {
            builder.cookie(cookie);
        }
        builder
            .append_header(("Location", location.to_string()))
            .finish()
    }

    /// Redirect to the login page carrying a URL-encoded error code
    #[must_use]
    pub fn login_error_redirect(error_code: &str) -> HttpResponse {
        let location = format!("{LOGIN_PATH}?error={}", urlencoding::encode(error_code));
        Self::redirect(&location)
    }

    /// Redirect to the login page carrying an error code plus cookies
    #[must_use]
    pub fn login_error_redirect_with_cookies(
        error_code: &str,
        cookies: Vec<Cookie<'static>>,
    ) -> HttpResponse {
        let location = format!("{LOGIN_PATH}?error={}", urlencoding::encode(error_code));
        Self::redirect_with_cookies(&location, cookies)
    }

    /// 401 Unauthorized with the cached JSON body
    #[must_use]
    pub fn unauthorized() -> HttpResponse {
        HttpResponse::Unauthorized()
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .body(UNAUTHORIZED_BODY.clone())
    }

    /// 200 OK with a JSON body
    #[must_use]
    pub fn ok_json<T: serde::Serialize>(data: &T) -> HttpResponse {
        HttpResponse::Ok().json(data)
    }
}
