// Health check endpoint
use actix_web::{HttpResponse, Result};

use crate::models::HealthResponse;

/// Liveness probe
///
/// # Errors
///
/// Never fails
pub async fn health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        message: "authgate is running".to_string(),
    }))
}
