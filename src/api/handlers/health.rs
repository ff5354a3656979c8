//! Liveness probe.

use axum::{Json, response::IntoResponse};
use serde_json::json;

/// Health check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    summary = "Liveness probe",
    responses(
        (status = 200, description = "Service is up"),
    )
)]
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
