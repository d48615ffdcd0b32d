use axum::{response::IntoResponse, Json};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

/// GET /healthz - liveness and identity probe
pub async fn healthz() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        service: "flextool-lp",
        version: env!("CARGO_PKG_VERSION"),
    })
}
