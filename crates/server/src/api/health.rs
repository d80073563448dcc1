//! Health check endpoint.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

/// Tag for OpenAPI documentation.
pub const MISC_TAG: &str = "Miscellaneous";

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    health: &'static str,
    status: &'static str,
}

/// Health check endpoint.
#[tracing::instrument()]
#[utoipa::path(
    method(get, head),
    path = "/healthz",
    tag = MISC_TAG,
    operation_id = "Health Check",
    summary = "Service health check",
    description = "Returns a simple health status indicating the service is running and accepting requests.\n\n\
                   Also served at `/`. Supports both GET and HEAD for load balancer probes.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthStatus, example = json!({"health": "OK", "status": "running"}))
    )
)]
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        health: "OK",
        status: "running",
    })
}
