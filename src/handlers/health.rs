//! Health check endpoint
//!
//! Provides a simple health check for monitoring and load balancers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Credential gate state: "untested", "probing" or "tested"
    pub credential_state: &'static str,
}

/// Health check handler
///
/// Always returns 200 OK; the credential state is informational and never
/// triggers a probe.
pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "OK",
            credential_state: state.gate().state().as_str(),
        }),
    )
}
