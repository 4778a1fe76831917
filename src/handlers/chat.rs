//! Chat endpoint handler
//!
//! Handles POST /api/chat: parses the body, runs the chat service and
//! forwards the upstream event stream to the caller unmodified.

use crate::error::AppError;
use crate::handlers::AppState;
use crate::handlers::extractor::RawJson;
use crate::metrics::Outcome;
use crate::middleware::RequestId;
use axum::{
    Extension,
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};

/// POST /api/chat handler
///
/// # Responses
///
/// - `200 OK` with `text/event-stream` body carrying the upstream stream
/// - `400` for malformed JSON, schema violations or upstream bad requests
/// - `429` when the upstream rate limits
/// - `500` when the service is misconfigured
/// - `503` when the upstream is unavailable, out of quota or rejects the key
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<RawJson, AppError>,
) -> Response {
    let result = match body {
        Ok(RawJson(raw)) => state.service().handle(&raw, request_id).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(stream) => {
            state.metrics().record_request(Outcome::Streamed);
            (
                [
                    (header::CONTENT_TYPE, "text/event-stream"),
                    (header::CACHE_CONTROL, "no-cache"),
                ],
                Body::from_stream(stream),
            )
                .into_response()
        }
        Err(e) => {
            let outcome = match &e {
                AppError::Validation(_) | AppError::MalformedBody(_) => Outcome::Rejected,
                AppError::Service(kind) => {
                    state.metrics().record_service_error(*kind);
                    Outcome::Failed
                }
                _ => Outcome::Failed,
            };
            state.metrics().record_request(outcome);

            tracing::warn!(
                request_id = %request_id,
                error = %e,
                "Chat request failed"
            );
            e.into_response()
        }
    }
}
