//! Raw JSON body extractor
//!
//! Parses the request body into an untyped [`serde_json::Value`] so that
//! schema validation can report its own fail-fast messages. Syntax errors
//! become `AppError::MalformedBody`, which renders a generic message and
//! keeps the parser text in the logs. The `Content-Type` header is not
//! required.

use crate::error::AppError;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde_json::Value;

/// Untyped JSON body
pub struct RawJson(pub Value);

impl<S> FromRequest<S> for RawJson
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::MalformedBody(rejection.body_text()))?;

        serde_json::from_slice(&bytes)
            .map(RawJson)
            .map_err(|e| AppError::MalformedBody(e.to_string()))
    }
}
