//! Chat orchestration
//!
//! Sequences input validation, the credential gate and the upstream call for
//! one request. Validation strictly precedes the credential check, which
//! strictly precedes the single upstream attempt.

use crate::config::LimitsConfig;
use crate::credentials::CredentialGate;
use crate::error::{AppResult, ServiceErrorKind};
use crate::metrics::Metrics;
use crate::middleware::RequestId;
use crate::upstream::{ChatStream, UpstreamClient, classify};
use crate::validation::validate;
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;

/// Stateless per-call orchestrator; the only shared state is the gate
pub struct ChatService {
    limits: LimitsConfig,
    model: String,
    gate: Arc<CredentialGate>,
    upstream: Arc<dyn UpstreamClient>,
    metrics: Arc<Metrics>,
}

impl ChatService {
    pub fn new(
        limits: LimitsConfig,
        model: impl Into<String>,
        gate: Arc<CredentialGate>,
        upstream: Arc<dyn UpstreamClient>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            limits,
            model: model.into(),
            gate,
            upstream,
            metrics,
        }
    }

    /// Handle one chat request, returning the live upstream stream
    ///
    /// # Errors
    ///
    /// - `Validation` for malformed input (no network activity happens)
    /// - any `ServiceErrorKind` from the credential gate or the upstream call
    ///
    /// An upstream `Authentication` failure also invalidates the gate so the
    /// next request probes the credential again.
    pub async fn handle(&self, raw: &Value, request_id: RequestId) -> AppResult<ChatStream> {
        let request = validate(raw, &self.limits)?;
        tracing::debug!(
            request_id = %request_id,
            message_count = request.messages().len(),
            "Request validated"
        );

        self.gate.ensure_ready().await?;

        let stream = match self
            .upstream
            .stream_chat(&self.model, request.messages())
            .await
        {
            Ok(stream) => stream,
            Err(failure) => {
                let kind = classify(&failure);
                tracing::error!(
                    request_id = %request_id,
                    model = %self.model,
                    classified_as = kind.as_str(),
                    "Upstream chat call failed"
                );
                if kind == ServiceErrorKind::Authentication {
                    self.gate.invalidate();
                }
                return Err(kind.into());
            }
        };

        tracing::info!(
            request_id = %request_id,
            model = %self.model,
            "Upstream stream started"
        );

        Ok(self.observe(stream, request_id))
    }

    /// Log and count mid-stream failures without altering the bytes
    fn observe(&self, stream: ChatStream, request_id: RequestId) -> ChatStream {
        let metrics = Arc::clone(&self.metrics);
        let mut bytes_received = 0usize;

        stream
            .map(move |chunk| {
                match &chunk {
                    Ok(bytes) => bytes_received += bytes.len(),
                    Err(e) => {
                        metrics.record_stream_interruption();
                        tracing::warn!(
                            request_id = %request_id,
                            bytes_received,
                            error = %e,
                            "Upstream stream interrupted"
                        );
                    }
                }
                chunk
            })
            .boxed()
    }
}
