//! HTTP request handlers for the chatgate API

use crate::config::Config;
use crate::credentials::{ApiKey, CredentialGate, KeyFormat};
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::middleware::request_id_middleware;
use crate::service::ChatService;
use crate::upstream::{OpenAiClient, UpstreamClient};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod chat;
pub mod extractor;
pub mod health;
pub mod metrics;

/// Application state shared across all handlers
///
/// All fields are Arc'd for cheap cloning across Axum handlers. The gate is
/// shared between the chat service and the health handler so both see the
/// same process-wide credential state.
#[derive(Clone)]
pub struct AppState {
    service: Arc<ChatService>,
    gate: Arc<CredentialGate>,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Create a new AppState talking to the configured OpenAI-compatible API
    ///
    /// Reads the API key from the environment variable named by
    /// `upstream.api_key_env`. A missing key is not an error here: the
    /// credential gate turns it into a configuration error per request.
    pub fn new(config: Arc<Config>) -> AppResult<Self> {
        let api_key = ApiKey::from_env(config.upstream.api_key_env());
        if api_key.is_none() {
            tracing::warn!(
                env_var = %config.upstream.api_key_env(),
                "Upstream API key is not set; chat requests will fail until it is configured"
            );
        }

        let client = OpenAiClient::new(&config.upstream, api_key.clone())
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Self::with_upstream(config, api_key, Arc::new(client))
    }

    /// Create an AppState around an arbitrary upstream client
    pub fn with_upstream(
        config: Arc<Config>,
        api_key: Option<ApiKey>,
        upstream: Arc<dyn UpstreamClient>,
    ) -> AppResult<Self> {
        let metrics = Arc::new(
            Metrics::new()
                .map_err(|e| AppError::Internal(format!("Failed to initialize metrics: {}", e)))?,
        );

        let gate = Arc::new(CredentialGate::new(
            api_key,
            KeyFormat::from(&config.upstream),
            Arc::clone(&upstream),
            Arc::clone(&metrics),
        ));

        let service = Arc::new(ChatService::new(
            config.limits,
            config.upstream.model(),
            Arc::clone(&gate),
            upstream,
            Arc::clone(&metrics),
        ));

        Ok(Self {
            service,
            gate,
            metrics,
        })
    }

    /// Get reference to the chat service
    pub fn service(&self) -> &ChatService {
        &self.service
    }

    /// Get reference to the credential gate
    pub fn gate(&self) -> &CredentialGate {
        &self.gate
    }

    /// Get reference to the metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

/// Build the application router with all routes and middleware
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(chat::handler))
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .with_state(state)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}
