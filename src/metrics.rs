//! Prometheus metrics collection for chatgate
//!
//! This module provides metrics instrumentation for tracking:
//! - Chat requests by outcome
//! - Upstream failures by classified kind
//! - Credential probes by result
//! - Streams interrupted after the response started
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.

use crate::error::ServiceErrorKind;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Final outcome of a chat request, as a bounded label set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Stream started
    Streamed,
    /// Rejected by input validation or body parsing
    Rejected,
    /// Failed with a service error
    Failed,
}

impl Outcome {
    /// Convert outcome to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Streamed => "streamed",
            Outcome::Rejected => "rejected",
            Outcome::Failed => "failed",
        }
    }
}

/// Metrics collector for chatgate
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    requests_total: IntCounterVec,
    upstream_errors: IntCounterVec,
    credential_probes: IntCounterVec,
    stream_interruptions: IntCounter,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// Registers all metrics with a new Prometheus registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: 3 outcomes
        let requests_total = IntCounterVec::new(
            Opts::new(
                "chatgate_requests_total",
                "Total number of chat requests by outcome",
            ),
            &["outcome"],
        )?;

        // Cardinality: 6 service error kinds
        let upstream_errors = IntCounterVec::new(
            Opts::new(
                "chatgate_upstream_errors_total",
                "Total number of classified upstream and credential failures by kind",
            ),
            &["kind"],
        )?;

        let credential_probes = IntCounterVec::new(
            Opts::new(
                "chatgate_credential_probes_total",
                "Total number of live credential probes by result",
            ),
            &["result"],
        )?;

        let stream_interruptions = IntCounter::new(
            "chatgate_stream_interruptions_total",
            "Total number of upstream streams that failed after the response started",
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(upstream_errors.clone()))?;
        registry.register(Box::new(credential_probes.clone()))?;
        registry.register(Box::new(stream_interruptions.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            upstream_errors,
            credential_probes,
            stream_interruptions,
        })
    }

    /// Record the outcome of a chat request
    pub fn record_request(&self, outcome: Outcome) {
        self.requests_total
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    /// Record a classified failure
    pub fn record_service_error(&self, kind: ServiceErrorKind) {
        self.upstream_errors.with_label_values(&[kind.as_str()]).inc();
    }

    /// Record a credential probe result
    pub fn record_probe(&self, success: bool) {
        let result = if success { "success" } else { "failure" };
        self.credential_probes.with_label_values(&[result]).inc();
    }

    /// Record a stream that broke after the response started
    pub fn record_stream_interruption(&self) {
        self.stream_interruptions.inc();
    }

    /// Number of probes issued so far (both results)
    pub fn probe_count(&self) -> u64 {
        ["success", "failure"]
            .iter()
            .map(|result| self.credential_probes.with_label_values(&[*result]).get())
            .sum()
    }

    /// Gather all metrics in Prometheus text format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| prometheus::Error::Msg(format!("Metrics output is not UTF-8: {}", e)))
    }
}
