//! Credential gate with a cached, single-flight live probe
//!
//! Every chat request passes through [`CredentialGate::ensure_ready`]. The
//! key's shape is checked on each call; the live probe runs at most once at a
//! time and its success is cached until [`CredentialGate::invalidate`].
//!
//! ```text
//! Untested ──ensure_ready──▶ Probing ──ok──▶ Tested
//!     ▲                         │               │
//!     └────────── err ──────────┘               │
//!     └──────────────── invalidate ─────────────┘
//! ```
//!
//! Callers arriving while a probe is in flight await that same probe
//! (a cloned [`Shared`] future) and observe its outcome.

use super::{ApiKey, KeyFormat};
use crate::error::ServiceErrorKind;
use crate::metrics::Metrics;
use crate::upstream::{UpstreamClient, classify};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type ProbeFuture = Shared<BoxFuture<'static, Result<(), ServiceErrorKind>>>;

/// Observable credential state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    Untested,
    Probing,
    Tested,
}

impl CredentialState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Untested => "untested",
            Self::Probing => "probing",
            Self::Tested => "tested",
        }
    }
}

enum ProbeState {
    Untested,
    Probing { generation: u64, probe: ProbeFuture },
    Tested,
}

struct Inner {
    state: ProbeState,
    // Bumped for every new probe; a finished probe only updates the state
    // if it is still the current one.
    generation: u64,
}

/// Process-wide gate in front of the upstream provider
pub struct CredentialGate {
    api_key: Option<ApiKey>,
    format: KeyFormat,
    upstream: Arc<dyn UpstreamClient>,
    metrics: Arc<Metrics>,
    inner: Mutex<Inner>,
}

impl CredentialGate {
    /// Create a gate in the `Untested` state
    pub fn new(
        api_key: Option<ApiKey>,
        format: KeyFormat,
        upstream: Arc<dyn UpstreamClient>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            api_key,
            format,
            upstream,
            metrics,
            inner: Mutex::new(Inner {
                state: ProbeState::Untested,
                generation: 0,
            }),
        }
    }

    // The lock is never held across an await and no code path panics while
    // holding it, so a poisoned state is still consistent.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state, for health reporting
    pub fn state(&self) -> CredentialState {
        match self.lock().state {
            ProbeState::Untested => CredentialState::Untested,
            ProbeState::Probing { .. } => CredentialState::Probing,
            ProbeState::Tested => CredentialState::Tested,
        }
    }

    /// Make sure the credential is usable before a chat request
    ///
    /// # Errors
    ///
    /// - `Configuration` if no key is configured
    /// - `Authentication` if the key is malformed or the probe rejects it
    /// - any other classified kind if the probe fails for another reason
    pub async fn ensure_ready(&self) -> Result<(), ServiceErrorKind> {
        self.format.check(self.api_key.as_ref())?;

        let (generation, probe) = {
            let mut inner = self.lock();
            match &inner.state {
                ProbeState::Tested => return Ok(()),
                ProbeState::Probing { generation, probe } => {
                    tracing::debug!(generation, "Joining in-flight credential probe");
                    (*generation, probe.clone())
                }
                ProbeState::Untested => {
                    inner.generation += 1;
                    let generation = inner.generation;
                    let probe = self.start_probe(generation);
                    inner.state = ProbeState::Probing {
                        generation,
                        probe: probe.clone(),
                    };
                    (generation, probe)
                }
            }
        };

        let result = probe.await;

        let mut inner = self.lock();
        let is_current = matches!(
            &inner.state,
            ProbeState::Probing { generation: current, .. } if *current == generation
        );
        if is_current {
            inner.state = match result {
                Ok(()) => ProbeState::Tested,
                Err(_) => ProbeState::Untested,
            };
        }

        result
    }

    /// Drop a cached successful probe so the next request probes again
    ///
    /// Called when a live request reports an authentication failure, e.g.
    /// after the key was rotated. Has no effect while a probe is in flight.
    pub fn invalidate(&self) {
        let mut inner = self.lock();
        if matches!(inner.state, ProbeState::Tested) {
            inner.state = ProbeState::Untested;
            tracing::warn!("Credential marked untested; next request will re-probe");
        }
    }

    fn start_probe(&self, generation: u64) -> ProbeFuture {
        let upstream = Arc::clone(&self.upstream);
        let metrics = Arc::clone(&self.metrics);

        async move {
            tracing::info!(generation, "Probing upstream credential");
            match upstream.probe().await {
                Ok(()) => {
                    metrics.record_probe(true);
                    tracing::info!(generation, "Upstream credential accepted");
                    Ok(())
                }
                Err(failure) => {
                    metrics.record_probe(false);
                    let kind = classify(&failure);
                    tracing::error!(
                        generation,
                        classified_as = kind.as_str(),
                        "Upstream credential probe failed"
                    );
                    Err(kind)
                }
            }
        }
        .boxed()
        .shared()
    }
}
