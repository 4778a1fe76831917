//! Upstream credential handling
//!
//! [`ApiKey`] holds the secret read at startup; [`KeyFormat`] performs the
//! synchronous shape check; [`CredentialGate`] adds the cached live probe.

pub mod gate;

pub use gate::{CredentialGate, CredentialState};

use crate::config::UpstreamConfig;
use crate::error::ServiceErrorKind;

/// Template syntax and words that never appear in a real key
const PLACEHOLDER_MARKERS: &[&str] = &["${", "{{", "}}", "<", ">", "placeholder", "changeme"];

/// Find a placeholder marker in a lowercased key
///
/// `your` and runs of `x` only count as whole `-`/`_`-separated segments, so
/// random key material that happens to contain them is not rejected.
fn placeholder_marker(lowered: &str) -> Option<&str> {
    if let Some(marker) = PLACEHOLDER_MARKERS
        .iter()
        .find(|marker| lowered.contains(**marker))
    {
        return Some(*marker);
    }

    lowered
        .split(['-', '_'])
        .find(|segment| {
            *segment == "your" || (segment.len() >= 4 && segment.chars().all(|c| c == 'x'))
        })
}

/// Upstream API key
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Read the key from an environment variable
    ///
    /// Unset and empty variables both yield `None`.
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var)
            .ok()
            .filter(|value| !value.is_empty())
            .map(Self)
    }

    /// Get the raw secret (for the Authorization header only)
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ApiKey(<redacted, {} chars>)", self.0.chars().count())
    }
}

/// Expected shape of a usable API key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFormat {
    prefix: String,
    min_length: usize,
}

impl KeyFormat {
    pub fn new(prefix: impl Into<String>, min_length: usize) -> Self {
        Self {
            prefix: prefix.into(),
            min_length,
        }
    }

    /// Check the key's presence and shape without any network access
    ///
    /// # Errors
    ///
    /// - `Configuration` when the key is absent or blank
    /// - `Authentication` when the key has the wrong prefix, is too short,
    ///   contains whitespace, or still carries a placeholder marker
    pub fn check(&self, key: Option<&ApiKey>) -> Result<(), ServiceErrorKind> {
        let key = match key {
            Some(key) if !key.expose().trim().is_empty() => key.expose(),
            _ => {
                tracing::error!("Upstream API key is not configured");
                return Err(ServiceErrorKind::Configuration);
            }
        };

        if !key.starts_with(&self.prefix) {
            tracing::error!(expected_prefix = %self.prefix, "Upstream API key has an unexpected prefix");
            return Err(ServiceErrorKind::Authentication);
        }

        if key.chars().count() < self.min_length {
            tracing::error!(
                min_length = self.min_length,
                "Upstream API key is shorter than expected"
            );
            return Err(ServiceErrorKind::Authentication);
        }

        if key.chars().any(char::is_whitespace) {
            tracing::error!("Upstream API key contains whitespace");
            return Err(ServiceErrorKind::Authentication);
        }

        let lowered = key.to_lowercase();
        if let Some(marker) = placeholder_marker(&lowered) {
            tracing::error!(marker = %marker, "Upstream API key looks like an unfilled placeholder");
            return Err(ServiceErrorKind::Authentication);
        }

        Ok(())
    }
}

impl From<&UpstreamConfig> for KeyFormat {
    fn from(config: &UpstreamConfig) -> Self {
        Self::new(config.key_prefix(), config.min_key_length())
    }
}
