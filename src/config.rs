//! Configuration management for chatgate
//!
//! Parses TOML configuration files and provides typed access to settings.
//! The upstream API key is never part of the file; it is read once from the
//! environment variable named by `upstream.api_key_env`.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Upper bound for the connect and probe timeouts (seconds)
const MAX_TIMEOUT_SECONDS: u64 = 300;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Upstream LLM provider configuration
///
/// Fields are private; invariants are checked by `Config::validate()` and
/// exposed through accessors.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default = "default_model")]
    model: String,
    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    api_key_env: String,
    #[serde(default = "default_connect_timeout")]
    connect_timeout_seconds: u64,
    /// Total time allowed for the credential probe request
    #[serde(default = "default_probe_timeout")]
    probe_timeout_seconds: u64,
    /// Expected API key prefix (format check only)
    #[serde(default = "default_key_prefix")]
    key_prefix: String,
    #[serde(default = "default_min_key_length")]
    min_key_length: usize,
}

impl UpstreamConfig {
    /// Get the API base URL (e.g. `https://api.openai.com/v1`)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the model identifier sent with every chat call
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the environment variable name holding the API key
    pub fn api_key_env(&self) -> &str {
        &self.api_key_env
    }

    /// Get the connect timeout in seconds
    pub fn connect_timeout_seconds(&self) -> u64 {
        self.connect_timeout_seconds
    }

    /// Get the credential probe timeout in seconds
    pub fn probe_timeout_seconds(&self) -> u64 {
        self.probe_timeout_seconds
    }

    /// Get the expected API key prefix
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Get the minimum accepted API key length
    pub fn min_key_length(&self) -> usize {
        self.min_key_length
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            connect_timeout_seconds: default_connect_timeout(),
            probe_timeout_seconds: default_probe_timeout(),
            key_prefix: default_key_prefix(),
            min_key_length: default_min_key_length(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_key_prefix() -> String {
    "sk-".to_string()
}

fn default_min_key_length() -> usize {
    20
}

/// Input validation limits
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct LimitsConfig {
    /// Maximum characters (Unicode scalar values) per message
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
    /// Maximum messages per conversation
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_message_length: default_max_message_length(),
            max_messages: default_max_messages(),
        }
    }
}

fn default_max_message_length() -> usize {
    500
}

fn default_max_messages() -> usize {
    50
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        // Phase 1: Read file (preserves io::Error context)
        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        // Phase 2: Parse TOML (preserves toml::de::Error context)
        let config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        // Phase 3: Validate parsed config (provides contextual reason)
        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Validate configuration invariants
    pub fn validate(&self) -> AppResult<()> {
        let base_url = self.upstream.base_url();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "upstream.base_url must start with http:// or https://, got '{}'",
                base_url
            )));
        }

        if self.upstream.model().trim().is_empty() {
            return Err(AppError::Config("upstream.model cannot be empty".to_string()));
        }

        if self.upstream.api_key_env().trim().is_empty() {
            return Err(AppError::Config("upstream.api_key_env cannot be empty".to_string()));
        }

        for (field, timeout) in [
            ("upstream.connect_timeout_seconds", self.upstream.connect_timeout_seconds()),
            ("upstream.probe_timeout_seconds", self.upstream.probe_timeout_seconds()),
        ] {
            if timeout == 0 || timeout > MAX_TIMEOUT_SECONDS {
                return Err(AppError::Config(format!(
                    "{} must be in 1..={}, got {}",
                    field, MAX_TIMEOUT_SECONDS, timeout
                )));
            }
        }

        if self.limits.max_message_length == 0 {
            return Err(AppError::Config(
                "limits.max_message_length must be greater than 0".to_string(),
            ));
        }

        if self.limits.max_messages == 0 {
            return Err(AppError::Config(
                "limits.max_messages must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config = toml::from_str(toml_str)
            .map_err(|e| AppError::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}
