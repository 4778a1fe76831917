//! Command-line interface for chatgate
//!
//! Provides argument parsing and subcommand handling for the chatgate binary.

use clap::{Parser, Subcommand};

/// Validated, credential-gated streaming chat relay
#[derive(Parser)]
#[command(name = "chatgate")]
#[command(version)]
#[command(about = "Validated, credential-gated streaming chat relay")]
#[command(
    long_about = "chatgate accepts chat conversations on POST /api/chat, validates them, \
    checks the upstream API key once per process and streams the provider's response back."
)]
pub struct Cli {
    /// Path to configuration file (defaults are used if it does not exist)
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# chatgate Configuration
# ======================
#
# Every setting below is optional; the values shown are the defaults.
# The API key itself is never stored here. Export it in the environment
# variable named by upstream.api_key_env before starting the server.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER CONFIGURATION
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 3000

# ─────────────────────────────────────────────────────────────────────────────
# UPSTREAM PROVIDER
# ─────────────────────────────────────────────────────────────────────────────

[upstream]
# OpenAI-compatible API base URL (chat/completions and models are appended)
base_url = "https://api.openai.com/v1"

# Model identifier sent with every chat request
model = "gpt-4o"

# Environment variable holding the API key
api_key_env = "OPENAI_API_KEY"

# TCP connect timeout in seconds (1-300). Streams themselves are not time-limited.
connect_timeout_seconds = 10

# Total time allowed for the credential check against GET {base_url}/models (1-300)
probe_timeout_seconds = 5

# Shape check applied to the key before the first live probe
key_prefix = "sk-"
min_key_length = 20

# ─────────────────────────────────────────────────────────────────────────────
# INPUT LIMITS
# ─────────────────────────────────────────────────────────────────────────────

[limits]
# Maximum characters per message
max_message_length = 500

# Maximum messages per conversation
max_messages = 50

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error" (RUST_LOG overrides)
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port
"#
}
