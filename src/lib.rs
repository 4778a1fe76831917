//! chatgate - validated, credential-gated streaming chat relay
//!
//! This library accepts chat conversations over HTTP, validates them, gates
//! them behind a cached upstream credential probe and streams the response
//! of an OpenAI-compatible provider back to the caller.

pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod service;
pub mod telemetry;
pub mod upstream;
pub mod validation;
