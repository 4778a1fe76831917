//! Integration tests for CLI config command
//!
//! Tests file I/O for the `chatgate config` subcommand output: the written
//! template must load back through `Config::from_file` with default values.

use chatgate::cli::generate_config_template;
use chatgate::config::Config;
use std::fs;
use tempfile::TempDir;

/// Helper to create temporary directory for file operations
fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

#[test]
fn test_template_roundtrip_matches_defaults() {
    let temp_dir = create_temp_dir();
    let config_path = temp_dir.path().join("config.toml");

    fs::write(&config_path, generate_config_template()).expect("Failed to write template");
    let config = Config::from_file(&config_path).expect("Generated template should load");
    let defaults = Config::default();

    assert_eq!(config.server.host, defaults.server.host);
    assert_eq!(config.server.port, defaults.server.port);
    assert_eq!(config.upstream.base_url(), defaults.upstream.base_url());
    assert_eq!(config.upstream.model(), defaults.upstream.model());
    assert_eq!(config.upstream.api_key_env(), defaults.upstream.api_key_env());
    assert_eq!(
        config.upstream.connect_timeout_seconds(),
        defaults.upstream.connect_timeout_seconds()
    );
    assert_eq!(
        config.upstream.probe_timeout_seconds(),
        defaults.upstream.probe_timeout_seconds()
    );
    assert_eq!(config.upstream.key_prefix(), defaults.upstream.key_prefix());
    assert_eq!(
        config.upstream.min_key_length(),
        defaults.upstream.min_key_length()
    );
    assert_eq!(config.limits, defaults.limits);
    assert_eq!(
        config.observability.log_level,
        defaults.observability.log_level
    );
}

#[test]
fn test_template_never_contains_a_key() {
    let template = generate_config_template();
    assert!(!template.contains("api_key ="));
    assert!(template.contains("api_key_env"));
}

#[test]
fn test_template_includes_documentation() {
    let template = generate_config_template();
    assert!(template.contains("# "), "Template should have comments");
    assert!(template.contains("chatgate"), "Template should have header");
    assert!(
        template.contains("INPUT LIMITS"),
        "Template should document limits"
    );
}

#[test]
fn test_write_to_nonexistent_parent_fails() {
    let temp_dir = create_temp_dir();
    let bad_path = temp_dir.path().join("nonexistent").join("config.toml");

    let result = fs::write(&bad_path, generate_config_template());
    assert!(result.is_err());
    assert_eq!(result.unwrap_err().kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn test_partial_config_file_fills_defaults() {
    let temp_dir = create_temp_dir();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[upstream]\nmodel = \"gpt-4o-mini\"\n").unwrap();

    let config = Config::from_file(&config_path).unwrap();
    assert_eq!(config.upstream.model(), "gpt-4o-mini");
    assert_eq!(config.upstream.base_url(), "https://api.openai.com/v1");
    assert_eq!(config.limits.max_messages, 50);
}
