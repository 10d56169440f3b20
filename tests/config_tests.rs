//! Configuration loading tests
//!
//! Run with: cargo test --test config_tests

use bookgate::config::{load_config, load_config_from_path, Config, CONFIG_FILENAME};
use bookgate::error::Error;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

fn write_config(content: &str) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join(CONFIG_FILENAME);
    fs::write(&path, content).expect("Failed to write config");
    (dir, path)
}

#[test]
fn test_load_full_config() {
    let (_dir, path) = write_config(
        r#"
[api]
base_url = "https://book.example.com"
chat_endpoint = "/api/v1/chat"

[session]
refresh_skew_secs = 60

[storage]
dir = "/tmp/bookgate-shared"
poll_interval_ms = 250

[gate]
protected_prefixes = ["/docs", "/members"]
"#,
    );

    let config = load_config(Some(&path)).expect("Failed to load config");

    assert_eq!(config.api.base_url, "https://book.example.com");
    assert_eq!(config.chat_url(), "https://book.example.com/api/v1/chat");
    assert_eq!(config.session.refresh_skew_secs, 60);
    assert_eq!(config.storage.dir.to_str(), Some("/tmp/bookgate-shared"));
    assert_eq!(config.storage.poll_interval(), Duration::from_millis(250));
    assert_eq!(config.gate.protected_prefixes.len(), 2);
}

#[test]
fn test_partial_config_keeps_defaults() {
    let (_dir, path) = write_config("[api]\nbase_url = \"http://127.0.0.1:9000\"\n");

    let config = load_config_from_path(&path).expect("Failed to load config");
    let defaults = Config::default();

    assert_eq!(config.api.base_url, "http://127.0.0.1:9000");
    assert_eq!(config.api.chat_endpoint, defaults.api.chat_endpoint);
    assert_eq!(config.session.refresh_skew_secs, 30);
    assert_eq!(config.gate.protected_prefixes, defaults.gate.protected_prefixes);
}

#[test]
fn test_env_var_interpolation() {
    std::env::set_var("BOOKGATE_CONFIG_TEST_URL", "http://from-env:8000");
    let (_dir, path) = write_config(
        "[api]\nbase_url = \"${BOOKGATE_CONFIG_TEST_URL:-http://fallback}\"\n\
         [storage]\ndir = \"${BOOKGATE_CONFIG_TEST_MISSING:-/tmp/fallback}\"\n",
    );

    let config = load_config_from_path(&path).expect("Failed to load config");
    std::env::remove_var("BOOKGATE_CONFIG_TEST_URL");

    assert_eq!(config.api.base_url, "http://from-env:8000");
    assert_eq!(config.storage.dir.to_str(), Some("/tmp/fallback"));
}

#[test]
fn test_invalid_toml_is_a_parse_error() {
    let (_dir, path) = write_config("[api\nbase_url = ");
    let result = load_config_from_path(&path);
    assert!(matches!(result, Err(Error::TomlParse(_))));
}

#[test]
fn test_wrong_type_is_a_parse_error() {
    let (_dir, path) = write_config("[session]\nrefresh_skew_secs = \"soon\"\n");
    assert!(load_config_from_path(&path).is_err());
}

#[test]
fn test_missing_file_is_config_not_found() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let result = load_config_from_path(&dir.path().join(CONFIG_FILENAME));

    let err = result.unwrap_err();
    assert!(matches!(err, Error::ConfigNotFound));
    assert!(err.to_string().contains("bookgate init"));
}
