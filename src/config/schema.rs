//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub gate: GateConfig,
}

/// Backend endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the auth and chat backend, without a trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_chat_endpoint")]
    pub chat_endpoint: String,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_chat_endpoint() -> String {
    "/api/chat".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            chat_endpoint: default_chat_endpoint(),
        }
    }
}

/// Session manager tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// A held token is reused only while it stays valid for at least this long
    #[serde(default = "default_refresh_skew_secs")]
    pub refresh_skew_secs: i64,
}

fn default_refresh_skew_secs() -> i64 {
    30
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_skew_secs: default_refresh_skew_secs(),
        }
    }
}

/// Shared storage used for cross-tab signals and the chat session id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("./.bookgate")
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl StorageConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Route gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Paths starting with any of these prefixes require a signed-in user
    #[serde(default = "default_protected_prefixes")]
    pub protected_prefixes: Vec<String>,
}

fn default_protected_prefixes() -> Vec<String> {
    vec!["/docs".to_string()]
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            protected_prefixes: default_protected_prefixes(),
        }
    }
}

impl Config {
    /// Build a config pointing at a specific backend, everything else default
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                base_url: base_url.into(),
                ..ApiConfig::default()
            },
            ..Self::default()
        }
    }

    /// Resolve a path against the configured backend base URL
    pub fn endpoint(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}{}", self.api.base_url.trim_end_matches('/'), path)
    }

    /// Full URL of the chat endpoint
    pub fn chat_url(&self) -> String {
        self.endpoint(&self.api.chat_endpoint)
    }
}
