//! Authentication models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend user identifier
///
/// The auth service issues string ids, but numeric ids are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Text(String),
    Number(i64),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Text(id) => write!(f, "{}", id),
            UserId::Number(id) => write!(f, "{}", id),
        }
    }
}

/// Identity of the signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Sign-in methods linked to the account ("password", "google")
    #[serde(default)]
    pub auth_methods: Vec<String>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl User {
    /// Name to show in the navbar: the user's name, or the local part of the email
    pub fn display_name(&self) -> &str {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => self.email.split('@').next().unwrap_or(&self.email),
        }
    }
}

/// Login credentials
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration details
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Successful login or registration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: User,
}

/// Successful refresh-cookie exchange
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Start of the Google OAuth handoff
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleAuthResponse {
    pub authorization_url: String,
}

/// Error body returned by the backend on non-2xx responses
///
/// `detail` is a plain message for auth failures but a structured list for
/// request validation failures, so it is kept untyped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: serde_json::Value,
}

impl ErrorBody {
    /// The backend message, if it is a non-empty string
    pub fn message(&self) -> Option<&str> {
        self.detail.as_str().filter(|detail| !detail.trim().is_empty())
    }
}
