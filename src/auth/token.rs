//! Access token inspection
//!
//! Tokens are decoded but never verified here; the backend checks signatures.
//! Anything that cannot be decoded is treated as already expired.

use jsonwebtoken::dangerous::insecure_decode;
use serde::{Deserialize, Serialize};

/// Claims carried in the access token payload
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TokenClaims {
    /// Expiration time (Unix seconds)
    pub exp: i64,
    /// Subject (user ID)
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Token kind, "access" for bearer tokens
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl TokenClaims {
    /// Expiry as a UTC timestamp
    pub fn expires_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp(self.exp, 0)
    }

    /// Seconds left before expiry, negative once expired
    pub fn seconds_remaining(&self, now: i64) -> i64 {
        self.exp - now
    }
}

/// Decode the payload of a token without checking its signature
pub fn decode_claims(token: &str) -> Option<TokenClaims> {
    match insecure_decode::<TokenClaims>(token) {
        Ok(data) => Some(data.claims),
        Err(e) => {
            tracing::debug!("Undecodable access token: {}", e);
            None
        }
    }
}

/// Expiry claim of a token, `None` if it cannot be decoded
pub fn expiry(token: &str) -> Option<i64> {
    decode_claims(token).map(|claims| claims.exp)
}

/// Whether a token stays valid for more than `skew_secs` after `now`
pub fn is_fresh(token: &str, now: i64, skew_secs: i64) -> bool {
    expiry(token).is_some_and(|exp| exp > now + skew_secs)
}
