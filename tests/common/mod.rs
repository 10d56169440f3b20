//! Shared helpers for integration tests

#![allow(dead_code)]

use bookgate::config::Config;
use bookgate::storage::{MemoryStorage, SharedStorage};
use bookgate::SessionManager;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const EMAIL: &str = "a@b.com";
pub const PASSWORD: &str = "Secret123";

/// A signed access token expiring `secs` seconds from now
///
/// Every call yields a distinct token.
pub fn token_expiring_in(secs: i64) -> String {
    let claims = json!({
        "sub": "1",
        "email": EMAIL,
        "exp": chrono::Utc::now().timestamp() + secs,
        "type": "access",
        "jti": uuid::Uuid::new_v4().to_string(),
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"server-side-secret"),
    )
    .expect("Failed to create token")
}

pub fn user_json() -> Value {
    json!({"id": 1, "email": EMAIL})
}

/// Config pointing at the mock backend with a fast cross-tab poll
pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::with_base_url(server.uri());
    config.storage.poll_interval_ms = 10;
    config
}

pub fn session_for(server: &MockServer) -> SessionManager {
    session_with_storage(server, Arc::new(MemoryStorage::new()))
}

pub fn session_with_storage(server: &MockServer, storage: Arc<dyn SharedStorage>) -> SessionManager {
    SessionManager::new(test_config(server), storage).expect("Failed to build session")
}

/// Expect exactly one successful login returning `access_token`
pub async fn mount_login(server: &MockServer, access_token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"email": EMAIL, "password": PASSWORD})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": access_token,
            "token_type": "bearer",
            "user": user_json(),
        })))
        .expect(1)
        .mount(server)
        .await;
}

/// Log `session` in against a login mock that has been mounted already
pub async fn login(session: &SessionManager) {
    session
        .login(EMAIL, PASSWORD)
        .await
        .expect("login should succeed");
    assert!(session.is_authenticated());
}

pub fn refresh_ok(access_token: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": access_token,
        "token_type": "bearer",
    }))
}

pub fn refresh_rejected() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({"detail": "No refresh token"}))
}

/// Wait until `check` holds for the session state, or fail after two seconds
pub async fn wait_until<F>(session: &SessionManager, check: F)
where
    F: Fn(&bookgate::SessionState) -> bool,
{
    let mut rx = session.subscribe();
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|state| check(state)))
        .await
        .expect("timed out waiting for session state")
        .expect("session dropped");
}
