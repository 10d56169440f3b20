//! Session management
//!
//! One [`SessionManager`] exists per tab. It keeps the access token in memory
//! only; the refresh cookie held by the HTTP client's cookie jar is what lets
//! a new tab (or a restarted one) get back in without a password.

use crate::auth::models::{
    AuthResponse, ErrorBody, GoogleAuthResponse, LoginRequest, RefreshResponse, RegisterRequest,
    User,
};
use crate::auth::token::{self, TokenClaims};
use crate::auth::validation;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::{LogoutSignal, SharedStorage};
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";
const GOOGLE_UNAVAILABLE: &str = "Google sign-in unavailable";

/// Where a tab is in its authentication lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Initializing,
    Authenticated,
    Anonymous,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Initializing => write!(f, "initializing"),
            SessionPhase::Authenticated => write!(f, "authenticated"),
            SessionPhase::Anonymous => write!(f, "anonymous"),
        }
    }
}

/// Authentication state of one tab
#[derive(Clone)]
pub struct SessionState {
    user: Option<User>,
    access_token: Option<String>,
    loading: bool,
}

impl SessionState {
    fn initializing() -> Self {
        Self {
            user: None,
            access_token: None,
            loading: true,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }

    /// Decoded claims of the held access token
    pub fn token_claims(&self) -> Option<TokenClaims> {
        self.access_token.as_deref().and_then(token::decode_claims)
    }

    /// Signed in: both a user and an access token are held
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.access_token.is_some()
    }

    /// True until the startup restore attempt has finished
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn phase(&self) -> SessionPhase {
        if self.loading {
            SessionPhase::Initializing
        } else if self.is_authenticated() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }

    fn adopt(&mut self, access_token: String, user: User) {
        self.access_token = Some(access_token);
        self.user = Some(user);
    }

    fn clear(&mut self) {
        self.user = None;
        self.access_token = None;
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("user", &self.user)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("loading", &self.loading)
            .finish()
    }
}

/// Request options for [`SessionManager::fetch_with_auth`]
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub json: Option<serde_json::Value>,
}

impl FetchOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post_json(body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            json: Some(body),
            ..Self::default()
        }
    }
}

/// Holds the single refresh slot; released on drop, including cancellation
struct RefreshGuard(Arc<AtomicBool>);

impl RefreshGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
struct Inner {
    http: reqwest::Client,
    config: Config,
    state: watch::Sender<SessionState>,
    refreshing: Arc<AtomicBool>,
    signal: Arc<LogoutSignal>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn clear(&self, reason: &str) {
        self.state.send_modify(|state| {
            if state.user.is_some() || state.access_token.is_some() {
                info!(reason, "Session cleared");
            }
            state.clear();
        });
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Ok(listener) = self.listener.get_mut() {
            if let Some(handle) = listener.take() {
                handle.abort();
            }
        }
    }
}

/// Per-tab session handle; clones share the same session
#[derive(Debug, Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    /// Create an idle session in the initializing state
    ///
    /// Nothing is spawned and no request is made; see [`SessionManager::start`].
    pub fn new(config: Config, storage: Arc<dyn SharedStorage>) -> Result<Self> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self::with_client(config, storage, http))
    }

    /// Create a session around an existing HTTP client
    ///
    /// The client should keep a cookie store, otherwise the refresh cookie is lost.
    pub fn with_client(
        config: Config,
        storage: Arc<dyn SharedStorage>,
        http: reqwest::Client,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::initializing());
        Self {
            inner: Arc::new(Inner {
                http,
                config,
                state,
                refreshing: Arc::new(AtomicBool::new(false)),
                signal: Arc::new(LogoutSignal::new(storage)),
                listener: Mutex::new(None),
            }),
        }
    }

    /// Mount the session: listen for logout from other tabs and restore in the background
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: Config, storage: Arc<dyn SharedStorage>) -> Result<Self> {
        let session = Self::new(config, storage)?;
        session.listen_for_logout();

        // Claimed before spawning so no early token request can run ahead of the restore
        let guard = RefreshGuard::acquire(&session.inner.refreshing);
        let restoring = session.clone();
        tokio::spawn(async move { restoring.restore_with(guard).await });

        Ok(session)
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn storage(&self) -> &Arc<dyn SharedStorage> {
        self.inner.signal.storage()
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn user(&self) -> Option<User> {
        self.inner.state.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading()
    }

    /// Wait until the startup restore has finished
    pub async fn ready(&self) -> SessionState {
        let mut rx = self.subscribe();
        let ready = rx
            .wait_for(|state| !state.is_loading())
            .await
            .map(|state| state.clone());
        ready.unwrap_or_else(|_| self.state())
    }

    /// Clear this tab's session whenever another tab broadcasts a logout
    ///
    /// Runs until the last handle is dropped. Calling it again is a no-op.
    pub fn listen_for_logout(&self) {
        let Ok(mut listener) = self.inner.listener.lock() else {
            return;
        };
        if listener.is_some() {
            return;
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let every = self.inner.config.storage.poll_interval();
        let handle = Arc::clone(&self.inner.signal).watch(every, move || match weak.upgrade() {
            Some(inner) => {
                inner.clear("logout in another tab");
                true
            }
            None => false,
        });
        *listener = Some(handle);
    }

    /// Rebuild the session from the refresh cookie alone
    ///
    /// Never fails: a missing or expired cookie just leaves the tab anonymous.
    /// Loading is over once this returns.
    pub async fn restore_session(&self) {
        self.restore_with(RefreshGuard::acquire(&self.inner.refreshing)).await
    }

    async fn restore_with(&self, guard: Option<RefreshGuard>) {
        let Some(guard) = guard else {
            debug!("Refresh already in flight, skipping restore");
            self.inner.state.send_modify(|state| state.loading = false);
            return;
        };

        let restored = self.try_restore().await;
        drop(guard);

        match restored {
            Ok((access_token, user)) => {
                info!(user = %user.email, "Session restored");
                self.inner.state.send_modify(|state| {
                    state.adopt(access_token, user);
                    state.loading = false;
                });
            }
            Err(e) => {
                debug!("No session to restore: {}", e);
                self.inner.state.send_modify(|state| {
                    state.clear();
                    state.loading = false;
                });
            }
        }
    }

    async fn try_restore(&self) -> Result<(String, User)> {
        let access_token = self.exchange_refresh_cookie().await?;
        let user = self.fetch_profile(&access_token).await?;
        Ok((access_token, user))
    }

    /// Sign in with email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let email = validation::validate_login(email, password)?;
        let request = LoginRequest {
            email,
            password: password.to_string(),
        };
        let auth = self
            .submit_credentials("/api/auth/login", &request, LOGIN_FAILED)
            .await?;
        info!(user = %auth.user.email, "Signed in");
        Ok(self.adopt(auth))
    }

    /// Create an account; success signs the new user in
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let (name, email) = validation::validate_registration(name, email, password)?;
        let request = RegisterRequest {
            name,
            email,
            password: password.to_string(),
        };
        let auth = self
            .submit_credentials("/api/auth/register", &request, REGISTRATION_FAILED)
            .await?;
        info!(user = %auth.user.email, "Registered");
        Ok(self.adopt(auth))
    }

    /// Sign out locally and in every other tab
    ///
    /// The server call is best-effort; local state is always cleared.
    pub async fn logout(&self) {
        let access_token = self.inner.state.borrow().access_token.clone();
        if let Some(access_token) = access_token {
            if let Err(e) = self.revoke(&access_token).await {
                warn!("Logout request failed: {}", e);
            }
        }

        self.inner.clear("logout");

        if let Err(e) = self.inner.signal.broadcast() {
            warn!("Could not signal logout to other tabs: {}", e);
        }
    }

    /// Ask the backend where to send the user for Google sign-in
    ///
    /// The caller hands the whole page over to the returned URL. The session
    /// picks the result up through the normal restore on the next start.
    pub async fn google_login(&self) -> Result<Url> {
        let response = self
            .inner
            .http
            .get(self.url("/api/auth/google"))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::Authentication(
                error_message(response, GOOGLE_UNAVAILABLE).await,
            ));
        }

        let body: GoogleAuthResponse = response.json().await?;
        let url = Url::parse(&body.authorization_url)?;
        info!(host = url.host_str().unwrap_or(""), "Starting Google sign-in");
        Ok(url)
    }

    /// A token valid for at least the configured skew, refreshing if needed
    pub async fn get_access_token(&self) -> Option<String> {
        let held = self.inner.state.borrow().access_token.clone();
        if let Some(access_token) = held {
            let now = chrono::Utc::now().timestamp();
            if token::is_fresh(&access_token, now, self.inner.config.session.refresh_skew_secs) {
                return Some(access_token);
            }
            debug!("Access token expired or expiring, refreshing");
        }
        self.refresh_access_token().await
    }

    /// Trade the refresh cookie for a new access token
    ///
    /// Returns `None` right away when another refresh is still running. A
    /// failed refresh means the session is over and clears it.
    pub async fn refresh_access_token(&self) -> Option<String> {
        let Some(_guard) = RefreshGuard::acquire(&self.inner.refreshing) else {
            debug!("Refresh already in flight");
            return None;
        };

        match self.exchange_refresh_cookie().await {
            Ok(access_token) => {
                debug!("Access token refreshed");
                self.inner
                    .state
                    .send_modify(|state| state.access_token = Some(access_token.clone()));
                Some(access_token)
            }
            Err(e) => {
                info!("Session expired: {}", e);
                self.inner.clear("refresh failed");
                None
            }
        }
    }

    /// Send a request with the bearer token attached
    ///
    /// `None` means no authenticated response could be obtained: no session,
    /// a transport failure, or a rejected token that could not be refreshed.
    /// An unauthorized response is retried once after a refresh.
    pub async fn fetch_with_auth(&self, url: &str, options: FetchOptions) -> Option<Response> {
        let access_token = self.get_access_token().await?;
        let url = self.url(url);

        let response = self.send_authorized(&url, &options, &access_token).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Some(response);
        }

        debug!(%url, "Unauthorized, retrying once with a refreshed token");
        let access_token = self.refresh_access_token().await?;
        self.send_authorized(&url, &options, &access_token).await
    }

    async fn send_authorized(
        &self,
        url: &str,
        options: &FetchOptions,
        access_token: &str,
    ) -> Option<Response> {
        let mut headers = options.headers.clone();
        headers.remove(AUTHORIZATION);

        let mut request = self
            .inner
            .http
            .request(options.method.clone(), url)
            .headers(headers)
            .bearer_auth(access_token);
        if let Some(body) = &options.json {
            request = request.json(body);
        }

        match request.send().await {
            Ok(response) => Some(response),
            Err(e) => {
                warn!(%url, "Authenticated request failed: {}", e);
                None
            }
        }
    }

    async fn submit_credentials<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<AuthResponse> {
        let response = self.inner.http.post(self.url(path)).json(body).send().await?;
        if !response.status().is_success() {
            return Err(Error::Authentication(error_message(response, fallback).await));
        }
        Ok(response.json().await?)
    }

    async fn exchange_refresh_cookie(&self) -> Result<String> {
        let response = self
            .inner
            .http
            .post(self.url("/api/auth/refresh"))
            .send()
            .await?
            .error_for_status()?;
        let body: RefreshResponse = response.json().await?;
        Ok(body.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<User> {
        let user = self
            .inner
            .http
            .get(self.url("/api/auth/me"))
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(user)
    }

    async fn revoke(&self, access_token: &str) -> Result<()> {
        self.inner
            .http
            .post(self.url("/api/auth/logout"))
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    fn adopt(&self, auth: AuthResponse) -> User {
        let user = auth.user;
        self.inner
            .state
            .send_modify(|state| state.adopt(auth.access_token, user.clone()));
        user
    }

    fn url(&self, path: &str) -> String {
        self.inner.config.endpoint(path)
    }
}

/// Backend `detail` message, or the fallback when the body has none
async fn error_message(response: Response, fallback: &str) -> String {
    let status = response.status();
    match response.json::<ErrorBody>().await {
        Ok(body) => body.message().map(str::to_string).unwrap_or_else(|| {
            debug!(%status, "Error response without a message");
            fallback.to_string()
        }),
        Err(_) => fallback.to_string(),
    }
}
