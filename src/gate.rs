//! Route gate: withholds protected pages until the session is known and signed in

use crate::auth::SessionState;
use crate::config::GateConfig;
use serde::Serialize;
use tokio::sync::watch;

/// What to show for a requested path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateDecision {
    /// Show the page
    Render,
    /// Session restore still running; show a placeholder
    Loading,
    /// Show the sign-in prompt instead of the page
    SignInRequired,
    /// The user signed out while on a protected page; leave it
    RedirectHome,
}

impl GateDecision {
    pub fn message(&self) -> &'static str {
        match self {
            GateDecision::Render => "Access granted",
            GateDecision::Loading => "Loading...",
            GateDecision::SignInRequired => "Sign in required. Please sign in to access this content.",
            GateDecision::RedirectHome => "Signed out, returning to the homepage",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouteGate {
    protected_prefixes: Vec<String>,
    was_authenticated: bool,
}

impl RouteGate {
    pub fn new(config: &GateConfig) -> Self {
        Self {
            protected_prefixes: config.protected_prefixes.clone(),
            was_authenticated: false,
        }
    }

    pub fn is_protected(&self, path: &str) -> bool {
        self.protected_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Decide for the current state, remembering whether the user was signed in
    pub fn evaluate(&mut self, path: &str, state: &SessionState) -> GateDecision {
        if !self.is_protected(path) {
            return GateDecision::Render;
        }
        if state.is_loading() {
            return GateDecision::Loading;
        }
        if state.is_authenticated() {
            self.was_authenticated = true;
            return GateDecision::Render;
        }
        if self.was_authenticated {
            self.was_authenticated = false;
            return GateDecision::RedirectHome;
        }
        GateDecision::SignInRequired
    }

    /// Wait for the startup restore to finish, then decide
    pub async fn resolve(
        &mut self,
        path: &str,
        session: &mut watch::Receiver<SessionState>,
    ) -> GateDecision {
        if self.is_protected(path) {
            let settled = session
                .wait_for(|state| !state.is_loading())
                .await
                .map(|state| state.clone());
            // Sender gone: decide on whatever was last published
            let settled = settled.unwrap_or_else(|_| session.borrow().clone());
            return self.evaluate(path, &settled);
        }
        GateDecision::Render
    }
}
