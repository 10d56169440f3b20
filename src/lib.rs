//! bookgate - session client for the book site
//!
//! Keeps a per-tab session against the book's auth backend: an in-memory
//! access token renewed through the backend's refresh cookie, a gate for
//! protected pages, a chat client, and logout propagation between tabs.

pub mod auth;
pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod storage;

pub use auth::{SessionManager, SessionState};
pub use config::Config;
pub use error::Error;
pub use gate::{GateDecision, RouteGate};
