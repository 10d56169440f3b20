//! Authentication and session management

pub mod models;
pub mod oauth;
pub mod session;
pub mod token;
pub mod validation;

pub use models::{User, UserId};
pub use session::{FetchOptions, SessionManager, SessionPhase, SessionState};
pub use token::{decode_claims, TokenClaims};
