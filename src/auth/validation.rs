//! Client-side credential checks, run before anything is sent

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

const MAX_EMAIL_LEN: usize = 255;
const MAX_NAME_LEN: usize = 255;
const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("Invalid regex pattern - this is a bug in the codebase")
});

/// Normalize and check an email address
pub fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(Error::Validation("Email is required".to_string()));
    }
    if !EMAIL_RE.is_match(&email) {
        return Err(Error::Validation("Invalid email format".to_string()));
    }
    if email.len() > MAX_EMAIL_LEN {
        return Err(Error::Validation(
            "Email must be 255 characters or fewer".to_string(),
        ));
    }
    Ok(email)
}

/// Check a new password for strength
pub fn check_password_strength(password: &str) -> Result<()> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(Error::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(Error::Validation(
            "Password must be 128 characters or fewer".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(Error::Validation(
            "Password must contain at least one letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(Error::Validation(
            "Password must contain at least one number".to_string(),
        ));
    }
    Ok(())
}

/// Normalize and check a display name
pub fn normalize_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("Name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(Error::Validation(
            "Name must be 255 characters or fewer".to_string(),
        ));
    }
    Ok(name.to_string())
}

/// Validate sign-in input, returning the normalized email
///
/// Strength rules are not applied here so accounts created under older
/// rules can still sign in.
pub fn validate_login(email: &str, password: &str) -> Result<String> {
    let email = normalize_email(email)?;
    if password.is_empty() {
        return Err(Error::Validation("Password is required".to_string()));
    }
    Ok(email)
}

/// Validate registration input, returning the normalized name and email
pub fn validate_registration(name: &str, email: &str, password: &str) -> Result<(String, String)> {
    let name = normalize_name(name)?;
    let email = normalize_email(email)?;
    check_password_strength(password)?;
    Ok((name, email))
}
