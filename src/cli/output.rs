//! CLI output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use serde::Serialize;

use crate::auth::{SessionPhase, SessionState, TokenClaims, User};
use crate::chat::ChatOutcome;
use crate::gate::GateDecision;

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Serializable view of a tab's session, without the token itself
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub phase: SessionPhase,
    pub user: Option<User>,
    pub token_expires_in: Option<i64>,
}

impl StatusReport {
    pub fn from_state(state: &SessionState) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            phase: state.phase(),
            user: state.user().cloned(),
            token_expires_in: state.token_claims().map(|claims| claims.seconds_remaining(now)),
        }
    }
}

/// Format a session phase as a colored string
pub fn format_phase(phase: SessionPhase) -> String {
    let text = phase.to_string();
    match phase {
        SessionPhase::Authenticated => text.green().to_string(),
        SessionPhase::Anonymous => text.red().to_string(),
        SessionPhase::Initializing => text.yellow().to_string(),
    }
}

/// One-line summary shown after startup and state changes
pub fn print_session_line(state: &SessionState) {
    match state.user() {
        Some(user) if state.is_authenticated() => success(&format!(
            "Signed in as {} <{}>",
            user.display_name(),
            user.email
        )),
        _ if state.is_loading() => info("Restoring session..."),
        _ => info("Not signed in. Use 'login <email>', 'register <email> <name>' or 'google'"),
    }
}

/// Print the session as a table
pub fn print_status_table(report: &StatusReport) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("State").fg(Color::Cyan),
            Cell::new("User").fg(Color::Cyan),
            Cell::new("Email").fg(Color::Cyan),
            Cell::new("Sign-in methods").fg(Color::Cyan),
            Cell::new("Token expires").fg(Color::Cyan),
        ]);

    let phase_color = match report.phase {
        SessionPhase::Authenticated => Color::Green,
        SessionPhase::Anonymous => Color::Red,
        SessionPhase::Initializing => Color::Yellow,
    };

    let (name, email, methods) = match &report.user {
        Some(user) => (
            user.display_name().to_string(),
            user.email.clone(),
            if user.auth_methods.is_empty() {
                "-".to_string()
            } else {
                user.auth_methods.join(", ")
            },
        ),
        None => ("-".to_string(), "-".to_string(), "-".to_string()),
    };

    let expires = match report.token_expires_in {
        Some(secs) if secs > 0 => format!("in {}s", secs),
        Some(_) => "expired".to_string(),
        None => "-".to_string(),
    };

    table.add_row(vec![
        Cell::new(report.phase.to_string()).fg(phase_color),
        Cell::new(name),
        Cell::new(email),
        Cell::new(methods),
        Cell::new(expires),
    ]);

    println!("{table}");
}

/// Print decoded token claims
pub fn print_claims(claims: &TokenClaims) {
    let now = chrono::Utc::now().timestamp();
    let remaining = claims.seconds_remaining(now);

    println!("{}", "Access Token".bold().underline());
    println!();
    println!("  {} {}", "Subject:".bold(), claims.sub.as_deref().unwrap_or("-"));
    println!("  {} {}", "Email:".bold(), claims.email.as_deref().unwrap_or("-"));
    println!("  {} {}", "Type:".bold(), claims.kind.as_deref().unwrap_or("-"));
    match claims.expires_at() {
        Some(at) => println!(
            "  {} {}",
            "Expires:".bold(),
            at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => println!("  {} {}", "Expires:".bold(), claims.exp),
    }
    if remaining > 0 {
        println!("  {} {}s", "Remaining:".bold(), remaining.to_string().green());
    } else {
        println!("  {} {}", "Remaining:".bold(), "expired".red());
    }
}

/// Print the result of opening a page
pub fn print_gate_decision(path: &str, decision: GateDecision) {
    match decision {
        GateDecision::Render => success(&format!("{} {}", path, decision.message())),
        GateDecision::Loading => info(decision.message()),
        GateDecision::SignInRequired => warn(decision.message()),
        GateDecision::RedirectHome => info(decision.message()),
    }
}

/// Print a chat answer or failure
pub fn print_chat_outcome(outcome: &ChatOutcome) {
    match outcome {
        ChatOutcome::Reply(_) => println!("{} {}", "bot:".cyan().bold(), outcome.message()),
        ChatOutcome::SignInRequired | ChatOutcome::RateLimited => warn(&outcome.message()),
        ChatOutcome::Failed => error(&outcome.message()),
    }
}
