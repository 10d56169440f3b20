//! CLI command implementations

use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use url::Url;

use crate::auth::{decode_claims, oauth, SessionManager};
use crate::chat::{ChatClient, GREETING};
use crate::cli::shell::{ShellCommand, HELP};
use crate::cli::{
    error, info, print_chat_outcome, print_claims, print_gate_decision, print_session_line,
    print_status_table, success, warn, OutputFormat, StatusReport,
};
use crate::config::{self, Config, CONFIG_FILENAME};
use crate::gate::RouteGate;
use crate::storage::{FileStorage, LogoutSignal, SharedStorage};

/// Initialize a new bookgate.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = Path::new(CONFIG_FILENAME);

    if config_path.exists() {
        warn("bookgate.toml already exists");
        return Ok(());
    }

    let content = config::loader::default_config_content();
    fs::write(config_path, content)?;

    success("Created bookgate.toml");
    info("Point [api] base_url at your backend and run 'bookgate shell'");

    Ok(())
}

/// Decode and print an access token
pub fn token(raw: &str) -> Result<()> {
    match decode_claims(raw.trim()) {
        Some(claims) => {
            print_claims(&claims);
            Ok(())
        }
        None => {
            error("Not a decodable access token");
            anyhow::bail!("token has no readable payload or exp claim")
        }
    }
}

/// Broadcast a logout to every shell sharing the storage directory
pub async fn signal_logout(config: &Config) -> Result<()> {
    let signal = LogoutSignal::new(file_storage(config));
    signal
        .broadcast()
        .context("Failed to write the logout signal")?;
    success(&format!(
        "Logout signalled to every shell using {}",
        config.storage.dir.display()
    ));
    Ok(())
}

/// Run one interactive tab until stdin closes or the user quits
pub async fn shell(config: Config, page: Option<String>) -> Result<()> {
    if let Some(page) = page {
        report_page_marker(&page)?;
    }

    let session = SessionManager::start(config.clone(), file_storage(&config))?;

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Restoring session...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    let state = session.ready().await;
    spinner.finish_and_clear();

    print_session_line(&state);
    watch_sign_out(&session);

    let chat = ChatClient::new(session.clone())?;
    let mut gate = RouteGate::new(&config.gate);
    let mut greeted = false;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"bookgate> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match ShellCommand::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                error(&message);
                continue;
            }
        };

        match command {
            ShellCommand::Empty => {}
            ShellCommand::Help => println!("{}", HELP),
            ShellCommand::Quit => break,
            ShellCommand::Status(format) => print_status(&session, format)?,
            ShellCommand::Login { email } => {
                let password = prompt_password(false).await?;
                match session.login(&email, &password).await {
                    Ok(_) => print_session_line(&session.state()),
                    Err(e) => error(&e.to_string()),
                }
            }
            ShellCommand::Register { email, name } => {
                let password = prompt_password(true).await?;
                match session.register(&name, &email, &password).await {
                    Ok(_) => print_session_line(&session.state()),
                    Err(e) => error(&e.to_string()),
                }
            }
            ShellCommand::Logout => {
                // The sign-out watcher reports the transition itself
                let was_authenticated = session.is_authenticated();
                session.logout().await;
                if !was_authenticated {
                    info("Not signed in; other shells were told to sign out");
                }
            }
            ShellCommand::Google => match session.google_login().await {
                Ok(url) => {
                    info("Continue sign-in in your browser, then reopen the shell:");
                    println!("  {}", url.as_str().cyan());
                }
                Err(e) => error(&e.to_string()),
            },
            ShellCommand::Open { path } => {
                let decision = gate.resolve(&path, &mut session.subscribe()).await;
                print_gate_decision(&path, decision);
            }
            ShellCommand::Chat { message } => {
                if !greeted {
                    println!("{} {}", "bot:".cyan().bold(), GREETING);
                    greeted = true;
                }
                match chat.send(&message).await {
                    Ok(outcome) => print_chat_outcome(&outcome),
                    Err(e) => error(&e.to_string()),
                }
            }
            ShellCommand::Token => match session.state().token_claims() {
                Some(claims) => print_claims(&claims),
                None => info("No access token held"),
            },
        }
    }

    Ok(())
}

fn file_storage(config: &Config) -> Arc<dyn SharedStorage> {
    Arc::new(FileStorage::new(&config.storage.dir))
}

/// Handle the Google sign-in return marker on the page the tab was opened with
fn report_page_marker(page: &str) -> Result<()> {
    let url = Url::parse(page).with_context(|| format!("Invalid page URL: {}", page))?;
    if let Some(cleaned) = oauth::strip_auth_marker(&url) {
        info(&format!("Returned from Google sign-in, page is {}", cleaned));
    }
    if let Some(reason) = oauth::auth_error_reason(&url) {
        warn(&format!("Google sign-in failed: {}", reason));
    }
    Ok(())
}

fn print_status(session: &SessionManager, format: OutputFormat) -> Result<()> {
    let report = StatusReport::from_state(&session.state());
    match format {
        OutputFormat::Table => print_status_table(&report),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Yaml => println!("{}", serde_yaml::to_string(&report)?),
    }
    Ok(())
}

/// Tell the user when the session ends without them asking
fn watch_sign_out(session: &SessionManager) {
    let mut rx = session.subscribe();
    tokio::spawn(async move {
        let mut was_authenticated = rx.borrow_and_update().is_authenticated();
        while rx.changed().await.is_ok() {
            let now_authenticated = rx.borrow_and_update().is_authenticated();
            if was_authenticated && !now_authenticated {
                warn("Signed out");
            }
            was_authenticated = now_authenticated;
        }
    });
}

async fn prompt_password(confirm: bool) -> Result<String> {
    let password = tokio::task::spawn_blocking(move || {
        let theme = ColorfulTheme::default();
        let prompt = Password::with_theme(&theme).with_prompt("Password");
        if confirm {
            prompt
                .with_confirmation("Confirm password", "Passwords do not match")
                .interact()
        } else {
            prompt.interact()
        }
    })
    .await?
    .context("Failed to read password")?;
    Ok(password)
}
