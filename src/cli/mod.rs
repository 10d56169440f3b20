//! CLI interface for bookgate

pub mod commands;
mod output;
pub mod shell;

pub use output::*;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bookgate")]
#[command(version)]
#[command(about = "Session client for the book site", long_about = None)]
pub struct Cli {
    /// Path to bookgate.toml (searched upward from the current directory by default)
    #[arg(short, long, global = true, env = "BOOKGATE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new bookgate.toml configuration file
    Init,

    /// Open an interactive shell acting as one browser tab
    Shell {
        /// Page URL the tab was opened on, e.g. the Google sign-in return URL
        #[arg(long)]
        page: Option<String>,
    },

    /// Decode an access token without verifying it
    Token {
        /// The token to inspect
        token: String,
    },

    /// Sign out every running shell that shares the storage directory
    SignalLogout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}
