use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookgate::cli::{self, Cli, Commands};
use bookgate::config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; stderr keeps log lines out of the shell's stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookgate=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => cli::commands::init().await,
        Commands::Shell { page } => {
            let config = config::load_config(cli.config.as_deref())?;
            cli::commands::shell(config, page).await
        }
        Commands::Token { token } => cli::commands::token(&token),
        Commands::SignalLogout => {
            let config = config::load_config(cli.config.as_deref())?;
            cli::commands::signal_logout(&config).await
        }
    }
}
