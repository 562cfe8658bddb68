//! futstats
//!
//! Scrapes football statistics into SQLite and keeps them current on a schedule.

mod cli;
mod config;
mod orchestrator;
mod retry;
mod scheduler;
mod scraper;
mod storage;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "futstats=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load(cli.config.as_deref())?;
    tracing::info!("Configuration loaded");
    tracing::info!("Database: {}", config.database.path.display());

    match cli.command {
        Commands::Run => cli::run_scheduler(config).await,
        Commands::Update { advanced, format } => cli::run_update(config, advanced, format).await,
        Commands::Advanced { format } => cli::run_advanced(config, format).await,
        Commands::Match { url, format } => cli::run_match(config, url, format).await,
        Commands::Player { id } => cli::run_player(config, id),
        Commands::SelfTest { format } => cli::run_self_test(config, format).await,
    }
}
