use anyhow::Result;
use clap::{Parser, Subcommand};
use pulseboard_backend::api::{self, AppState};
use pulseboard_backend::config::PulseboardConfig;
use pulseboard_backend::database::Database;
use pulseboard_backend::identity::InMemoryDirectory;
use pulseboard_backend::telemetry;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about = "Pulseboard engagement backend daemon")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (Axum) for the engagement API
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let args = Args::parse();
    let config = PulseboardConfig::from_env()?;
    config.paths.ensure_directories()?;

    let database = Database::connect(&config.paths)?;
    let newly_created = database.ensure_migrations()?;
    tracing::info!(
        db_path = %config.paths.db_path.display(),
        newly_created,
        "engagement store ready"
    );

    let directory = match &config.identity_seed {
        Some(path) => InMemoryDirectory::from_seed_file(path)?,
        None => InMemoryDirectory::new(),
    };

    let state = AppState::new(config, database, Arc::new(directory));

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => api::serve_http(state).await,
    }
}
