//! Leadqual CLI
//!
//! Qualify sales leads against your product from the terminal.

use anyhow::Result;
use clap::Parser;
use leadqual_core::error::exit_codes;
use leadqual_core::{Config, LeadQualError};
use tracing_subscriber::EnvFilter;

mod app;
mod commands;
mod output;
mod progress;

use app::{Cli, Commands};

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = match (&cli.command, cli.verbose) {
        (_, true) => "debug",
        (Commands::Serve(_), false) => "info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            e.downcast_ref::<LeadQualError>()
                .map(LeadQualError::exit_code)
                .unwrap_or(exit_codes::GENERAL_ERROR)
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<i32> {
    let mut config = Config::load()?;

    // Environment wins over the config file for the database location
    if let Ok(db_path) = std::env::var("LEADQUAL_DB") {
        config.store.db_path = db_path.into();
    }

    match cli.command {
        Commands::Ingest(args) => commands::ingest::run(args, &config, cli.format).await,
        Commands::Query(args) => commands::query::run(args, config, cli.format).await,
        Commands::Delete => commands::delete::run(&config, cli.format).await,
        Commands::Serve(args) => commands::serve::run(args, config).await,
        Commands::Agent(args) => commands::agent::run(args, &config, cli.format).await,
        Commands::Status => commands::status::run(&config, cli.format).await,
    }
}
