//! Bookshelf - seed and query a MongoDB book catalogue.

use anyhow::{Context, Result};
use bookshelf::{BookshelfError, Cli, Commands, Config, run_queries, run_seed};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Missing connection string is fatal: no connection attempt, exit 1.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e @ BookshelfError::MissingConnectionString) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    match cli.command {
        Commands::Seed => handle_seed(&config).await,
        Commands::Queries => handle_queries(&config).await,
    }
}

/// Logs go to stderr; stdout carries query results.
fn init_logging(verbose: bool) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(log_filter(verbose))
        .init();
}

/// `RUST_LOG` when set, else `debug` with `--verbose` and `info` without.
fn log_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "info" })
    })
}

/// Handle seed command.
async fn handle_seed(config: &Config) -> Result<()> {
    let report = run_seed(config)
        .await
        .context("Error occurred while inserting the data")?;

    println!(
        "{} Cleared {} books, inserted {}",
        "✓".green(),
        report.cleared,
        report.inserted
    );
    Ok(())
}

/// Handle queries command.
async fn handle_queries(config: &Config) -> Result<()> {
    println!("\n{}", ">>> Starting Query Tour <<<".bold());
    run_queries(config).await?;
    println!("\n{}", ">>> Query Tour Completed <<<".bold());
    Ok(())
}
