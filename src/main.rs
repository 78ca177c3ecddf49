mod commands;
mod config;
mod db;
mod error;
mod models;
mod notifications;
mod stats;
mod streak;

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use config::{Cli, Config};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG=debug for query-level logs; stderr keeps stdout pure JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(Config::default_log_level(cli.verbose))),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = Config::from_cli(&cli);
    debug!(?config, "resolved config");

    let conn = db::init_db(&config.db_path)
        .with_context(|| format!("failed to open database at {}", config.db_path.display()))?;

    let output = commands::run(&conn, &config, cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
