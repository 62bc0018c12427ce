//! Operator CLI for the estransport connection pool.

#![allow(clippy::print_stdout, reason = "CLI tool outputs to stdout")]

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("setting default subscriber failed")?;

    let config = commands::build_config(&cli);
    config.validate().context("Invalid configuration")?;

    match cli.command {
        Commands::Nodes { json } => commands::handle_nodes(config, json).await,
        Commands::Request { path, method, data, no_retry, discover } => {
            commands::handle_request(config, &path, &method, data, no_retry, discover).await
        },
        Commands::Watch { interval, every } => {
            commands::handle_watch(config, interval, every).await
        },
    }
}
