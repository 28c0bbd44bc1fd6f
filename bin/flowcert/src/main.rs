//! flowcert
//!
//! Let's Encrypt companion for docker-flow-proxy. Receives the proxy's
//! reconfigure webhooks, obtains certificates through certbot, publishes them
//! to the proxy, and forwards the original request.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

mod cli;
mod commands;
mod config;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let metrics = config::build_metrics_config(&cli.metrics_path, cli.no_metrics)
        .context("Invalid metrics configuration")?;
    let observability =
        config::build_observability_config(cli.log, cli.verbose, cli.log_format, metrics.clone());
    let _guard = flowcert_observability::init_observability(&observability)
        .context("Failed to initialize observability")?;

    let companion = config::build_companion_config(&cli.settings)
        .context("Invalid configuration")?;
    debug!(config = ?companion, "Configuration resolved");

    match cli.command {
        Commands::Serve {
            bind,
            no_challenge_route,
        } => commands::serve::serve(companion, bind, no_challenge_route, metrics).await,
        Commands::Process {
            domains,
            email,
            testing,
        } => commands::process::process(companion, domains, email, testing).await,
        Commands::CheckConfig => commands::check_config::check_config(&companion),
    }
}
