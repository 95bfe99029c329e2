//! CLI entry point for the rawhttp tool.

use anyhow::{Context, Result};
use clap::Parser;
use rawhttp_core::{HttpClient, RetryPolicy, acquire_host};
use tracing::{debug, info};

mod app_config;
mod cli;
mod output;

use app_config::{build_client_config, default_log_level, load_default_file_config};
use cli::Args;

fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let loaded_config = load_default_file_config()?;
    let file_config = loaded_config.config.as_ref();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config file > info
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_log_level(&args, file_config)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, config_path = ?loaded_config.path, "CLI arguments parsed");

    let mut config = build_client_config(&args, file_config)?;

    let requested_host = config.host.clone();
    config.host = acquire_host(&RetryPolicy::hostname(), || requested_host.clone())
        .context("Could not resolve host")?;

    info!(
        method = %config.method,
        host = %config.host,
        target = %config.target,
        "Sending request"
    );

    let client = HttpClient::for_config(&config);
    let exchange = client.execute(&config).context("Request failed")?;

    if let Some(path) = &config.output_file {
        output::write_response(path, exchange.response.text())?;
    }

    output::print_response(exchange.response.text())
}
