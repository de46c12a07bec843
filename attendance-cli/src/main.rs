mod api;
mod cli;
mod config;
mod session;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use log::info;

use api::{Backend, HttpBackend};
use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{} {:#}", "error:".red().bold(), err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = Config::load(&cli.overrides()).context("Failed to load configuration")?;
    let client = HttpBackend::new(&config).context("Failed to build HTTP client")?;
    info!("Using attendance backend at {}", client.base_url());

    let backend: Arc<dyn Backend> = Arc::new(client);
    cli::dispatch(cli.command, backend).await
}

/// `RUST_LOG` wins; otherwise `-v` raises the default from warn
fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}
