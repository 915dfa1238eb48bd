pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cli::Args;
use config::Config;

pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    match try_run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn try_run(args: &Args) -> anyhow::Result<()> {
    tracing::info!("cloud-filter v{}", env!("CARGO_PKG_VERSION"));

    let mut config =
        Config::load_or_default(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);

    tracing::info!("Configuration loaded:");
    tracing::info!("  Sources: {:?}", config.paths.source_dirs);
    tracing::info!("  Destination: {}", config.paths.destination.display());
    tracing::info!("  Model: {}", config.paths.model.display());
    tracing::info!("  Batch size: {}", config.inference.batch_size);
    tracing::info!("  Device: {:?}", config.inference.device);
    match toml::to_string(&config) {
        Ok(effective) => tracing::debug!("Effective configuration:\n{}", effective),
        Err(e) => tracing::debug!("Cannot render configuration: {}", e),
    }

    let report = commands::filter::filter_with_model(&config).context("Filtering failed")?;

    if let Some(path) = &args.report {
        commands::filter::write_report(&report, path)?;
        tracing::info!("Report written to {}", path.display());
    }

    Ok(())
}
