//! Stockwatch CLI
//!
//! Watches a product page and reports stock status changes.

#![warn(clippy::all)]
#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use stockwatch_cli::commands::{cmd_check, cmd_run, cmd_test_notify};
use stockwatch_cli::config_handlers::handle_config_command;
use stockwatch_cli::{Args, Command, logging};
use stockwatch_core::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let config_path = args.config.as_deref();
    match args.effective_command() {
        Command::Config { action } => handle_config_command(config_path, action)?,
        Command::Run => {
            let config = Config::load(config_path).context("failed to load configuration")?;
            tracing::info!("stockwatch {}", env!("CARGO_PKG_VERSION"));
            cmd_run(&config, shutdown_signal()).await?;
        }
        Command::Check => {
            let config = Config::load(config_path).context("failed to load configuration")?;
            let observation = cmd_check(&config).await?;
            println!(
                "{} ({})",
                observation.status,
                observation.status.availability()
            );
        }
        Command::TestNotify { channel } => {
            let config = Config::load(config_path).context("failed to load configuration")?;
            let report = cmd_test_notify(&config, channel).await?;
            println!("Delivered via: {}", report.delivered.join(", "));
        }
    }

    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
