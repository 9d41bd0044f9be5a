// Folio - Streaming filing workbook export
// Copyright (c) 2025 Folio Contributors
// Licensed under the MIT License

use clap::Parser;
use folio::cli::commands::{EXIT_CONFIG, EXIT_FATAL};
use folio::cli::{Cli, Commands};
use folio::config::{load, FolioConfig, LoggingConfig};
use folio::logging::{init_logging, LoggingGuard};
use std::process;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // validate-config reports load failures itself
    if let Commands::ValidateConfig(args) = &cli.command {
        let _guard = start_logging(&cli, None);
        let code = match args.execute(cli.config.as_deref()).await {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {e}");
                EXIT_FATAL
            }
        };
        process::exit(code);
    }

    let config = match load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            process::exit(EXIT_CONFIG);
        }
    };
    let _guard = start_logging(&cli, Some(&config));

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Folio - Streaming filing workbook export"
    );

    // Create shutdown signal channel for graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create SIGTERM handler");
                    return;
                }
            };

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
                }
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown...");
                }
            }
            let _ = shutdown_tx.send(true);
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            } else {
                tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
                let _ = shutdown_tx.send(true);
            }
        }
    });

    let exit_code = match execute_command(&cli, config, shutdown_rx).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e:#}");
            EXIT_FATAL
        }
    };

    process::exit(exit_code);
}

/// Initializes logging; file logging is only used by the long-running service
fn start_logging(cli: &Cli, config: Option<&FolioConfig>) -> Option<LoggingGuard> {
    let level = cli
        .log_level
        .clone()
        .or_else(|| config.map(|c| c.application.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());

    let logging_config = match (config, &cli.command) {
        (Some(config), Commands::Serve(_)) => config.logging.clone(),
        _ => LoggingConfig::console_only(),
    };

    match init_logging(&level, &logging_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(EXIT_FATAL);
        }
    }
}

/// Execute the CLI command
async fn execute_command(
    cli: &Cli,
    config: FolioConfig,
    shutdown_signal: watch::Receiver<bool>,
) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Serve(args) => args.execute(config, shutdown_signal).await,
        Commands::Export(args) => args.execute(config, shutdown_signal).await,
        Commands::ValidateConfig(args) => args.execute(cli.config.as_deref()).await,
    }
}
