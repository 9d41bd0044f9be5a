//! Serve command implementation
//!
//! This module implements the `serve` command, the long-running HTTP service
//! streaming workbooks to browsers.

use crate::adapters::database::create_filing_source;
use crate::cli::commands::EXIT_SUCCESS;
use crate::config::FolioConfig;
use crate::core::export::{ExportCoordinator, ExportOptions};
use crate::server::{create_router, serve, AppState};
use clap::Args;
use std::sync::Arc;
use tokio::sync::watch;

/// Arguments for the serve command
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Override the bind host
    #[arg(long)]
    pub host: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeArgs {
    /// Applies the CLI overrides to `config`
    pub fn apply(&self, config: &mut FolioConfig) {
        if let Some(host) = &self.host {
            tracing::info!(host = %host, "Overriding bind host from CLI");
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            tracing::info!(port, "Overriding listen port from CLI");
            config.server.port = port;
        }
    }

    /// Execute the serve command
    pub async fn execute(
        &self,
        mut config: FolioConfig,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        self.apply(&mut config);

        let source = create_filing_source(&config.database)?;
        // The service starts without the database; requests fail until it is back
        if let Err(e) = source.test_connection().await {
            tracing::warn!(database = %source.describe(), error = %e, "Database not reachable at startup");
        }

        let coordinator = Arc::new(ExportCoordinator::new(
            source,
            ExportOptions::from(&config.export),
        ));
        let state = AppState::new(coordinator, &config);
        let router = create_router(state, &config.server.route_prefix);

        serve(router, &config.server.bind_address(), shutdown_signal).await?;
        Ok(EXIT_SUCCESS)
    }
}
