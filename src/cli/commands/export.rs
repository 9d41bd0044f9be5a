//! Export command implementation
//!
//! This module implements the `export` command, which runs the same pipeline
//! as the HTTP service but writes the workbook to a local file.

use crate::adapters::database::{create_filing_source, FilingSource};
use crate::adapters::workbook::{ByteChunk, XlsxSink};
use crate::cli::commands::{EXIT_FATAL, EXIT_NOT_FOUND, EXIT_PARTIAL, EXIT_SUCCESS};
use crate::config::FolioConfig;
use crate::core::export::{download_filename, ExportCoordinator, ExportOptions, ExportReport};
use crate::domain::{FilingId, FolioError, TransactionCategory};
use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot, watch};

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Filing to export
    pub filing_id: String,

    /// Output file; defaults to the download filename in the current directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override the categories to export (comma-separated)
    #[arg(long)]
    pub categories: Option<String>,

    /// Override the per-category row limit
    #[arg(long)]
    pub row_limit: Option<u64>,
}

impl ExportArgs {
    /// Applies the CLI overrides to `config`
    ///
    /// # Errors
    ///
    /// Returns an error for unknown category names or a zero row limit.
    pub fn apply(&self, config: &mut FolioConfig) -> anyhow::Result<()> {
        if let Some(categories) = &self.categories {
            let parsed = categories
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(TransactionCategory::from_str)
                .collect::<Result<Vec<_>, _>>()
                .map_err(anyhow::Error::msg)?;
            tracing::info!(categories = ?parsed, "Overriding categories from CLI");
            config.export.categories = parsed;
        }

        if let Some(row_limit) = self.row_limit {
            anyhow::ensure!(row_limit > 0, "--row-limit must be > 0");
            tracing::info!(row_limit, "Overriding row limit from CLI");
            config.export.row_limit = row_limit;
        }
        Ok(())
    }

    /// Execute the export command
    pub async fn execute(
        &self,
        mut config: FolioConfig,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let filing_id = match FilingId::new(self.filing_id.as_str()) {
            Ok(id) => id,
            Err(e) => {
                eprintln!("Invalid filing ID: {e}");
                return Ok(EXIT_NOT_FOUND);
            }
        };
        self.apply(&mut config)?;

        let source = create_filing_source(&config.database)?;
        self.run(source, &config, &filing_id, shutdown_signal).await
    }

    /// Runs the export against `source`
    pub async fn run(
        &self,
        source: Arc<dyn FilingSource>,
        config: &FolioConfig,
        filing_id: &FilingId,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let coordinator = Arc::new(ExportCoordinator::new(
            source,
            ExportOptions::from(&config.export),
        ));

        let filing = match coordinator.resolve_filing(filing_id).await {
            Ok(filing) => filing,
            Err(FolioError::NotFound(_)) => {
                eprintln!("Filing {filing_id} not found");
                return Ok(EXIT_NOT_FOUND);
            }
            Err(e) => {
                crate::log_error_with_context!(e, "Failed to resolve filing");
                eprintln!("Failed to resolve filing: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        let (mut sink, rx) = XlsxSink::channel(
            config.server.stream_buffer_chunks,
            config.export.flush_threshold_bytes,
        );
        let (filename_tx, filename_rx) = oneshot::channel();
        let export = tokio::spawn(async move {
            coordinator
                .export(&filing, &mut sink, Some(filename_tx))
                .await
        });

        let filename = filename_rx
            .await
            .unwrap_or_else(|_| download_filename(filing_id, ""));
        let path = self.output.clone().unwrap_or_else(|| PathBuf::from(&filename));

        let written = write_chunks(&path, rx, shutdown_signal).await;
        let report = export.await.context("Export task panicked")?;

        match written {
            Ok(bytes) => {
                print_report(&report, &path, bytes);
                Ok(exit_code(&report))
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to write workbook");
                eprintln!("Failed to write {}: {e:#}", path.display());
                Ok(EXIT_FATAL)
            }
        }
    }
}

/// Drains the encoder channel into `path`
///
/// A shutdown signal drops the receiver, which cancels the export.
async fn write_chunks(
    path: &Path,
    mut rx: mpsc::Receiver<ByteChunk>,
    shutdown: watch::Receiver<bool>,
) -> anyhow::Result<u64> {
    let mut file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut written: u64 = 0;

    let shutdown = shutdown_requested(shutdown);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;
            () = &mut shutdown => {
                tracing::info!("Shutdown requested, abandoning export");
                break;
            }
            chunk = rx.recv() => match chunk {
                Some(chunk) => {
                    let chunk = chunk?;
                    file.write_all(&chunk).await?;
                    written += chunk.len() as u64;
                }
                None => break,
            },
        }
    }

    file.flush().await?;
    Ok(written)
}

/// Resolves once shutdown was requested; never resolves if the sender is gone
async fn shutdown_requested(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn exit_code(report: &ExportReport) -> i32 {
    if report.is_complete() {
        EXIT_SUCCESS
    } else {
        EXIT_PARTIAL
    }
}

fn print_report(report: &ExportReport, path: &Path, bytes: u64) {
    println!();
    println!("Export Summary:");
    println!("  Filing: {}", report.filing_id);
    println!("  File: {} ({bytes} bytes)", path.display());
    println!(
        "  Summaries: {}",
        if report.summaries.is_empty() {
            "none".to_string()
        } else {
            report
                .summaries
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        }
    );
    for outcome in &report.categories {
        println!("  {}: {} rows", outcome.category, outcome.rows);
    }
    println!("  Duration: {:.2}s", report.duration.as_secs_f64());

    match &report.error {
        None => println!("Export completed successfully"),
        Some(e) => println!("Export stopped early: {e}"),
    }
    println!();
}
