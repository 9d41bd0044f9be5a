//! Export coordinator - main orchestrator for the export process
//!
//! This module runs one filing through the pipeline: resolve the filing,
//! render the summary sheet, stream each transaction category, finalize. Steps
//! run strictly one after another against a single sink; the first error skips
//! the remaining steps but the sink is still finalized exactly once.

use crate::adapters::database::FilingSource;
use crate::adapters::workbook::{SheetHandle, WorkbookSink};
use crate::config::ExportConfig;
use crate::core::export::filename::download_filename;
use crate::core::export::report::{ExportReport, ExportState};
use crate::core::export::streamer::stream_category;
use crate::core::export::summary::{fetch_summary, render_summary, SUMMARY_SHEET};
use crate::domain::{
    Filing, FilingId, FolioError, LinkStyle, Result, SummaryKind, TransactionCategory,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;

/// Pipeline options
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Maximum rows per category
    pub row_limit: u64,
    /// Rows fetched from the cursor per round trip
    pub fetch_batch_size: usize,
    /// Categories to stream, in workbook order
    pub categories: Vec<TransactionCategory>,
    /// How report links are rendered
    pub link_style: LinkStyle,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::from(&ExportConfig::default())
    }
}

impl From<&ExportConfig> for ExportOptions {
    fn from(config: &ExportConfig) -> Self {
        Self {
            row_limit: config.row_limit,
            fetch_batch_size: config.fetch_batch_size,
            categories: config.ordered_categories(),
            link_style: config.link_style,
        }
    }
}

/// Export coordinator
///
/// Cheap to share: one coordinator serves every request, each export brings
/// its own sink.
pub struct ExportCoordinator {
    source: Arc<dyn FilingSource>,
    options: ExportOptions,
}

impl ExportCoordinator {
    /// Create a new export coordinator
    pub fn new(source: Arc<dyn FilingSource>, options: ExportOptions) -> Self {
        Self { source, options }
    }

    /// Pipeline options
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// The filing source
    pub fn source(&self) -> &Arc<dyn FilingSource> {
        &self.source
    }

    /// Looks up filing metadata
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::NotFound`] when the filing does not exist, and
    /// source failures otherwise. No sink should be created before this
    /// succeeds.
    pub async fn resolve_filing(&self, filing_id: &FilingId) -> Result<Filing> {
        tracing::debug!(filing_id = %filing_id, state = %ExportState::ResolvingFiling, "Resolving filing");
        self.source
            .find_filing(filing_id)
            .await?
            .ok_or_else(|| FolioError::NotFound(filing_id.to_string()))
    }

    /// Resolves the filing and exports it into `sink`
    ///
    /// # Errors
    ///
    /// Fails only when the filing cannot be resolved; in that case `sink` is
    /// never touched. Later failures are reported in the [`ExportReport`].
    pub async fn run(&self, filing_id: &FilingId, sink: &mut dyn WorkbookSink) -> Result<ExportReport> {
        let filing = self.resolve_filing(filing_id).await?;
        Ok(self.export(&filing, sink, None).await)
    }

    /// Exports a resolved filing into `sink`
    ///
    /// The download filename is sent through `filename_tx` as soon as the
    /// summary phase fixed it, before any transaction is streamed. The sink is
    /// finalized exactly once whatever happens.
    pub async fn export(
        &self,
        filing: &Filing,
        sink: &mut dyn WorkbookSink,
        filename_tx: Option<oneshot::Sender<String>>,
    ) -> ExportReport {
        let start_time = Instant::now();
        crate::log_export_start!(filing.id);

        let mut report = ExportReport::new(filing.id.clone());
        let mut filename_tx = filename_tx;

        let outcome = self
            .write_sheets(filing, sink, &mut filename_tx, &mut report)
            .await;

        // A failure during the summary phase leaves the filename unannounced
        if report.filename.is_none() {
            announce_filename(
                &mut report,
                &mut filename_tx,
                download_filename(&filing.id, &filing.committee_name),
            );
        }

        let finalized = sink.finalize().await;
        match (outcome, finalized) {
            (Ok(()), Ok(())) => report.transition(ExportState::Finalized),
            (Err(e), finalized) => {
                if let Err(finalize_err) = finalized {
                    tracing::debug!(
                        filing_id = %filing.id,
                        error = %finalize_err,
                        "Finalize after failure did not complete"
                    );
                }
                report.fail(e);
            }
            (Ok(()), Err(e)) => report.fail(e),
        }

        let report = report.with_duration(start_time.elapsed());
        report.log_summary();
        report
    }

    async fn write_sheets(
        &self,
        filing: &Filing,
        sink: &mut dyn WorkbookSink,
        filename_tx: &mut Option<oneshot::Sender<String>>,
        report: &mut ExportReport,
    ) -> Result<()> {
        report.transition(ExportState::RenderingSummaries);
        self.render_summaries(filing, sink, filename_tx, report).await?;

        report.transition(ExportState::StreamingTransactions);
        for &category in &self.options.categories {
            if sink.is_cancelled() {
                return Err(FolioError::Cancelled(format!(
                    "Consumer disconnected before {category}"
                )));
            }

            let (outcome, result) =
                stream_category(self.source.as_ref(), sink, &filing.id, category, &self.options)
                    .await;
            report.categories.push(outcome);
            result?;
        }

        Ok(())
    }

    async fn render_summaries(
        &self,
        filing: &Filing,
        sink: &mut dyn WorkbookSink,
        filename_tx: &mut Option<oneshot::Sender<String>>,
        report: &mut ExportReport,
    ) -> Result<()> {
        let mut sheet: Option<SheetHandle> = None;

        for kind in SummaryKind::ALL {
            let Some(summary) = fetch_summary(self.source.as_ref(), &filing.id, kind).await? else {
                continue;
            };

            if report.filename.is_none() {
                let name = if summary.committee_name.is_empty() {
                    &filing.committee_name
                } else {
                    &summary.committee_name
                };
                announce_filename(report, filename_tx, download_filename(&filing.id, name));
            }

            let handle = match sheet.take() {
                Some(handle) => {
                    // Blank row between consecutive summary blocks
                    sink.write_row(&handle, &[]).await?;
                    handle
                }
                None => sink.open_sheet(SUMMARY_SHEET).await?,
            };

            for row in render_summary(&filing.id, &summary, self.options.link_style) {
                sink.write_row(&handle, &row).await?;
            }
            sheet = Some(handle);
            report.summaries.push(kind);
        }

        if let Some(handle) = sheet {
            sink.close_sheet(handle).await?;
        }

        if report.filename.is_none() {
            announce_filename(
                report,
                filename_tx,
                download_filename(&filing.id, &filing.committee_name),
            );
        }
        Ok(())
    }
}

fn announce_filename(
    report: &mut ExportReport,
    filename_tx: &mut Option<oneshot::Sender<String>>,
    filename: String,
) {
    if let Some(tx) = filename_tx.take() {
        // The receiver is gone when nobody waits for headers (CLI export)
        let _ = tx.send(filename.clone());
    }
    report.filename = Some(filename);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_config() {
        let config = ExportConfig {
            row_limit: 10,
            fetch_batch_size: 2,
            categories: vec![TransactionCategory::Loans, TransactionCategory::Contributions],
            link_style: LinkStyle::Plain,
            ..ExportConfig::default()
        };
        let options = ExportOptions::from(&config);

        assert_eq!(options.row_limit, 10);
        assert_eq!(options.fetch_batch_size, 2);
        assert_eq!(
            options.categories,
            vec![TransactionCategory::Contributions, TransactionCategory::Loans]
        );
        assert_eq!(options.link_style, LinkStyle::Plain);
    }

    #[test]
    fn test_default_options_cover_every_category() {
        let options = ExportOptions::default();
        assert_eq!(options.categories, TransactionCategory::ALL.to_vec());
        assert_eq!(options.row_limit, 100_000);
    }
}
