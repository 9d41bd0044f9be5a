//! Export reporting
//!
//! This module tracks the state and outcome of one export.

use crate::core::export::streamer::CategoryOutcome;
use crate::domain::{FilingId, FolioError, SummaryKind, TransactionCategory};
use std::fmt;
use std::time::Duration;

/// Pipeline state of one export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportState {
    /// Nothing started
    Idle,
    /// Looking up filing metadata
    ResolvingFiling,
    /// Writing the summary sheet
    RenderingSummaries,
    /// Writing category sheets
    StreamingTransactions,
    /// Workbook completed
    Finalized,
    /// Stopped by an error; the workbook was still finalized if a sink existed
    Failed,
}

impl ExportState {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExportState::Finalized | ExportState::Failed)
    }

    fn as_str(&self) -> &'static str {
        match self {
            ExportState::Idle => "idle",
            ExportState::ResolvingFiling => "resolving_filing",
            ExportState::RenderingSummaries => "rendering_summaries",
            ExportState::StreamingTransactions => "streaming_transactions",
            ExportState::Finalized => "finalized",
            ExportState::Failed => "failed",
        }
    }
}

impl fmt::Display for ExportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one export
#[derive(Debug)]
pub struct ExportReport {
    /// Exported filing
    pub filing_id: FilingId,

    /// Last state reached
    pub state: ExportState,

    /// Download filename chosen for the workbook
    pub filename: Option<String>,

    /// Summary kinds rendered, in order
    pub summaries: Vec<SummaryKind>,

    /// Categories streamed, in order, including a partially streamed one
    pub categories: Vec<CategoryOutcome>,

    /// Error that stopped the export
    pub error: Option<FolioError>,

    /// Wall-clock duration
    pub duration: Duration,
}

impl ExportReport {
    /// Create an empty report
    pub fn new(filing_id: FilingId) -> Self {
        Self {
            filing_id,
            state: ExportState::Idle,
            filename: None,
            summaries: Vec::new(),
            categories: Vec::new(),
            error: None,
            duration: Duration::ZERO,
        }
    }

    /// Moves to `state`
    pub fn transition(&mut self, state: ExportState) {
        tracing::debug!(
            filing_id = %self.filing_id,
            from = %self.state,
            to = %state,
            "Export state changed"
        );
        self.state = state;
    }

    /// Records the error that stopped the export and moves to `Failed`
    pub fn fail(&mut self, error: FolioError) {
        self.transition(ExportState::Failed);
        self.error = Some(error);
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Whether every step ran and the workbook was finalized
    pub fn is_complete(&self) -> bool {
        self.state == ExportState::Finalized && self.error.is_none()
    }

    /// Whether the export stopped because the consumer went away
    pub fn is_cancelled(&self) -> bool {
        self.error.as_ref().is_some_and(FolioError::is_cancelled)
    }

    /// Data rows written for `category`
    pub fn rows_for(&self, category: TransactionCategory) -> u64 {
        self.categories
            .iter()
            .filter(|c| c.category == category)
            .map(|c| c.rows)
            .sum()
    }

    /// Data rows written across all categories
    pub fn total_rows(&self) -> u64 {
        self.categories.iter().map(|c| c.rows).sum()
    }

    /// Log the report
    pub fn log_summary(&self) {
        let sheets = self.categories.iter().filter(|c| c.sheet_opened).count();
        match &self.error {
            None => {
                tracing::debug!(
                    filing_id = %self.filing_id,
                    summaries = self.summaries.len(),
                    category_sheets = sheets,
                    "Workbook contents"
                );
                crate::log_export_complete!(self.filing_id, self.total_rows(), self.duration);
            }
            Some(e) if e.is_cancelled() => tracing::info!(
                filing_id = %self.filing_id,
                rows = self.total_rows(),
                "Export abandoned, consumer disconnected"
            ),
            Some(e) => tracing::warn!(
                filing_id = %self.filing_id,
                state = %self.state,
                rows = self.total_rows(),
                error = %e,
                "Export finished with errors"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ExportReport {
        ExportReport::new(FilingId::new("F100").unwrap())
    }

    #[test]
    fn test_new_report_is_idle() {
        let report = report();
        assert_eq!(report.state, ExportState::Idle);
        assert!(!report.is_complete());
        assert_eq!(report.total_rows(), 0);
    }

    #[test]
    fn test_rows_per_category() {
        let mut report = report();
        report.categories.push(CategoryOutcome {
            category: TransactionCategory::Contributions,
            rows: 3,
            sheet_opened: true,
        });
        report.categories.push(CategoryOutcome {
            category: TransactionCategory::Loans,
            rows: 0,
            sheet_opened: false,
        });

        assert_eq!(report.rows_for(TransactionCategory::Contributions), 3);
        assert_eq!(report.rows_for(TransactionCategory::Debts), 0);
        assert_eq!(report.total_rows(), 3);
    }

    #[test]
    fn test_fail_records_error() {
        let mut report = report();
        report.transition(ExportState::StreamingTransactions);
        report.fail(FolioError::Cancelled("gone".to_string()));

        assert_eq!(report.state, ExportState::Failed);
        assert!(report.state.is_terminal());
        assert!(report.is_cancelled());
        assert!(!report.is_complete());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(
            ExportState::StreamingTransactions.to_string(),
            "streaming_transactions"
        );
    }
}
