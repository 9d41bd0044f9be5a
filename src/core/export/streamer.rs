//! Transaction streaming
//!
//! Moves one category's transactions from the source cursor into a sheet,
//! batch by batch, without holding more than one batch in memory.

use crate::adapters::database::{BatchVisitor, FilingSource, VisitFlow};
use crate::adapters::workbook::{SheetHandle, WorkbookSink};
use crate::core::export::coordinator::ExportOptions;
use crate::core::format::format_field;
use crate::domain::{Cell, FilingId, FolioError, Record, Result, TransactionCategory};
use async_trait::async_trait;
use std::sync::Arc;

/// Outcome of streaming one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryOutcome {
    /// The category streamed
    pub category: TransactionCategory,
    /// Data rows written, excluding the header
    pub rows: u64,
    /// Whether a sheet was opened (false when the category had no rows)
    pub sheet_opened: bool,
}

/// Writes cursor batches into a category sheet
///
/// The sheet is opened lazily on the first record, with a header row made of
/// that record's field names. A category without rows never opens a sheet.
pub struct SheetStreamer<'a> {
    sink: &'a mut dyn WorkbookSink,
    category: TransactionCategory,
    sheet: Option<SheetHandle>,
    header: Arc<[String]>,
    rows: u64,
    opened: bool,
}

impl<'a> SheetStreamer<'a> {
    /// Create a streamer writing `category` into `sink`
    pub fn new(sink: &'a mut dyn WorkbookSink, category: TransactionCategory) -> Self {
        Self {
            sink,
            category,
            sheet: None,
            header: Arc::from(Vec::new()),
            rows: 0,
            opened: false,
        }
    }

    /// Data rows written so far
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Closes the sheet if one is open
    ///
    /// # Errors
    ///
    /// Propagates sink failures.
    pub async fn close(&mut self) -> Result<()> {
        match self.sheet.take() {
            Some(handle) => self.sink.close_sheet(handle).await,
            None => Ok(()),
        }
    }

    /// Consumes the streamer into its outcome
    pub fn into_outcome(self) -> CategoryOutcome {
        CategoryOutcome {
            category: self.category,
            rows: self.rows,
            sheet_opened: self.opened,
        }
    }

    async fn open(&mut self, first: &Record) -> Result<SheetHandle> {
        let handle = self.sink.open_sheet(self.category.sheet_name()).await?;
        // Stored before the header is written so `close` reaches it on failure
        self.sheet = Some(handle.clone());
        self.opened = true;
        self.header = first.shared_columns();

        let header: Vec<Cell> = self.header.iter().map(Cell::text).collect();
        self.sink.write_row(&handle, &header).await?;
        Ok(handle)
    }

    fn format_record(&self, record: &Record) -> Vec<Cell> {
        if record.shares_columns(&self.header) || record.columns() == &*self.header {
            return self
                .header
                .iter()
                .zip(record.values())
                .map(|(name, value)| format_field(name, value))
                .collect();
        }

        self.header
            .iter()
            .map(|name| match record.get(name) {
                Some(value) => format_field(name, value),
                None => Cell::empty(),
            })
            .collect()
    }
}

#[async_trait]
impl BatchVisitor for SheetStreamer<'_> {
    async fn visit(&mut self, batch: Vec<Record>) -> Result<VisitFlow> {
        let Some(first) = batch.first() else {
            return Ok(VisitFlow::Continue);
        };

        let handle = match self.sheet.clone() {
            Some(handle) => handle,
            None => self.open(first).await?,
        };

        for record in &batch {
            let cells = self.format_record(record);
            self.sink.write_row(&handle, &cells).await?;
            self.rows += 1;
        }

        tracing::trace!(
            category = %self.category,
            rows = self.rows,
            "Batch written"
        );
        Ok(VisitFlow::Continue)
    }

    fn is_cancelled(&self) -> bool {
        self.sink.is_cancelled()
    }
}

/// Streams one category of a filing into its own sheet
///
/// Rows arrive sorted descending by the category's sort column and are capped
/// at the configured row limit. The sheet is closed on every exit path; on a
/// mid-stream failure the rows already written stay in the sheet, and the
/// outcome still counts them alongside the error.
pub async fn stream_category(
    source: &dyn FilingSource,
    sink: &mut dyn WorkbookSink,
    filing_id: &FilingId,
    category: TransactionCategory,
    options: &ExportOptions,
) -> (CategoryOutcome, Result<()>) {
    let mut streamer = SheetStreamer::new(sink, category);

    let streamed = source
        .stream_transactions(
            filing_id,
            category,
            options.row_limit,
            options.fetch_batch_size,
            &mut streamer,
        )
        .await
        .and_then(|_| {
            if streamer.is_cancelled() {
                Err(FolioError::Cancelled(format!(
                    "Consumer disconnected during {category}"
                )))
            } else {
                Ok(())
            }
        });
    let closed = streamer.close().await;
    let outcome = streamer.into_outcome();

    let result = match (streamed, closed) {
        (Ok(()), closed) => closed,
        (Err(e), closed) => {
            if let Err(close_err) = closed {
                tracing::debug!(
                    category = %category,
                    error = %close_err,
                    "Failed to close sheet after stream error"
                );
            }
            Err(e)
        }
    };

    match &result {
        Ok(()) => tracing::debug!(
            filing_id = %filing_id,
            category = %category,
            rows = outcome.rows,
            "Category streamed"
        ),
        Err(e) if e.is_cancelled() => tracing::debug!(
            filing_id = %filing_id,
            category = %category,
            rows = outcome.rows,
            "Category stream cancelled"
        ),
        Err(e) => tracing::warn!(
            filing_id = %filing_id,
            category = %category,
            rows = outcome.rows,
            error = %e,
            "Category stream stopped early"
        ),
    }

    (outcome, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::workbook::RecordingSink;
    use crate::domain::{CellFormat, FieldValue};

    fn record(id: i64, amount: &str) -> Record {
        Record::from_pairs([
            ("filing_id", FieldValue::from("F1")),
            ("transaction_id", FieldValue::from(id)),
            ("contribution_amount", FieldValue::from(amount)),
            ("memo_text", FieldValue::Null),
        ])
    }

    #[tokio::test]
    async fn test_first_batch_opens_sheet_with_header() {
        let mut sink = RecordingSink::new();
        let mut streamer = SheetStreamer::new(&mut sink, TransactionCategory::Contributions);

        let flow = streamer
            .visit(vec![record(1, "200.00"), record(2, "50")])
            .await
            .unwrap();
        assert_eq!(flow, VisitFlow::Continue);
        streamer.close().await.unwrap();
        let outcome = streamer.into_outcome();
        assert_eq!(outcome.rows, 2);
        assert!(outcome.sheet_opened);

        let sheet = sink.sheet("contributions").unwrap();
        assert!(sheet.closed);
        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(
            sheet.rows[0]
                .iter()
                .map(Cell::display_text)
                .collect::<Vec<_>>(),
            vec!["filing_id", "transaction_id", "contribution_amount", "memo_text"]
        );
        assert_eq!(sheet.rows[1][2].format, CellFormat::Currency);
        assert_eq!(sheet.rows[1][2].display_text(), "$200.00");
        assert!(sheet.rows[1][3].is_empty());
    }

    #[tokio::test]
    async fn test_later_batches_reuse_sheet() {
        let mut sink = RecordingSink::new();
        let mut streamer = SheetStreamer::new(&mut sink, TransactionCategory::Contributions);

        streamer.visit(vec![record(1, "3")]).await.unwrap();
        streamer.visit(vec![record(2, "2")]).await.unwrap();
        streamer.visit(Vec::new()).await.unwrap();
        streamer.close().await.unwrap();
        assert_eq!(streamer.rows(), 2);

        assert_eq!(sink.sheet_names(), vec!["contributions"]);
        assert_eq!(sink.sheet("contributions").unwrap().rows.len(), 3);
    }

    #[tokio::test]
    async fn test_no_records_no_sheet() {
        let mut sink = RecordingSink::new();
        let mut streamer = SheetStreamer::new(&mut sink, TransactionCategory::Loans);

        streamer.visit(Vec::new()).await.unwrap();
        streamer.close().await.unwrap();
        assert!(!streamer.into_outcome().sheet_opened);
        assert!(sink.sheets().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_follows_sink() {
        let mut sink = RecordingSink::cancel_after_rows(2);
        let mut streamer = SheetStreamer::new(&mut sink, TransactionCategory::Debts);
        assert!(!streamer.is_cancelled());

        let err = streamer
            .visit(vec![record(1, "1"), record(2, "2"), record(3, "3")])
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(streamer.is_cancelled());
    }

    #[tokio::test]
    async fn test_failed_header_write_still_closes_sheet() {
        let mut sink = RecordingSink::cancel_after_rows(0);
        let mut streamer = SheetStreamer::new(&mut sink, TransactionCategory::Loans);

        let err = streamer.visit(vec![record(1, "1")]).await.unwrap_err();
        assert!(err.is_cancelled());
        streamer.close().await.unwrap();
        assert!(streamer.into_outcome().sheet_opened);

        let sheet = sink.sheet("loans").unwrap();
        assert!(sheet.closed);
        assert!(sheet.rows.is_empty());
    }

    #[tokio::test]
    async fn test_records_with_other_column_order_follow_header() {
        let mut sink = RecordingSink::new();
        let mut streamer = SheetStreamer::new(&mut sink, TransactionCategory::Contributions);

        let reordered = Record::from_pairs([
            ("memo_text", FieldValue::from("late")),
            ("contribution_amount", FieldValue::from("9")),
            ("filing_id", FieldValue::from("F1")),
        ]);
        streamer
            .visit(vec![record(1, "10"), reordered])
            .await
            .unwrap();
        streamer.close().await.unwrap();

        let rows = &sink.sheet("contributions").unwrap().rows;
        let texts: Vec<String> = rows[2].iter().map(Cell::display_text).collect();
        assert_eq!(texts, vec!["F1", "", "$9.00", "late"]);
    }
}
