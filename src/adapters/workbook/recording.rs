//! In-memory recording sink
//!
//! Keeps every sheet and row in memory and counts protocol calls. Used by the
//! test suites and handy when inspecting an export without producing a file.

use crate::adapters::workbook::traits::{SheetHandle, SheetProtocol, WorkbookSink};
use crate::domain::{Cell, FolioError, Result, SheetRow};
use async_trait::async_trait;

/// One recorded sheet
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSheet {
    /// Sheet name
    pub name: String,
    /// Rows in write order
    pub rows: Vec<SheetRow>,
    /// Whether `close_sheet` was called for it
    pub closed: bool,
}

/// A [`WorkbookSink`] that records everything written to it
#[derive(Debug, Default)]
pub struct RecordingSink {
    protocol: SheetProtocol,
    sheets: Vec<RecordedSheet>,
    finalize_calls: usize,
    rows_written: usize,
    cancel_after_rows: Option<usize>,
}

impl RecordingSink {
    /// Creates an empty recording sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a consumer that disconnects after `rows` rows
    pub fn cancel_after_rows(rows: usize) -> Self {
        Self {
            cancel_after_rows: Some(rows),
            ..Self::default()
        }
    }

    /// All sheets in workbook order
    pub fn sheets(&self) -> &[RecordedSheet] {
        &self.sheets
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Looks up a sheet by name
    pub fn sheet(&self, name: &str) -> Option<&RecordedSheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Number of times `finalize` was called, including rejected calls
    pub fn finalize_calls(&self) -> usize {
        self.finalize_calls
    }

    /// Whether the workbook was finalized successfully
    pub fn is_finalized(&self) -> bool {
        self.protocol.is_finalized()
    }

    /// Total rows written across all sheets
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}

#[async_trait]
impl WorkbookSink for RecordingSink {
    async fn open_sheet(&mut self, name: &str) -> Result<SheetHandle> {
        let handle = self.protocol.open(name)?;
        self.sheets.push(RecordedSheet {
            name: name.to_string(),
            rows: Vec::new(),
            closed: false,
        });
        Ok(handle)
    }

    async fn write_row(&mut self, sheet: &SheetHandle, cells: &[Cell]) -> Result<()> {
        self.protocol.check_open(sheet)?;
        if self.is_cancelled() {
            return Err(FolioError::Cancelled(
                "Recording consumer disconnected".to_string(),
            ));
        }
        self.sheets[sheet.index()].rows.push(cells.to_vec());
        self.rows_written += 1;
        Ok(())
    }

    async fn close_sheet(&mut self, sheet: SheetHandle) -> Result<()> {
        self.protocol.close(&sheet)?;
        self.sheets[sheet.index()].closed = true;
        Ok(())
    }

    async fn finalize(&mut self) -> Result<()> {
        self.finalize_calls += 1;
        if let Some(open) = self.protocol.finalize()? {
            self.sheets[open].closed = true;
        }
        Ok(())
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_after_rows
            .is_some_and(|limit| self.rows_written >= limit)
    }
}
