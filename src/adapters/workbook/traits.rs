//! Workbook sink abstraction
//!
//! This module defines the sheet protocol every workbook sink implements, plus
//! the bookkeeping shared by the implementations.

use crate::domain::{Cell, FolioError, Result, SinkError};
use async_trait::async_trait;

/// Maximum sheet name length accepted by spreadsheet applications
pub const MAX_SHEET_NAME_LEN: usize = 31;

const FORBIDDEN_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Handle to an open sheet
///
/// Only the handle of the currently open sheet is accepted by
/// [`WorkbookSink::write_row`] and [`WorkbookSink::close_sheet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetHandle {
    index: usize,
    name: String,
}

impl SheetHandle {
    /// Zero-based position of the sheet in the workbook
    pub fn index(&self) -> usize {
        self.index
    }

    /// Sheet name
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Destination of one export
///
/// Sheets are written one at a time: open, write rows, close. `finalize` is
/// called exactly once, after which every other call fails. A sheet still open
/// at finalize is closed implicitly, so a failed export still yields a
/// structurally complete workbook.
#[async_trait]
pub trait WorkbookSink: Send {
    /// Opens a new sheet
    ///
    /// # Errors
    ///
    /// Fails if another sheet is open, the name is invalid or already used, or
    /// the workbook was finalized.
    async fn open_sheet(&mut self, name: &str) -> Result<SheetHandle>;

    /// Appends one row to the open sheet
    ///
    /// # Errors
    ///
    /// Fails on protocol misuse, on encoder failure, or with
    /// [`FolioError::Cancelled`] when the consumer went away.
    async fn write_row(&mut self, sheet: &SheetHandle, cells: &[Cell]) -> Result<()>;

    /// Closes the open sheet
    async fn close_sheet(&mut self, sheet: SheetHandle) -> Result<()>;

    /// Completes the workbook
    async fn finalize(&mut self) -> Result<()>;

    /// Whether the consumer stopped receiving output
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Checks that a sheet name is acceptable to spreadsheet applications
///
/// # Errors
///
/// Returns [`SinkError::InvalidSheetName`] for empty, overlong or otherwise
/// unusable names.
pub fn validate_sheet_name(name: &str) -> std::result::Result<(), SinkError> {
    let invalid = |reason: &str| SinkError::InvalidSheetName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(invalid("name is longer than 31 characters"));
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_SHEET_CHARS.contains(c)) {
        return Err(invalid(&format!("character '{c}' is not allowed")));
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return Err(invalid("name cannot start or end with an apostrophe"));
    }
    Ok(())
}

/// Sheet protocol state shared by sink implementations
///
/// Tracks sheet names, the open sheet and whether the workbook was finalized.
#[derive(Debug, Default)]
pub struct SheetProtocol {
    names: Vec<String>,
    open: Option<usize>,
    finalized: bool,
}

impl SheetProtocol {
    /// Creates an empty protocol state
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new sheet and marks it open
    pub fn open(&mut self, name: &str) -> Result<SheetHandle> {
        if self.finalized {
            return Err(SinkError::AlreadyFinalized.into());
        }
        if let Some(idx) = self.open {
            return Err(SinkError::SheetStillOpen(self.names[idx].clone()).into());
        }
        validate_sheet_name(name)?;
        // Spreadsheet applications compare sheet names case-insensitively
        if self.names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            return Err(SinkError::DuplicateSheet(name.to_string()).into());
        }

        let index = self.names.len();
        self.names.push(name.to_string());
        self.open = Some(index);
        Ok(SheetHandle {
            index,
            name: name.to_string(),
        })
    }

    /// Checks that `sheet` is the open sheet
    pub fn check_open(&self, sheet: &SheetHandle) -> Result<()> {
        if self.finalized {
            return Err(SinkError::AlreadyFinalized.into());
        }
        if self.open != Some(sheet.index) {
            return Err(SinkError::SheetNotOpen(sheet.name.clone()).into());
        }
        Ok(())
    }

    /// Marks `sheet` closed
    pub fn close(&mut self, sheet: &SheetHandle) -> Result<()> {
        self.check_open(sheet)?;
        self.open = None;
        Ok(())
    }

    /// Marks the workbook finalized
    ///
    /// Returns the index of a sheet that was still open, which the caller must
    /// close implicitly.
    pub fn finalize(&mut self) -> Result<Option<usize>> {
        if self.finalized {
            return Err(FolioError::Sink(SinkError::AlreadyFinalized));
        }
        self.finalized = true;
        Ok(self.open.take())
    }

    /// Names of all sheets opened so far, in workbook order
    pub fn sheet_names(&self) -> &[String] {
        &self.names
    }

    /// Whether the workbook was finalized
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sheet_name() {
        assert!(validate_sheet_name("summary").is_ok());
        assert!(validate_sheet_name("independent-expenditures").is_ok());
        assert!(validate_sheet_name("").is_err());
        assert!(validate_sheet_name("a/b").is_err());
        assert!(validate_sheet_name("'quoted'").is_err());
        assert!(validate_sheet_name(&"x".repeat(32)).is_err());
        assert!(validate_sheet_name(&"x".repeat(31)).is_ok());
    }

    #[test]
    fn test_protocol_rejects_duplicates() {
        let mut protocol = SheetProtocol::new();
        let handle = protocol.open("loans").unwrap();
        protocol.close(&handle).unwrap();

        let err = protocol.open("Loans").unwrap_err();
        assert!(matches!(err, FolioError::Sink(SinkError::DuplicateSheet(_))));
    }

    #[test]
    fn test_protocol_one_sheet_at_a_time() {
        let mut protocol = SheetProtocol::new();
        let first = protocol.open("summary").unwrap();
        let err = protocol.open("debts").unwrap_err();
        assert!(matches!(err, FolioError::Sink(SinkError::SheetStillOpen(_))));

        protocol.close(&first).unwrap();
        assert!(protocol.check_open(&first).is_err());
    }

    #[test]
    fn test_protocol_finalize_once() {
        let mut protocol = SheetProtocol::new();
        let handle = protocol.open("debts").unwrap();

        assert_eq!(protocol.finalize().unwrap(), Some(handle.index()));
        assert!(protocol.is_finalized());
        assert!(matches!(
            protocol.finalize(),
            Err(FolioError::Sink(SinkError::AlreadyFinalized))
        ));
        assert!(protocol.open("loans").is_err());
        assert_eq!(protocol.sheet_names(), ["debts".to_string()]);
    }
}
