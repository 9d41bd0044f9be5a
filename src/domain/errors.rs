//! Domain error types
//!
//! This module defines the error hierarchy for Folio. Errors raised by the
//! database driver, the zip encoder or the filesystem are converted at the
//! adapter boundary, so callers only ever see these types.

use thiserror::Error;

/// Main Folio error type
///
/// Every fallible operation in the crate returns this error. The variants follow
/// the export failure taxonomy: a missing filing, an unavailable data source,
/// per-cell formatting failures, sink failures and cancellation.
#[derive(Debug, Error)]
pub enum FolioError {
    /// The requested filing has no matching record
    #[error("Filing not found: {0}")]
    NotFound(String),

    /// Database connectivity or query execution failure
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// A cell value could not be parsed as a decimal amount
    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    /// A cell value could not be parsed as a date
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Workbook sink errors
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// The downstream consumer stopped receiving bytes
    #[error("Export cancelled: {0}")]
    Cancelled(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl FolioError {
    /// Whether this error means the consumer went away rather than a real failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FolioError::Cancelled(_))
    }
}

/// Workbook sink errors
///
/// Raised when the sheet protocol is misused or the encoder fails.
#[derive(Debug, Error)]
pub enum SinkError {
    /// A sheet with the same name was already opened in this workbook
    #[error("Duplicate sheet name: {0}")]
    DuplicateSheet(String),

    /// The sheet name is not acceptable to spreadsheet applications
    #[error("Invalid sheet name '{name}': {reason}")]
    InvalidSheetName { name: String, reason: String },

    /// Another sheet is still open
    #[error("Sheet '{0}' is still open")]
    SheetStillOpen(String),

    /// The handle does not refer to the currently open sheet
    #[error("Sheet '{0}' is not open")]
    SheetNotOpen(String),

    /// The workbook was already finalized
    #[error("Workbook already finalized")]
    AlreadyFinalized,

    /// The encoder failed to produce bytes
    #[error("Encoding failed: {0}")]
    Encoding(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for FolioError {
    fn from(err: std::io::Error) -> Self {
        FolioError::Io(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for FolioError {
    fn from(err: toml::de::Error) -> Self {
        FolioError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<tokio_postgres::Error> for FolioError {
    fn from(err: tokio_postgres::Error) -> Self {
        FolioError::SourceUnavailable(err.to_string())
    }
}

impl From<deadpool_postgres::PoolError> for FolioError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        FolioError::SourceUnavailable(format!("Failed to get connection from pool: {err}"))
    }
}

impl From<zip::result::ZipError> for FolioError {
    fn from(err: zip::result::ZipError) -> Self {
        FolioError::Sink(SinkError::Encoding(err.to_string()))
    }
}
