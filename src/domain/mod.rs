//! Domain models and types for Folio.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`FilingId`])
//! - **Filing data** ([`Filing`], [`SummaryKind`], [`SummaryRecord`])
//! - **Transaction categories** ([`TransactionCategory`]) with their table and
//!   sort column mappings
//! - **Raw rows** ([`Record`], [`FieldValue`]) and **sheet cells** ([`Cell`])
//! - **Error types** ([`FolioError`], [`SinkError`]) and the [`Result`] alias
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, FolioError>`]:
//!
//! ```rust
//! use folio::domain::{FilingId, FolioError, Result};
//!
//! fn parse(raw: &str) -> Result<FilingId> {
//!     FilingId::new(raw).map_err(FolioError::Validation)
//! }
//! # assert!(parse("1285143").is_ok());
//! ```

pub mod category;
pub mod cell;
pub mod context;
pub mod errors;
pub mod filing;
pub mod ids;
pub mod record;
pub mod result;

// Re-export commonly used types for convenience
pub use category::TransactionCategory;
pub use context::ResultExt;
pub use cell::{Cell, CellFormat, CellValue, LinkStyle, SheetRow};
pub use errors::{FolioError, SinkError};
pub use filing::{ColumnPair, Filing, SummaryKind, SummaryRecord};
pub use ids::FilingId;
pub use record::{FieldValue, Record};
pub use result::Result;
