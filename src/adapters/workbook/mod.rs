//! Workbook sinks
//!
//! The [`WorkbookSink`] protocol plus its two implementations: [`XlsxSink`],
//! which streams an XLSX file into a bounded byte channel, and
//! [`RecordingSink`], which keeps everything in memory.

pub mod recording;
pub mod traits;
pub mod xlsx;

pub use recording::{RecordedSheet, RecordingSink};
pub use traits::{validate_sheet_name, SheetHandle, SheetProtocol, WorkbookSink};
pub use xlsx::{ByteChunk, XlsxSink, DEFAULT_FLUSH_THRESHOLD};
