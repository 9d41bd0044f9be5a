//! Export orchestration
//!
//! This module provides the export pipeline for one filing:
//! - Summary sheet rendering
//! - Transaction streaming, one sheet per category
//! - Export coordination and reporting

pub mod coordinator;
pub mod filename;
pub mod report;
pub mod streamer;
pub mod summary;

pub use coordinator::{ExportCoordinator, ExportOptions};
pub use filename::{download_filename, slugify, WORKBOOK_EXTENSION};
pub use report::{ExportReport, ExportState};
pub use streamer::{stream_category, CategoryOutcome, SheetStreamer};
pub use summary::{fetch_summary, render_summary, SUMMARY_SHEET};
