//! External system integrations for Folio.
//!
//! This module provides adapters for the systems an export touches:
//!
//! - [`database`] - Filing source abstraction layer (trait-based)
//! - [`postgresql`] - PostgreSQL implementation with pooled, cursor-backed reads
//! - [`workbook`] - Workbook sinks: the streaming XLSX encoder and an in-memory recorder
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with in-memory implementations. The export pipeline only sees
//! the [`database::FilingSource`] and [`workbook::WorkbookSink`] traits.
//!
//! # PostgreSQL Adapter
//!
//! ```rust,no_run
//! use folio::adapters::database::create_filing_source;
//! use folio::config::DatabaseConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = create_filing_source(&DatabaseConfig::default())?;
//! source.test_connection().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # XLSX Sink
//!
//! ```rust,no_run
//! use folio::adapters::workbook::{WorkbookSink, XlsxSink, DEFAULT_FLUSH_THRESHOLD};
//! use folio::domain::Cell;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (mut sink, mut rx) = XlsxSink::channel(16, DEFAULT_FLUSH_THRESHOLD);
//! tokio::spawn(async move { while rx.recv().await.is_some() {} });
//!
//! let sheet = sink.open_sheet("contributions").await?;
//! sink.write_row(&sheet, &[Cell::text("contributor_name")]).await?;
//! sink.close_sheet(sheet).await?;
//! sink.finalize().await?;
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod postgresql;
pub mod workbook;
