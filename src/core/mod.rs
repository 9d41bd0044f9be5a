//! Core business logic for Folio.
//!
//! # Modules
//!
//! - [`format`] - Cell formatting for amounts, dates and raw fields
//! - [`export`] - Export orchestration, summary rendering and transaction streaming
//!
//! # Export Workflow
//!
//! 1. **Resolve**: Look up the filing; an unknown filing stops here
//! 2. **Summaries**: Render every summary form found into the `summary` sheet
//! 3. **Transactions**: Stream each category into its own sheet, sorted descending
//! 4. **Finalize**: Complete the workbook, also after a failure
//!
//! # Example
//!
//! ```rust,no_run
//! use folio::adapters::database::create_filing_source;
//! use folio::adapters::workbook::RecordingSink;
//! use folio::config::load_config;
//! use folio::core::export::{ExportCoordinator, ExportOptions};
//! use folio::domain::FilingId;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("folio.toml")?;
//! let source = create_filing_source(&config.database)?;
//! let coordinator = ExportCoordinator::new(source, ExportOptions::from(&config.export));
//!
//! let mut sink = RecordingSink::new();
//! let report = coordinator.run(&FilingId::new("1285143")?, &mut sink).await?;
//!
//! println!("Rows: {}", report.total_rows());
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod format;
