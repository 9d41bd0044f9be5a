//! Data source abstraction layer
//!
//! This module provides the trait-based seam between the export pipeline and
//! the database holding filings.

pub mod factory;
pub mod traits;

pub use factory::create_filing_source;
pub use traits::{BatchVisitor, FilingSource, VisitFlow};
