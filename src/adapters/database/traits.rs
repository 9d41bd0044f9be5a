//! Data source abstraction traits
//!
//! This module defines the traits a filing data source must implement to feed
//! an export.

use crate::domain::{
    FilingId, FolioError, Record, Result, SummaryKind, SummaryRecord, TransactionCategory,
};
use crate::domain::Filing;
use async_trait::async_trait;

/// What a [`BatchVisitor`] wants after a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitFlow {
    /// Fetch the next batch
    Continue,
    /// Stop fetching; the cursor is released
    Stop,
}

/// Consumer of cursor batches
///
/// The source calls [`visit`](BatchVisitor::visit) once per fetched batch and
/// only fetches the next batch after the previous call returned, so a slow
/// visitor slows down the cursor.
#[async_trait]
pub trait BatchVisitor: Send {
    /// Consumes one batch of records in source order
    ///
    /// # Errors
    ///
    /// An error stops the stream; the source releases the cursor and returns it.
    async fn visit(&mut self, batch: Vec<Record>) -> Result<VisitFlow>;

    /// Whether the consumer went away
    ///
    /// Checked before every fetch.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Source of filing data
///
/// Implementations own their connections. A transaction stream holds one
/// cursor and one connection for the duration of the call and releases both on
/// every exit path.
#[async_trait]
pub trait FilingSource: Send + Sync {
    /// Test the connection to the source
    async fn test_connection(&self) -> Result<()>;

    /// Looks up filing metadata
    ///
    /// Returns `Ok(None)` when no filing has this identifier.
    async fn find_filing(&self, filing_id: &FilingId) -> Result<Option<Filing>>;

    /// Looks up one summary of the given kind
    ///
    /// Returns `Ok(None)` when the filing has no summary of this kind.
    async fn find_summary(
        &self,
        filing_id: &FilingId,
        kind: SummaryKind,
    ) -> Result<Option<SummaryRecord>>;

    /// Streams a category's transactions, sorted descending by the category's
    /// sort column and capped at `limit` rows, into `visitor` in batches of at
    /// most `batch_size` records
    ///
    /// Returns the number of records handed to the visitor.
    async fn stream_transactions(
        &self,
        filing_id: &FilingId,
        category: TransactionCategory,
        limit: u64,
        batch_size: usize,
        visitor: &mut dyn BatchVisitor,
    ) -> Result<u64>;

    /// Short description of the source for logs (never contains secrets)
    fn describe(&self) -> String;
}

/// Builds the cursor query for a category
///
/// Table and column names come from the closed category registry, never from
/// user input.
pub fn transactions_query(category: TransactionCategory) -> String {
    format!(
        "SELECT * FROM {} WHERE filing_id = $1 ORDER BY {} DESC LIMIT $2",
        category.table(),
        category.sort_column()
    )
}

/// Builds the single-row summary lookup for a kind
pub fn summary_query(kind: SummaryKind) -> String {
    format!("SELECT * FROM {} WHERE filing_id = $1 LIMIT 1", kind.table())
}

/// Query used to look up filing metadata
pub const FILING_QUERY: &str = "SELECT * FROM fec_filings WHERE filing_id = $1 LIMIT 1";

/// Converts a row limit into the `LIMIT` parameter
pub fn limit_param(limit: u64) -> Result<i64> {
    i64::try_from(limit)
        .map_err(|_| FolioError::Validation(format!("Row limit {limit} is too large")))
}
