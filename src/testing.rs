//! In-memory test fixtures
//!
//! [`FixtureSource`] is a [`FilingSource`] backed by plain collections. It
//! honors the same ordering, limit and batching contract as the database
//! source, can inject failures, and counts cursor acquisitions and releases
//! so tests can check that every stream gave its cursor back.

use crate::adapters::database::{BatchVisitor, FilingSource, VisitFlow};
use crate::core::format::format_currency;
use crate::domain::{
    CellValue, FieldValue, Filing, FilingId, FolioError, Record, Result, SummaryKind,
    SummaryRecord, TransactionCategory,
};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::Arc;

/// Builds filing metadata for fixtures
pub fn fixture_filing(filing_id: &str, committee_name: &str) -> Result<Filing> {
    let id = FilingId::new(filing_id).map_err(FolioError::Validation)?;
    Ok(Filing {
        id,
        committee_name: committee_name.to_string(),
        filer_committee_id_number: "C00000000".to_string(),
        coverage_from_date: FieldValue::from("2015-01-01"),
        coverage_through_date: FieldValue::from("2015-06-30"),
    })
}

#[derive(Debug, Default)]
struct Counters {
    opened: AtomicUsize,
    released: AtomicUsize,
    summary_lookups: AtomicUsize,
}

/// Releases a fixture cursor when dropped
struct CursorGuard {
    counters: Arc<Counters>,
}

impl CursorGuard {
    fn acquire(counters: &Arc<Counters>) -> Self {
        counters.opened.fetch_add(1, AtomicOrdering::SeqCst);
        Self {
            counters: Arc::clone(counters),
        }
    }
}

impl Drop for CursorGuard {
    fn drop(&mut self) {
        self.counters.released.fetch_add(1, AtomicOrdering::SeqCst);
    }
}

/// In-memory [`FilingSource`]
#[derive(Debug, Default)]
pub struct FixtureSource {
    filings: HashMap<FilingId, Filing>,
    summaries: HashMap<(FilingId, SummaryKind), SummaryRecord>,
    transactions: HashMap<(FilingId, TransactionCategory), Vec<Record>>,
    fail_after: HashMap<TransactionCategory, u64>,
    unavailable: AtomicBool,
    counters: Arc<Counters>,
}

impl FixtureSource {
    /// Creates an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filing
    pub fn with_filing(mut self, filing: Filing) -> Self {
        self.filings.insert(filing.id.clone(), filing);
        self
    }

    /// Adds a summary for a filing
    pub fn with_summary(mut self, filing_id: &FilingId, summary: SummaryRecord) -> Self {
        self.summaries
            .insert((filing_id.clone(), summary.kind), summary);
        self
    }

    /// Adds transactions for a filing, in any order
    pub fn with_transactions(
        mut self,
        filing_id: &FilingId,
        category: TransactionCategory,
        records: Vec<Record>,
    ) -> Self {
        self.transactions
            .entry((filing_id.clone(), category))
            .or_default()
            .extend(records);
        self
    }

    /// Makes streams of `category` fail once `rows` rows were delivered
    pub fn fail_after(mut self, category: TransactionCategory, rows: u64) -> Self {
        self.fail_after.insert(category, rows);
        self
    }

    /// Makes every call fail as if the database went away
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, AtomicOrdering::SeqCst);
    }

    /// Cursors acquired so far
    pub fn cursors_opened(&self) -> usize {
        self.counters.opened.load(AtomicOrdering::SeqCst)
    }

    /// Cursors released so far
    pub fn cursors_released(&self) -> usize {
        self.counters.released.load(AtomicOrdering::SeqCst)
    }

    /// Summary lookups served so far
    pub fn summary_lookups(&self) -> usize {
        self.counters.summary_lookups.load(AtomicOrdering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            return Err(FolioError::SourceUnavailable(
                "Fixture source unavailable".to_string(),
            ));
        }
        Ok(())
    }

    /// Rows of a category as the database would return them
    fn sorted_rows(&self, filing_id: &FilingId, category: TransactionCategory) -> Vec<Record> {
        let mut rows = self
            .transactions
            .get(&(filing_id.clone(), category))
            .cloned()
            .unwrap_or_default();
        let column = category.sort_column();
        rows.sort_by(|a, b| compare_desc(a.get(column), b.get(column)));
        rows
    }
}

fn sort_key(value: Option<&FieldValue>) -> Option<rust_decimal::Decimal> {
    match value {
        None | Some(FieldValue::Null) => None,
        Some(v) => match format_currency(v).map(|cell| cell.value) {
            Ok(CellValue::Number(n)) => Some(n),
            _ => None,
        },
    }
}

/// Descending with NULLs first, as PostgreSQL orders `DESC`; `sort_by` keeps ties in insertion order
fn compare_desc(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    match (sort_key(a), sort_key(b)) {
        (Some(x), Some(y)) => y.cmp(&x),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl FilingSource for FixtureSource {
    async fn test_connection(&self) -> Result<()> {
        self.check_available()
    }

    async fn find_filing(&self, filing_id: &FilingId) -> Result<Option<Filing>> {
        self.check_available()?;
        Ok(self.filings.get(filing_id).cloned())
    }

    async fn find_summary(
        &self,
        filing_id: &FilingId,
        kind: SummaryKind,
    ) -> Result<Option<SummaryRecord>> {
        self.check_available()?;
        self.counters
            .summary_lookups
            .fetch_add(1, AtomicOrdering::SeqCst);
        Ok(self.summaries.get(&(filing_id.clone(), kind)).cloned())
    }

    async fn stream_transactions(
        &self,
        filing_id: &FilingId,
        category: TransactionCategory,
        limit: u64,
        batch_size: usize,
        visitor: &mut dyn BatchVisitor,
    ) -> Result<u64> {
        self.check_available()?;
        let _cursor = CursorGuard::acquire(&self.counters);

        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let mut rows = self.sorted_rows(filing_id, category);
        rows.truncate(limit);

        let fail_at = self
            .fail_after
            .get(&category)
            .and_then(|n| usize::try_from(*n).ok())
            .filter(|n| *n <= rows.len());
        if let Some(n) = fail_at {
            rows.truncate(n);
        }

        let mut delivered: u64 = 0;
        let mut flow = VisitFlow::Continue;
        for batch in rows.chunks(batch_size.max(1)) {
            if visitor.is_cancelled() {
                return Ok(delivered);
            }
            delivered += batch.len() as u64;
            flow = visitor.visit(batch.to_vec()).await?;
            if flow == VisitFlow::Stop {
                break;
            }
        }

        match fail_at {
            Some(n) if flow == VisitFlow::Continue && !visitor.is_cancelled() => {
                Err(FolioError::SourceUnavailable(format!(
                    "Injected failure in {category} after {n} rows"
                )))
            }
            _ => Ok(delivered),
        }
    }

    fn describe(&self) -> String {
        "fixture://memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Collect {
        batches: Vec<usize>,
        amounts: Vec<String>,
    }

    #[async_trait]
    impl BatchVisitor for Collect {
        async fn visit(&mut self, batch: Vec<Record>) -> Result<VisitFlow> {
            self.batches.push(batch.len());
            self.amounts.extend(
                batch
                    .iter()
                    .map(|r| r.get_or_null("loan_balance").to_string()),
            );
            Ok(VisitFlow::Continue)
        }
    }

    fn loan(balance: &str) -> Record {
        Record::from_pairs([("loan_balance", FieldValue::from(balance))])
    }

    fn source() -> (FixtureSource, FilingId) {
        let id = FilingId::new("F1").unwrap();
        let source = FixtureSource::new().with_transactions(
            &id,
            TransactionCategory::Loans,
            vec![loan("5"), loan("50"), loan("7.5")],
        );
        (source, id)
    }

    #[tokio::test]
    async fn test_streams_sorted_in_batches() {
        let (source, id) = source();
        let mut visitor = Collect { batches: Vec::new(), amounts: Vec::new() };

        let total = source
            .stream_transactions(&id, TransactionCategory::Loans, 100, 2, &mut visitor)
            .await
            .unwrap();

        assert_eq!(total, 3);
        assert_eq!(visitor.batches, vec![2, 1]);
        assert_eq!(visitor.amounts, vec!["50", "7.5", "5"]);
        assert_eq!(source.cursors_opened(), 1);
        assert_eq!(source.cursors_released(), 1);
    }

    #[tokio::test]
    async fn test_limit_caps_rows() {
        let (source, id) = source();
        let mut visitor = Collect { batches: Vec::new(), amounts: Vec::new() };

        source
            .stream_transactions(&id, TransactionCategory::Loans, 1, 10, &mut visitor)
            .await
            .unwrap();
        assert_eq!(visitor.amounts, vec!["50"]);
    }

    #[tokio::test]
    async fn test_injected_failure_releases_cursor() {
        let (source, id) = source();
        let source = source.fail_after(TransactionCategory::Loans, 2);
        let mut visitor = Collect { batches: Vec::new(), amounts: Vec::new() };

        let err = source
            .stream_transactions(&id, TransactionCategory::Loans, 100, 1, &mut visitor)
            .await
            .unwrap_err();

        assert!(matches!(err, FolioError::SourceUnavailable(_)));
        assert_eq!(visitor.amounts.len(), 2);
        assert_eq!(source.cursors_released(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_source() {
        let (source, id) = source();
        source.set_unavailable(true);
        assert!(source.find_filing(&id).await.is_err());
        assert!(source.test_connection().await.is_err());
        assert_eq!(source.cursors_opened(), 0);
    }
}
