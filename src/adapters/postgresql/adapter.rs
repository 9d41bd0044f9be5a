//! PostgreSQL adapter implementing [`FilingSource`]
//!
//! Lookups are single prepared queries. Transaction streams run a portal
//! cursor inside a read-only transaction; the transaction and its pooled
//! connection are owned by the streaming call, so every exit path (success,
//! error, cancellation) rolls back and returns the connection.

use crate::adapters::database::traits::{
    limit_param, summary_query, transactions_query, BatchVisitor, FilingSource, VisitFlow,
    FILING_QUERY,
};
use crate::adapters::postgresql::client::PostgresClient;
use crate::adapters::postgresql::models::{row_to_record, rows_to_records, FilingKey};
use crate::domain::{
    Filing, FilingId, Record, Result, ResultExt, SummaryKind, SummaryRecord, TransactionCategory,
};
use async_trait::async_trait;
use std::sync::Arc;

/// PostgreSQL implementation of [`FilingSource`]
pub struct PostgresFilingSource {
    client: Arc<PostgresClient>,
}

impl PostgresFilingSource {
    /// Create a new adapter
    pub fn new(client: PostgresClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &Arc<PostgresClient> {
        &self.client
    }

    /// Runs a single-row lookup keyed by filing identifier
    async fn lookup(&self, sql: &str, filing_id: &FilingId) -> Result<Option<Record>> {
        let client = self.client.get_connection().await?;
        let stmt = client.prepare_cached(sql).await?;

        let Some(key) = FilingKey::for_param(stmt.params().first(), filing_id) else {
            return Ok(None);
        };

        let row = client.query_opt(&stmt, &[key.as_sql()]).await?;
        row.map(|row| row_to_record(&row, &mut None)).transpose()
    }
}

#[async_trait]
impl FilingSource for PostgresFilingSource {
    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    async fn find_filing(&self, filing_id: &FilingId) -> Result<Option<Filing>> {
        let record = self
            .lookup(FILING_QUERY, filing_id)
            .await
            .with_context(|| format!("Failed to look up filing {filing_id}"))?;
        Ok(record.map(|r| Filing::from_record(filing_id.clone(), &r)))
    }

    async fn find_summary(
        &self,
        filing_id: &FilingId,
        kind: SummaryKind,
    ) -> Result<Option<SummaryRecord>> {
        let record = self
            .lookup(&summary_query(kind), filing_id)
            .await
            .with_context(|| format!("Failed to fetch {kind} summary for filing {filing_id}"))?;
        Ok(record.map(|r| SummaryRecord::from_record(kind, &r)))
    }

    async fn stream_transactions(
        &self,
        filing_id: &FilingId,
        category: TransactionCategory,
        limit: u64,
        batch_size: usize,
        visitor: &mut dyn BatchVisitor,
    ) -> Result<u64> {
        let limit = limit_param(limit)?;
        let max_rows = i32::try_from(batch_size.max(1)).unwrap_or(i32::MAX);

        let mut conn = self.client.get_connection().await?;
        let tx = conn
            .build_transaction()
            .read_only(true)
            .start()
            .await
            .with_context(|| format!("Failed to open cursor for {category}"))?;

        if let Some(timeout_ms) = self.client.statement_timeout_ms() {
            tx.batch_execute(&format!("SET LOCAL statement_timeout = {timeout_ms}"))
                .await?;
        }

        let stmt = tx.prepare_cached(&transactions_query(category)).await?;
        let Some(key) = FilingKey::for_param(stmt.params().first(), filing_id) else {
            return Ok(0);
        };
        let portal = tx.bind(&stmt, &[key.as_sql(), &limit]).await?;

        let mut columns = None;
        let mut total: u64 = 0;
        loop {
            if visitor.is_cancelled() {
                tracing::debug!(
                    filing_id = %filing_id,
                    category = %category,
                    rows = total,
                    "Consumer gone, releasing cursor"
                );
                break;
            }

            let rows = tx
                .query_portal(&portal, max_rows)
                .await
                .with_context(|| format!("Failed to fetch {category} after {total} rows"))?;
            if rows.is_empty() {
                break;
            }

            let fetched = rows.len();
            let batch = rows_to_records(&rows, &mut columns)?;
            drop(rows);
            total += fetched as u64;

            if visitor.visit(batch).await? == VisitFlow::Stop || fetched < batch_size {
                break;
            }
        }

        // Dropping the transaction rolls it back; dropping `conn` returns it to the pool
        drop(tx);
        Ok(total)
    }

    fn describe(&self) -> String {
        self.client.redacted_url()
    }
}
