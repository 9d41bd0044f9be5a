//! Data source factory
//!
//! This module creates the filing source selected by the configuration.

use crate::adapters::database::traits::FilingSource;
use crate::adapters::postgresql::adapter::PostgresFilingSource;
use crate::adapters::postgresql::client::PostgresClient;
use crate::config::{DatabaseConfig, DatabaseDriver};
use crate::domain::Result;
use std::sync::Arc;

/// Create a filing source based on the configured driver
///
/// # Errors
///
/// Returns an error if the connection pool cannot be created
pub fn create_filing_source(config: &DatabaseConfig) -> Result<Arc<dyn FilingSource>> {
    match config.driver {
        DatabaseDriver::Postgres => {
            tracing::info!(database = %config.redacted_url(), "Creating PostgreSQL filing source");
            let client = PostgresClient::new(config.clone())?;
            Ok(Arc::new(PostgresFilingSource::new(client)) as Arc<dyn FilingSource>)
        }
    }
}
