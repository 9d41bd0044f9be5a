//! PostgreSQL integration
//!
//! This module provides the pooled client and the [`FilingSource`]
//! implementation reading filings, summaries and transactions.
//!
//! [`FilingSource`]: crate::adapters::database::FilingSource

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgresFilingSource;
pub use client::PostgresClient;
pub use models::FilingKey;
