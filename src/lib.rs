// Folio - Streaming filing workbook export
// Copyright (c) 2025 Folio Contributors
// Licensed under the MIT License

//! # Folio - Streaming filing workbook export
//!
//! Folio turns one campaign finance filing stored in PostgreSQL into a
//! multi-sheet XLSX workbook and streams it to the client while it is being
//! produced, so memory stays flat however large the filing is.
//!
//! ## Overview
//!
//! For each filing, Folio writes:
//! - **Summary sheet**: every summary form found (presidential, PAC, campaign)
//!   rendered as a fixed block with report links and currency amounts
//! - **Category sheets**: contributions, expenditures, independent
//!   expenditures, debts and loans, each sorted by amount descending and capped
//!   at a configurable row limit
//!
//! ## Architecture
//!
//! Folio follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`server`] - HTTP download route
//! - [`core`] - Business logic (formatting, summary rendering, streaming, orchestration)
//! - [`adapters`] - External integrations (PostgreSQL, XLSX encoding)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//! - `testing` - In-memory filing source for tests, behind the `test-util` feature
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use folio::adapters::database::create_filing_source;
//! use folio::config::load_config_from_env;
//! use folio::core::export::{ExportCoordinator, ExportOptions};
//! use folio::server::{create_router, serve, AppState};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config_from_env()?;
//!     let source = create_filing_source(&config.database)?;
//!     let coordinator = Arc::new(ExportCoordinator::new(
//!         source,
//!         ExportOptions::from(&config.export),
//!     ));
//!
//!     let router = create_router(AppState::new(coordinator, &config), &config.server.route_prefix);
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!     serve(router, &config.server.bind_address(), shutdown_rx).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Backpressure and Cancellation
//!
//! The XLSX encoder flushes into a bounded channel feeding the response body.
//! When the client reads slowly the channel fills up, the encoder waits, and
//! the database cursor is not advanced. When the client disconnects the
//! export stops, the cursor transaction is rolled back and its connection
//! goes back to the pool.
//!
//! ## Error Handling
//!
//! Folio uses the [`domain::FolioError`] type for all errors:
//!
//! ```rust,no_run
//! use folio::domain::FolioError;
//!
//! fn example() -> Result<(), FolioError> {
//!     let config = folio::config::load_config("folio.toml")?;
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
pub mod server;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;
