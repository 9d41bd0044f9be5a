//! Configuration management for Folio.
//!
//! # Overview
//!
//! Folio reads an optional TOML file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Defaults for every setting
//! - `FOLIO_<SECTION>_<KEY>` overrides and the legacy `DB_*`/`PORT` variables
//! - Validation on load
//!
//! Without a file, the configuration is built from defaults plus the
//! environment.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use folio::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("folio.toml")?;
//! println!("Database: {}", config.database.redacted_url());
//! println!("Row limit: {}", config.export.row_limit);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`ServerConfig`] - Bind address, route prefix, stream buffering
//! - [`DatabaseConfig`] - Connection parameters and pool sizing
//! - [`ExportConfig`] - Row limit, fetch batch size, categories, link style
//! - [`LoggingConfig`] - File logging
//!
//! # Example Configuration
//!
//! ```toml
//! [server]
//! port = 8080
//! route_prefix = "/sheet"
//!
//! [database]
//! driver = "postgres"
//! user = "fec"
//! password = "${FEC_DB_PASSWORD}"
//! host = "localhost"
//! name = "fec"
//!
//! [export]
//! row_limit = 100000
//! categories = ["contributions", "expenditures", "independent-expenditures", "debts", "loans"]
//! link_style = "formula"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load, load_config, load_config_from_env};
pub use schema::{
    ApplicationConfig, DatabaseConfig, DatabaseDriver, ExportConfig, FolioConfig, LoggingConfig,
    ServerConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
