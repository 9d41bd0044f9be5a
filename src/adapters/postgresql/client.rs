//! PostgreSQL client implementation
//!
//! Owns the connection pool. The pool is built once from [`DatabaseConfig`]
//! and is the only resource shared between concurrent exports.

use crate::config::DatabaseConfig;
use crate::domain::{FolioError, Result};
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod, Runtime};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::NoTls;

/// PostgreSQL client for Folio
pub struct PostgresClient {
    /// Connection pool
    pool: Pool,

    /// Configuration
    config: DatabaseConfig,
}

impl PostgresClient {
    /// Create a new PostgreSQL client
    ///
    /// Connections are opened lazily, so this succeeds without a reachable
    /// server; use [`test_connection`](Self::test_connection) to check.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be created.
    pub fn new(config: DatabaseConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.connection_timeout_seconds);

        let mut pg_config = tokio_postgres::Config::new();
        pg_config
            .user(&config.user)
            .host(&config.host)
            .port(config.port)
            .dbname(&config.name)
            .application_name("folio")
            .connect_timeout(timeout);
        if let Some(password) = &config.password {
            pg_config.password(password.expose_secret().as_ref());
        }

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );

        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .wait_timeout(Some(timeout))
            .create_timeout(Some(timeout))
            .recycle_timeout(Some(timeout))
            .build()
            .map_err(|e| {
                FolioError::Configuration(format!("Failed to create connection pool: {e}"))
            })?;

        tracing::debug!(
            database = %config.redacted_url(),
            max_connections = config.max_connections,
            "PostgreSQL pool created"
        );

        Ok(Self { pool, config })
    }

    /// Test the connection to PostgreSQL
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.get_connection().await?;
        client.query_one("SELECT 1", &[]).await.map_err(|e| {
            FolioError::SourceUnavailable(format!("Connection test failed: {e}"))
        })?;

        tracing::info!(database = %self.redacted_url(), "PostgreSQL connection test successful");
        Ok(())
    }

    /// Get a connection from the pool
    ///
    /// The connection returns to the pool when the [`Object`] is dropped.
    pub async fn get_connection(&self) -> Result<Object> {
        Ok(self.pool.get().await?)
    }

    /// Statement timeout in milliseconds, if one is configured
    pub fn statement_timeout_ms(&self) -> Option<u64> {
        (self.config.statement_timeout_seconds > 0)
            .then(|| self.config.statement_timeout_seconds * 1000)
    }

    /// Connection URL without the password
    pub fn redacted_url(&self) -> String {
        self.config.redacted_url()
    }

    /// Get the pool statistics
    pub fn pool_status(&self) -> deadpool_postgres::Status {
        self.pool.status()
    }
}
