//! Logging and observability
//!
//! Structured logging through `tracing`: a console layer, an optional JSON
//! file layer with rotation, and a few macros for the export lifecycle.
//!
//! # Example
//!
//! ```no_run
//! use folio::logging::init_logging;
//! use folio::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(filing_id = "1285143", "Export requested");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of an export
///
/// # Example
///
/// ```no_run
/// use folio::log_export_start;
/// use folio::domain::FilingId;
///
/// let filing_id = FilingId::new("1285143").unwrap();
/// log_export_start!(&filing_id);
/// ```
#[macro_export]
macro_rules! log_export_start {
    ($filing_id:expr) => {
        tracing::info!(filing_id = %$filing_id, "Starting export");
    };
}

/// Log the completion of an export
///
/// # Example
///
/// ```no_run
/// use folio::log_export_complete;
/// use std::time::Duration;
///
/// log_export_complete!("1285143", 42u64, Duration::from_secs(3));
/// ```
#[macro_export]
macro_rules! log_export_complete {
    ($filing_id:expr, $rows:expr, $duration:expr) => {
        tracing::info!(
            filing_id = %$filing_id,
            rows = $rows,
            duration_ms = $duration.as_millis() as u64,
            "Export completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use folio::log_error_with_context;
/// use folio::domain::FolioError;
///
/// let error = FolioError::SourceUnavailable("connection refused".to_string());
/// log_error_with_context!(&error, "Failed to stream loans");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
