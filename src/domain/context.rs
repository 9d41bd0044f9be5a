//! Error context extension trait
//!
//! A context extension similar to `anyhow::Context` for `Result<T, FolioError>`.
//! Unlike anyhow, the error keeps its variant: a `SourceUnavailable` error with
//! context is still a `SourceUnavailable` error, so the export failure taxonomy
//! survives the extra message.
//!
//! # Examples
//!
//! ```rust
//! use folio::domain::{FolioError, Result};
//! use folio::domain::context::ResultExt;
//!
//! fn lookup(id: &str) -> Result<()> {
//!     query(id).with_context(|| format!("Failed to look up filing {id}"))
//! }
//! # fn query(_id: &str) -> Result<()> { Ok(()) }
//! ```

use crate::domain::errors::{FolioError, SinkError};
use crate::domain::result::Result;

/// Extension trait for adding context to `Result` types
pub trait ResultExt<T> {
    /// Add context to an error
    ///
    /// The context is evaluated eagerly; use `.with_context()` when building it
    /// is expensive.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static;

    /// Add context to an error using a closure, evaluated only on error
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<FolioError>,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| prepend(e.into(), &context))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: std::fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| {
            let context = f();
            prepend(e.into(), &context)
        })
    }
}

fn prepend(err: FolioError, context: &dyn std::fmt::Display) -> FolioError {
    let wrap = |msg: String| format!("{context}: {msg}");
    match err {
        FolioError::NotFound(m) => FolioError::NotFound(wrap(m)),
        FolioError::SourceUnavailable(m) => FolioError::SourceUnavailable(wrap(m)),
        FolioError::InvalidNumber(m) => FolioError::InvalidNumber(wrap(m)),
        FolioError::InvalidDate(m) => FolioError::InvalidDate(wrap(m)),
        FolioError::Cancelled(m) => FolioError::Cancelled(wrap(m)),
        FolioError::Configuration(m) => FolioError::Configuration(wrap(m)),
        FolioError::Validation(m) => FolioError::Validation(wrap(m)),
        FolioError::Io(m) => FolioError::Io(wrap(m)),
        FolioError::Sink(SinkError::Encoding(m)) => FolioError::Sink(SinkError::Encoding(wrap(m))),
        // Protocol errors carry structured data, keep them as they are
        sink @ FolioError::Sink(_) => sink,
    }
}
