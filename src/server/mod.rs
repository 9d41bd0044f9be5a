//! HTTP interface
//!
//! One route serves workbooks: `GET {prefix}/{filing_id}.xlsx`. Anything else,
//! and any filing that does not exist, answers `404 Filing not available yet`.

pub mod download;

use crate::config::FolioConfig;
use crate::core::export::ExportCoordinator;
use crate::domain::{FolioError, Result};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Runs exports
    pub coordinator: Arc<ExportCoordinator>,
    /// Encoded chunks buffered between an export and its response body
    pub stream_buffer_chunks: usize,
    /// Encoded bytes accumulated before a chunk is sent
    pub flush_threshold: usize,
}

impl AppState {
    /// Builds the state from a coordinator and the loaded configuration
    pub fn new(coordinator: Arc<ExportCoordinator>, config: &FolioConfig) -> Self {
        Self {
            coordinator,
            stream_buffer_chunks: config.server.stream_buffer_chunks,
            flush_threshold: config.export.flush_threshold_bytes,
        }
    }
}

/// Creates the application router
///
/// `route_prefix` is either empty or starts with `/` without a trailing `/`.
pub fn create_router(state: AppState, route_prefix: &str) -> Router {
    let route = format!("{route_prefix}/{{file}}");
    Router::new()
        .route(&route, get(download::download_workbook))
        .fallback(download::not_available)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves `router` on `bind_address` until `shutdown` flips to `true`
///
/// # Errors
///
/// Returns an I/O error if the address cannot be bound or the server fails.
pub async fn serve(
    router: Router,
    bind_address: &str,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let listener = TcpListener::bind(bind_address).await.map_err(|e| {
        FolioError::Io(format!("Failed to bind {bind_address}: {e}"))
    })?;
    tracing::info!(address = %bind_address, "Server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
            tracing::info!("Shutting down server");
        })
        .await?;

    Ok(())
}
