//! Workbook download handler

use crate::adapters::workbook::{ByteChunk, XlsxSink};
use crate::core::export::{download_filename, WORKBOOK_EXTENSION};
use crate::domain::{FilingId, FolioError};
use crate::server::AppState;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::Stream;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Body of every 404
pub const NOT_AVAILABLE: &str = "Filing not available yet";

/// MIME type of XLSX workbooks
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Answers 404 for unknown filings and unmatched paths
pub async fn not_available() -> Response {
    (StatusCode::NOT_FOUND, NOT_AVAILABLE).into_response()
}

/// Extracts the filing identifier from a `{filing_id}.xlsx` path segment
pub fn parse_workbook_path(file: &str) -> Option<FilingId> {
    let raw = file
        .strip_suffix(WORKBOOK_EXTENSION)
        .and_then(|rest| rest.strip_suffix('.'))?;
    FilingId::new(raw).ok()
}

/// `GET {prefix}/{filing_id}.xlsx`
///
/// The filing is resolved before anything is streamed, so an unknown filing is
/// a clean 404. The export then runs in its own task and the response body
/// follows the encoder through a bounded channel; a client that stops reading
/// stalls the export and a client that disconnects cancels it.
pub async fn download_workbook(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Response {
    let Some(filing_id) = parse_workbook_path(&file) else {
        return not_available().await;
    };

    let filing = match state.coordinator.resolve_filing(&filing_id).await {
        Ok(filing) => filing,
        Err(FolioError::NotFound(_)) => {
            tracing::info!(filing_id = %filing_id, "Filing not found");
            return not_available().await;
        }
        Err(e) => {
            crate::log_error_with_context!(e, "Failed to resolve filing");
            return (StatusCode::SERVICE_UNAVAILABLE, "Filing source unavailable").into_response();
        }
    };

    let (mut sink, rx) = XlsxSink::channel(state.stream_buffer_chunks, state.flush_threshold);
    let (filename_tx, filename_rx) = oneshot::channel();
    let coordinator = Arc::clone(&state.coordinator);
    tokio::spawn(async move {
        coordinator.export(&filing, &mut sink, Some(filename_tx)).await;
    });

    let filename = filename_rx
        .await
        .unwrap_or_else(|_| download_filename(&filing_id, ""));

    (
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        Body::from_stream(chunk_stream(rx)),
    )
        .into_response()
}

/// Adapts the encoder channel into a body stream
fn chunk_stream(mut rx: mpsc::Receiver<ByteChunk>) -> impl Stream<Item = ByteChunk> {
    futures::stream::poll_fn(move |cx| rx.poll_recv(cx))
}
