//! Upload service: a single-endpoint HTTP wrapper around the extraction
//! pipeline.
//!
//! `POST /upload/` accepts a multipart form with a `file` part. Anything
//! that is not declared `application/pdf` is rejected with 400 before the
//! body is even read into memory — the extraction pipeline is never
//! invoked for non-PDF uploads. On success the response is
//! `{"result": [ ...entries... ]}`; a pipeline failure propagates to the
//! caller as a 500 with the error text.
//!
//! CORS is wide open: the service fronts internal tooling and dashboards
//! on arbitrary origins.

use crate::config::ExtractionConfig;
use crate::extract::extract_from_bytes;
use crate::output::HaircutEntry;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Largest accepted upload. CME collateral publications run to a few MB;
/// 50 MiB leaves generous headroom without inviting abuse.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared state: the extraction configuration every request uses.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ExtractionConfig>,
}

impl AppState {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// Successful upload response.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub result: Vec<HaircutEntry>,
}

/// Error body for every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/upload/", post(handle_upload))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    // Find the `file` part. The content-type gate runs before the part's
    // bytes are read, so a non-PDF upload never reaches the pipeline.
    let mut file_data: Option<(String, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed multipart body: {e}");
                return bad_request("Invalid multipart body.");
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        if field.content_type() != Some("application/pdf") {
            return bad_request("Only PDF files are allowed.");
        }

        let filename = field.file_name().unwrap_or("upload.pdf").to_string();
        match field.bytes().await {
            Ok(bytes) => {
                file_data = Some((filename, bytes.to_vec()));
                break;
            }
            Err(e) => {
                warn!("Failed to read upload bytes: {e}");
                return bad_request("Failed to read file data.");
            }
        }
    }

    let Some((filename, bytes)) = file_data else {
        return bad_request("No file field in upload.");
    };

    info!(filename = %filename, size = bytes.len(), "Processing upload");

    match extract_from_bytes(&bytes, &state.config).await {
        Ok(output) => {
            info!(
                filename = %filename,
                entries = output.entries.len(),
                passes = output.stats.passes_run,
                "Upload processed"
            );
            Json(UploadResponse {
                result: output.entries,
            })
            .into_response()
        }
        Err(e) => {
            warn!(filename = %filename, error = %e, "Extraction failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// Wait for SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Initiating graceful shutdown");
}
