//! Upload-service tests.
//!
//! The rejection paths run everywhere: they exercise the router in
//! process via `tower::ServiceExt::oneshot` and never reach pdfium or a
//! model — which is exactly the property under test. The happy-path
//! tests need a pdfium library at runtime and are gated behind
//! `E2E_ENABLED` (with a deterministic model stand-in; no API key).

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use pdf2haircut::server::{router, AppState, ErrorResponse, UploadResponse};
use pdf2haircut::ExtractionConfig;
use tower::ServiceExt;

const BOUNDARY: &str = "test-boundary-7f1a";

/// Build a one-part multipart body by hand.
fn multipart_body(field_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field_name}\"; filename=\"upload.pdf\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(field_name: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload/")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(field_name, content_type, data)))
        .unwrap()
}

fn plain_router() -> axum::Router {
    router(AppState::new(ExtractionConfig::default()))
}

async fn response_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn non_pdf_content_type_is_rejected_with_400() {
    let app = plain_router();
    let response = app
        .oneshot(upload_request("file", "text/plain", b"just some text"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response_json(response).await;
    assert_eq!(body.error, "Only PDF files are allowed.");
}

#[tokio::test]
async fn non_pdf_content_type_wins_even_with_pdf_magic_bytes() {
    // The declared content type is the gate, not the payload. A body that
    // starts with %PDF but is declared text/plain must still get a 400 —
    // and because no pdfium library is loaded in this test, a 400 (rather
    // than a 500 binding failure) also proves extraction was never
    // attempted.
    let app = plain_router();
    let response = app
        .oneshot(upload_request("file", "text/plain", &common::blank_pdf()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response_json(response).await;
    assert_eq!(body.error, "Only PDF files are allowed.");
}

#[tokio::test]
async fn missing_file_field_is_rejected_with_400() {
    let app = plain_router();
    let response = app
        .oneshot(upload_request(
            "document",
            "application/pdf",
            &common::blank_pdf(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = response_json(response).await;
    assert_eq!(body.error, "No file field in upload.");
}

#[tokio::test]
async fn empty_multipart_is_rejected_with_400() {
    let app = plain_router();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload/")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(format!("--{BOUNDARY}--\r\n")))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = plain_router();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response_json(response).await;
    assert_eq!(body["status"], "ok");
}

// ── Happy paths (need libpdfium at runtime) ──────────────────────────────────

#[tokio::test]
async fn upload_returns_schedule_from_deterministic_backend() {
    if !common::e2e_enabled() {
        return;
    }

    let model = common::CountingModel::new(common::TWO_ROW_REPLY);
    let config = ExtractionConfig::builder()
        .backend(model.clone())
        .build()
        .unwrap();
    let app = router(AppState::new(config));

    let pdf = common::text_pdf("Acceptable Collateral Haircut Schedule");
    let response = app
        .oneshot(upload_request("file", "application/pdf", &pdf))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: UploadResponse = response_json(response).await;
    assert_eq!(body.result.len(), 2);
    assert_eq!(body.result[0].asset_class, "U.S. Treasuries T-Bills");
    assert_eq!(model.call_count(), 1);
}

#[tokio::test]
async fn upload_of_textless_pdf_yields_empty_result_not_error() {
    if !common::e2e_enabled() {
        return;
    }

    let model = common::CountingModel::new(common::TWO_ROW_REPLY);
    let config = ExtractionConfig::builder()
        .backend(model.clone())
        .build()
        .unwrap();
    let app = router(AppState::new(config));

    let response = app
        .oneshot(upload_request(
            "file",
            "application/pdf",
            &common::blank_pdf(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: UploadResponse = response_json(response).await;
    assert!(body.result.is_empty());
    assert_eq!(model.call_count(), 0, "no text means no model call");
}
