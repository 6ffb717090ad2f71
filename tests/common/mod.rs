//! Shared fixtures for integration tests.
//!
//! PDFs are generated programmatically (xref offsets computed, not
//! hard-coded) so the repository ships no binary fixtures. The model
//! stand-in counts invocations and returns a fixed reply, which keeps
//! every assertion about "the model was / was not called" direct.

#![allow(dead_code)]

use async_trait::async_trait;
use pdf2haircut::{ExtractionConfig, HaircutError, ModelReply, ScheduleModel};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A fixed two-row schedule reply, the shape the hosted model returns.
pub const TWO_ROW_REPLY: &str = r#"[
    {"asset_class": "U.S. Treasuries T-Bills", "valid_from": "0",
     "valid_to": "1", "duration_unit": "Years", "value": "1%"},
    {"asset_class": "U.S. Treasuries TNOTES", "valid_from": "1",
     "valid_to": "2", "duration_unit": "Years", "value": "2%"}
]"#;

/// Deterministic [`ScheduleModel`] stand-in: counts calls, returns a
/// fixed reply.
pub struct CountingModel {
    pub calls: AtomicUsize,
    pub reply: String,
}

impl CountingModel {
    pub fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            reply: reply.to_string(),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScheduleModel for CountingModel {
    async fn complete(
        &self,
        _system: &str,
        _user: &str,
        _config: &ExtractionConfig,
    ) -> Result<ModelReply, HaircutError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ModelReply {
            content: self.reply.clone(),
            prompt_tokens: 100,
            completion_tokens: 50,
        })
    }
}

/// Assemble a PDF from numbered objects, computing the xref table.
fn pdf_from_objects(objects: &[String]) -> Vec<u8> {
    let mut buf: Vec<u8> = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());

    for (i, obj) in objects.iter().enumerate() {
        offsets.push(buf.len());
        buf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, obj).as_bytes());
    }

    let xref_pos = buf.len();
    buf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for off in &offsets {
        buf.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    buf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_pos
        )
        .as_bytes(),
    );
    buf
}

/// A structurally valid single-page PDF with no content stream — no
/// extractable text at all.
pub fn blank_pdf() -> Vec<u8> {
    pdf_from_objects(&[
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>".to_string(),
    ])
}

/// A single-page PDF whose content stream draws `text` in Helvetica.
///
/// `text` must not contain parentheses or backslashes (PDF string
/// escaping is out of scope for a fixture).
pub fn text_pdf(text: &str) -> Vec<u8> {
    assert!(
        !text.contains(['(', ')', '\\']),
        "fixture text must not need PDF string escaping"
    );
    let stream_data = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
    pdf_from_objects(&[
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            stream_data.len(),
            stream_data
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ])
}

/// Skip-with-notice guard for tests that need a pdfium library at runtime.
///
/// Returns true when the test should run. Mirrors the project convention
/// of gating environment-dependent tests behind `E2E_ENABLED`.
pub fn e2e_enabled() -> bool {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 (and provide libpdfium) to run");
        return false;
    }
    true
}
