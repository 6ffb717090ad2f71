//! PDF text extraction: pull per-page plain text via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async
//! contexts. `tokio::task::spawn_blocking` moves the work onto a dedicated
//! thread pool thread designed for blocking operations, preventing the
//! Tokio worker threads from stalling during extraction.
//!
//! ## Per-page failure tolerance
//!
//! A page that fails to yield text (damaged content stream, image-only
//! scan) contributes an empty string rather than aborting the whole
//! document. The model still sees every page that did extract.

use crate::error::HaircutError;
use crate::output::{DocumentMetadata, PageText};
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Bind a pdfium instance.
///
/// Resolution order: `PDFIUM_LIB_PATH`, the working directory,
/// `/opt/pdfium/lib`, then the system library path. pdfium is bound per
/// call — the binding is cheap and the instance is not thread-safe to
/// share.
fn create_pdfium() -> Result<Pdfium, HaircutError> {
    let bindings = if let Ok(dir) = std::env::var("PDFIUM_LIB_PATH") {
        Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))
    } else {
        Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                    "/opt/pdfium/lib",
                ))
            })
            .or_else(|_| Pdfium::bind_to_system_library())
    }
    .map_err(|e| HaircutError::PdfiumBindingFailed(format!("{e}")))?;

    Ok(Pdfium::new(bindings))
}

/// Map a pdfium load failure onto the password/corrupt error split.
fn map_load_error(e: PdfiumError, pdf_path: &Path, password: Option<&str>) -> HaircutError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            HaircutError::WrongPassword {
                path: pdf_path.to_path_buf(),
            }
        } else {
            HaircutError::PasswordRequired {
                path: pdf_path.to_path_buf(),
            }
        }
    } else {
        HaircutError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: err_str,
        }
    }
}

/// Extract the plain text of every page of a PDF.
///
/// Runs inside `spawn_blocking` since pdfium operations are CPU-bound.
///
/// # Returns
/// One [`PageText`] per page, in page order. Pages that fail to extract
/// carry an empty string.
pub async fn extract_pages(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<Vec<PageText>, HaircutError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || extract_pages_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| HaircutError::Internal(format!("Text extraction task panicked: {}", e)))?
}

/// Blocking implementation of page text extraction.
fn extract_pages_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<Vec<PageText>, HaircutError> {
    let pdfium = create_pdfium()?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| map_load_error(e, pdf_path, password))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let mut results = Vec::with_capacity(total_pages);

    for idx in 0..total_pages {
        let text = match pages.get(idx as u16) {
            Ok(page) => match page.text() {
                Ok(t) => t.all(),
                Err(e) => {
                    warn!("Page {} yielded no text: {:?}", idx + 1, e);
                    String::new()
                }
            },
            Err(e) => {
                warn!("Failed to open page {}: {:?}", idx + 1, e);
                String::new()
            }
        };

        debug!("Extracted page {} → {} chars", idx + 1, text.len());
        results.push(PageText { page: idx + 1, text });
    }

    Ok(results)
}

/// Join page texts into one document string, in page order.
pub fn join_pages(pages: &[PageText]) -> String {
    pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract document metadata from a PDF without any model call.
pub async fn extract_metadata(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, HaircutError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || extract_metadata_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| HaircutError::Internal(format!("Metadata task panicked: {}", e)))?
}

/// Blocking implementation of metadata extraction.
fn extract_metadata_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<DocumentMetadata, HaircutError> {
    let pdfium = create_pdfium()?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| map_load_error(e, pdf_path, password))?;

    let metadata = document.metadata();
    let pages = document.pages();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    Ok(DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: pages.len() as usize,
        pdf_version: format!("{:?}", document.version()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: usize, text: &str) -> PageText {
        PageText {
            page: n,
            text: text.to_string(),
        }
    }

    #[test]
    fn join_pages_preserves_order() {
        let pages = vec![page(1, "first"), page(2, "second"), page(3, "third")];
        assert_eq!(join_pages(&pages), "first\nsecond\nthird");
    }

    #[test]
    fn join_pages_keeps_empty_page_slots() {
        // An unreadable page contributes an empty line, not an omission.
        let pages = vec![page(1, "first"), page(2, ""), page(3, "third")];
        assert_eq!(join_pages(&pages), "first\n\nthird");
    }

    #[test]
    fn join_pages_of_nothing_is_empty() {
        assert_eq!(join_pages(&[]), "");
    }
}
