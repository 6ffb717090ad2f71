//! Error types for the pdf2haircut library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`HaircutError`] — **Fatal**: the extraction cannot proceed at all
//!   (bad input file, wrong password, provider not configured, every model
//!   pass failed). Returned as `Err(HaircutError)` from the top-level
//!   `extract*` functions.
//!
//! * [`PassError`] — **Non-fatal**: a single model pass failed (transient
//!   API error, reply that would not decode) but other passes are fine.
//!   Stored inside [`crate::output::PassResult`] so callers can inspect
//!   partial success rather than losing the whole extraction to one bad
//!   pass.
//!
//! A page that fails to yield text is not an error at all — it contributes
//! an empty string to the document text and the extraction continues.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2haircut library.
///
/// Pass-level failures use [`PassError`] and are stored in
/// [`crate::output::PassResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum HaircutError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned a non-retryable error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// Every model pass failed after all retries; no schedule produced.
    #[error("All {passes} extraction passes failed after {retries} retries each.\nFirst error: {first_error}")]
    AllPassesFailed {
        passes: usize,
        retries: u32,
        first_error: String,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output JSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium to a standard\n\
location (./, /opt/pdfium/lib, or the system library path).\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single model pass.
///
/// Stored alongside [`crate::output::PassResult`] when a pass fails.
/// The overall extraction continues unless ALL passes fail.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PassError {
    /// LLM call failed after retries.
    #[error("Pass {pass}: LLM call failed after {retries} retries: {detail}")]
    LlmFailed {
        pass: usize,
        retries: u8,
        detail: String,
    },

    /// The model reply never decoded into haircut entries.
    #[error("Pass {pass}: reply did not decode into haircut entries: {detail}")]
    Malformed { pass: usize, detail: String },

    /// LLM call timed out.
    #[error("Pass {pass}: LLM call timed out after {secs}s")]
    Timeout { pass: usize, secs: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_passes_failed_display() {
        let e = HaircutError::AllPassesFailed {
            passes: 4,
            retries: 3,
            first_error: "HTTP 503".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("4 extraction passes"), "got: {msg}");
        assert!(msg.contains("HTTP 503"));
    }

    #[test]
    fn not_a_pdf_display_shows_path() {
        let e = HaircutError::NotAPdf {
            path: PathBuf::from("upload.bin"),
            magic: *b"PK\x03\x04",
        };
        assert!(e.to_string().contains("upload.bin"));
    }

    #[test]
    fn provider_not_configured_display() {
        let e = HaircutError::ProviderNotConfigured {
            provider: "gemini".into(),
            hint: "set GEMINI_API_KEY".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("gemini"));
        assert!(msg.contains("GEMINI_API_KEY"));
    }

    #[test]
    fn pass_error_malformed_display() {
        let e = PassError::Malformed {
            pass: 2,
            detail: "expected value at line 1".into(),
        };
        assert!(e.to_string().contains("Pass 2"));
        assert!(e.to_string().contains("expected value"));
    }

    #[test]
    fn pass_error_timeout_display() {
        let e = PassError::Timeout { pass: 1, secs: 60 };
        assert!(e.to_string().contains("60s"));
    }
}
