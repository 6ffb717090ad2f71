//! Pipeline stages for haircut-schedule extraction.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different text backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ text ──▶ llm ──▶ parse
//! (URL/path) (pdfium) (model)  (JSON decode)
//! ```
//!
//! 1. [`input`] — canonicalise the user-supplied path or URL to a local file
//! 2. [`text`]  — extract per-page plain text; runs in `spawn_blocking`
//!    because pdfium is not async-safe
//! 3. [`llm`]   — drive the model call with retry/backoff; the only stage
//!    with network I/O
//! 4. [`parse`] — deterministic cleanup of the model reply and decoding
//!    into haircut entries

pub mod input;
pub mod llm;
pub mod parse;
pub mod text;
