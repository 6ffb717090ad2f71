//! # pdf2haircut
//!
//! Extract CME collateral **haircut schedules** from PDF documents using a
//! hosted LLM.
//!
//! ## Why this crate?
//!
//! CME's acceptable-collateral publications bury their haircut schedules
//! in multi-page, multi-column tables that rule-based PDF table parsers
//! mangle — merged cells, repeated headers, asset classes split across
//! pages. Instead this crate pulls the plain text of every page and lets
//! an LLM read the tables, returning one typed record per schedule row:
//! asset class, validity bracket, duration unit, haircut percentage.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input   resolve local file, URL, or uploaded bytes
//!  ├─ 2. Text    per-page plain text via pdfium (spawn_blocking)
//!  ├─ 3. Model   instruction prompt + document text → hosted LLM
//!  ├─ 4. Decode  strict JSON array of five-key schedule rows
//!  └─ 5. Output  deduplicated entries + per-pass stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2haircut::{extract, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / …
//!     let config = ExtractionConfig::default();
//!     let output = extract("acceptable-collateral.pdf", &config).await?;
//!     println!("{}", serde_json::to_string_pretty(&output.entries)?);
//!     eprintln!("tokens: {} in / {} out",
//!         output.stats.total_prompt_tokens,
//!         output.stats.total_completion_tokens);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `pdf2haircut` binary (clap + anyhow + tracing-subscriber) |
//! | `server` | on      | Enables the `pdf2haircut-server` binary and the [`server`] module (axum) |
//!
//! Disable both when using only the library:
//! ```toml
//! pdf2haircut = { version = "0.1", default-features = false }
//! ```
//!
//! ## Upload Service
//!
//! With the `server` feature, [`server::router`] exposes a single
//! endpoint: `POST /upload/` with a multipart `file` part declared
//! `application/pdf`. Non-PDF uploads are rejected with HTTP 400 before
//! any extraction happens; success returns `{"result": [...]}`.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod prompts;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::{HaircutError, PassError};
pub use extract::{extract, extract_from_bytes, extract_sync, extract_to_file, inspect};
pub use output::{
    DocumentMetadata, ExtractionOutput, ExtractionStats, HaircutEntry, PageText, PassResult,
};
pub use pipeline::llm::{ModelReply, ProviderModel, ScheduleModel};
