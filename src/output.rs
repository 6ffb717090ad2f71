//! Output types: the haircut-schedule records and per-run statistics.
//!
//! [`HaircutEntry`] is the unit of output — one row of a haircut schedule
//! table, keyed by asset class and holding-duration bracket. Everything
//! else here is reporting: which passes ran, how long each phase took,
//! and how many tokens the model consumed.

use crate::error::PassError;
use serde::{Deserialize, Serialize};

/// One row of a haircut schedule.
///
/// All fields are strings by contract: the source tables mix integers,
/// ranges, and annotations ("1%", "0.5", "Years", "Overnight"), and the
/// consumer of this record is JSON, not arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaircutEntry {
    /// Asset class plus description, e.g. "U.S. Treasuries T-Bills".
    pub asset_class: String,
    /// Lower bound of the holding-duration bracket.
    pub valid_from: String,
    /// Upper bound of the holding-duration bracket.
    pub valid_to: String,
    /// Unit of the bracket bounds, e.g. "Years".
    pub duration_unit: String,
    /// Haircut percentage applied in this bracket, e.g. "2%".
    pub value: String,
}

/// Document metadata extracted from the PDF without any model call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// Plain text of one page.
///
/// A page that fails to extract carries an empty `text` — the document
/// as a whole is still processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageText {
    /// Page number, 1-indexed.
    pub page: usize,
    pub text: String,
}

/// Result of a single model pass over the document text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassResult {
    /// Pass number, 1-indexed.
    pub pass: usize,
    /// Entries this pass decoded. Empty when `error` is set.
    pub entries: Vec<HaircutEntry>,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub duration_ms: u64,
    /// Retries consumed before success or giving up.
    pub retries: u8,
    /// Set when the pass failed after all retries.
    pub error: Option<PassError>,
}

/// Statistics for one extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages in the source document.
    pub page_count: usize,
    /// Pages that yielded non-empty text.
    pub pages_with_text: usize,
    /// Characters of document text handed to the model.
    pub document_chars: usize,
    /// Model passes attempted.
    pub passes_run: usize,
    /// Model passes that failed after all retries.
    pub failed_passes: usize,
    /// Entries after cross-pass deduplication.
    pub entries_extracted: usize,
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub text_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Complete output of an extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// The deduplicated haircut schedule, in first-seen order.
    pub entries: Vec<HaircutEntry>,
    /// Per-pass detail, sorted by pass number.
    pub passes: Vec<PassResult>,
    pub metadata: DocumentMetadata,
    pub stats: ExtractionStats,
}

/// Union entries across passes, keeping first-seen order.
///
/// Only exact duplicates (all five fields equal) collapse — two rows that
/// differ in any field are distinct schedule lines, not noise.
pub fn merge_entries(passes: &[PassResult]) -> Vec<HaircutEntry> {
    let mut seen: Vec<HaircutEntry> = Vec::new();
    for pass in passes {
        for entry in &pass.entries {
            if !seen.contains(entry) {
                seen.push(entry.clone());
            }
        }
    }
    seen
}
