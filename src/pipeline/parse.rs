//! Structured-output decoding: model reply → haircut entries.
//!
//! ## Why is cleanup necessary?
//!
//! Even well-prompted models occasionally introduce artefacts that are
//! *semantically correct* from the model's perspective but *structurally
//! invalid* for a JSON consumer — for example:
//!
//! - Wrapping the array in ` ```json ... ``` ` fences despite the prompt
//!   saying "do not wrap in fences"
//! - Prefacing the array with "Here is the extracted schedule:"
//! - Emitting Windows-style `\r\n` line endings
//!
//! This module applies cheap, deterministic rules before decoding.
//! Keeping them here rather than in the prompt means the prompt stays
//! focused on *what to extract*, not on formatting edge-cases. Each rule
//! is independently testable.

use crate::output::HaircutEntry;
use once_cell::sync::Lazy;
use regex::Regex;

/// Decode a raw model reply into haircut entries.
///
/// Rules (applied in order):
/// 1. Strip outer code fences (models sometimes disobey the prompt)
/// 2. Normalise line endings and trim
/// 3. Decode as a JSON array of five-key objects
/// 4. On failure, salvage the outermost `[...]` slice and decode that
///
/// Returns a human-readable failure detail on the `Err` side; the caller
/// decides whether to retry.
pub fn decode_entries(reply: &str) -> Result<Vec<HaircutEntry>, String> {
    let s = strip_code_fences(reply);
    let s = s.replace("\r\n", "\n");
    let s = s.trim();

    match serde_json::from_str::<Vec<HaircutEntry>>(s) {
        Ok(entries) => Ok(entries),
        Err(direct_err) => match salvage_array(s) {
            Some(slice) => serde_json::from_str::<Vec<HaircutEntry>>(slice)
                .map_err(|e| format!("salvaged array did not decode: {e}")),
            None => Err(format!("no JSON array in reply: {direct_err}")),
        },
    }
}

// ── Rule 1: Strip outer code fences ──────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json)?\s*\n(.*)\n```\s*$").unwrap());

fn strip_code_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 4: Salvage the outermost array ──────────────────────────────────────

/// Slice from the first `[` to the last `]`, if both exist in order.
///
/// Catches replies where the model wrapped the array in prose or in a
/// `{"result": [...]}` envelope.
fn salvage_array(input: &str) -> Option<&str> {
    let start = input.find('[')?;
    let end = input.rfind(']')?;
    if end > start {
        Some(&input[start..=end])
    } else {
        None
    }
}
