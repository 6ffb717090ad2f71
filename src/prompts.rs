//! Instruction prompts for haircut-schedule extraction.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the extraction behaviour (e.g.
//!    tightening the asset-class naming rule) requires editing exactly one
//!    place.
//!
//! 2. **Testability** — unit tests can inspect prompts directly without a
//!    live model, making prompt regressions easy to catch.
//!
//! Callers can override the default via
//! [`crate::config::ExtractionConfig::system_prompt`]; the constants here
//! are used only when no override is provided.

/// Default instruction prompt for extracting a haircut schedule from
/// document text.
///
/// Used when `ExtractionConfig::system_prompt` is `None`.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a document parser for CME collateral publications. You are given the plain text of a PDF, extracted page by page. The documents describe acceptable collateral and its haircut schedules: tables mapping an asset class and a holding-duration bracket to a risk discount percentage.

Follow these rules precisely:

1. WHAT TO EXTRACT
   - Extract every haircut schedule row in the document.
   - The source tables span multiple pages, sections, and columns; rows
     belonging to one asset class may be split across pages.
   - If an asset class has no haircut schedule in the document, omit that
     asset class entirely. Do not emit rows with empty values.

2. FIELD RULES
   - asset_class: the asset class plus its description, joined in one
     string (e.g. "U.S. Treasuries T-Bills").
   - valid_from / valid_to: the bounds of the holding-duration bracket,
     exactly as printed (e.g. "0" and "1").
   - duration_unit: the unit of the bracket bounds (e.g. "Years").
   - value: the haircut percentage exactly as printed (e.g. "1%").

3. OUTPUT FORMAT
   - Output ONLY a JSON array of objects with exactly these five keys:
     asset_class, valid_from, valid_to, duration_unit, value.
   - Do NOT wrap the array in markdown fences.
   - Do NOT add commentary, explanations, or trailing text.
   - Output [] if the document contains no haircut schedule.

Example output:
[
    {
        "asset_class": "U.S. Treasuries T-Bills",
        "valid_from": "0",
        "valid_to": "1",
        "duration_unit": "Years",
        "value": "1%"
    },
    {
        "asset_class": "U.S. Treasuries TNOTES",
        "valid_from": "1",
        "valid_to": "2",
        "duration_unit": "Years",
        "value": "2%"
    }
]"#;

/// Build the user turn for one extraction pass.
///
/// The document text is fenced in triple quotes so stray braces or
/// prompt-like prose inside the PDF cannot be mistaken for instructions.
pub fn user_prompt(document_text: &str, pass: usize, total_passes: usize) -> String {
    let mut prompt = String::with_capacity(document_text.len() + 256);
    prompt.push_str(
        "Parse the document text below and extract the haircut schedule as JSON. \
         The document has complex tables; read all pages and capture the maximum \
         number of rows.",
    );
    if total_passes > 1 {
        // Identical requests are issued several times and unioned, so each
        // pass is told it is one of several sweeps over the same text.
        prompt.push_str(&format!(
            " This is sweep {pass} of {total_passes} over the same document; \
             rows already reported by another sweep are not wrong to repeat."
        ));
    }
    prompt.push_str("\n\nDocument text:\n\"\"\"\n");
    prompt.push_str(document_text);
    prompt.push_str("\n\"\"\"");
    prompt
}
