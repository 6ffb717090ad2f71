//! Eager (full-document) extraction entry points.
//!
//! The call chain is linear: resolve the input to a local PDF, pull the
//! per-page text, hand the text to the model with the fixed instruction
//! prompt, decode the structured reply. The only fan-out is the optional
//! multi-pass sweep, which issues the identical request several times and
//! unions the rows.

use crate::config::ExtractionConfig;
use crate::error::HaircutError;
use crate::output::{merge_entries, ExtractionOutput, ExtractionStats, DocumentMetadata, PassResult};
use crate::pipeline::llm::{run_pass, ProviderModel, ScheduleModel};
use crate::pipeline::{input, text};
use edgequake_llm::ProviderFactory;
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Extract the haircut schedule from a PDF file or URL.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str` — Local file path or HTTP/HTTPS URL to a PDF
/// * `config` — Extraction configuration
///
/// # Returns
/// `Ok(ExtractionOutput)` on success, even if some passes failed
/// (check `output.stats.failed_passes`). A document with no extractable
/// text yields an empty entry list without any model call.
///
/// # Errors
/// Returns `Err(HaircutError)` only for fatal errors:
/// - File not found / permission denied / not a valid PDF
/// - No model provider configured
/// - All passes failed and no schedule was produced
pub async fn extract(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, HaircutError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting extraction: {}", input_str);

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let pdf_path = resolved.path().to_path_buf();

    // ── Step 2: Extract metadata and page text ───────────────────────────
    let text_start = Instant::now();
    let metadata = text::extract_metadata(&pdf_path, config.password.as_deref()).await?;
    let pages = text::extract_pages(&pdf_path, config.password.as_deref()).await?;
    let text_duration_ms = text_start.elapsed().as_millis() as u64;

    let document_text = text::join_pages(&pages);
    let pages_with_text = pages.iter().filter(|p| !p.text.trim().is_empty()).count();
    info!(
        "Extracted text from {}/{} pages ({} chars) in {}ms",
        pages_with_text,
        metadata.page_count,
        document_text.len(),
        text_duration_ms
    );

    // ── Step 3: Run model passes ─────────────────────────────────────────
    // The model is resolved only when there is text to send — a document
    // with no extractable text yields an empty schedule without needing a
    // configured provider.
    let llm_start = Instant::now();
    let passes = if document_text.trim().is_empty() {
        info!("Document has no extractable text; skipping model call");
        Vec::new()
    } else {
        let model = resolve_model(config)?;
        run_passes(&model, &document_text, config).await
    };
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

    // ── Step 4: Merge entries across passes ──────────────────────────────
    let entries = merge_entries(&passes);
    let failed = passes.iter().filter(|p| p.error.is_some()).count();

    if !passes.is_empty() && failed == passes.len() {
        let first_error = passes
            .iter()
            .find_map(|p| p.error.as_ref())
            .map(|e| format!("{}", e))
            .unwrap_or_else(|| "Unknown error".to_string());

        return Err(HaircutError::AllPassesFailed {
            passes: passes.len(),
            retries: config.max_retries,
            first_error,
        });
    }

    // ── Step 5: Compute stats ────────────────────────────────────────────
    let stats = ExtractionStats {
        page_count: metadata.page_count,
        pages_with_text,
        document_chars: document_text.len(),
        passes_run: passes.len(),
        failed_passes: failed,
        entries_extracted: entries.len(),
        total_prompt_tokens: passes.iter().map(|p| p.prompt_tokens as u64).sum(),
        total_completion_tokens: passes.iter().map(|p| p.completion_tokens as u64).sum(),
        text_duration_ms,
        llm_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Extraction complete: {} entries from {} passes in {}ms",
        entries.len(),
        stats.passes_run,
        stats.total_duration_ms
    );

    Ok(ExtractionOutput {
        entries,
        passes,
        metadata,
        stats,
    })
}

/// Extract the haircut schedule from PDF bytes in memory.
///
/// This avoids the need for the caller to create a temporary file.
/// Internally the library writes `bytes` to a managed [`tempfile`] and
/// cleans it up automatically on return or panic.
///
/// This is the path the upload service takes: the request body never
/// touches a caller-visible file.
pub async fn extract_from_bytes(
    bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, HaircutError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| HaircutError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| HaircutError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `extract` returns
    extract(&path, config).await
}

/// Extract and write the schedule JSON directly to a file.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn extract_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionStats, HaircutError> {
    let output = extract(input_str, config).await?;
    let path = output_path.as_ref();

    let json = serde_json::to_string_pretty(&output.entries)
        .map_err(|e| HaircutError::Internal(format!("serialise entries: {e}")))?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| HaircutError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, format!("{json}\n"))
        .await
        .map_err(|e| HaircutError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| HaircutError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(output.stats)
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    input_str: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, HaircutError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| HaircutError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract(input_str, config))
}

/// Extract PDF metadata without running any model pass.
///
/// Does not require an LLM provider or API key.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, HaircutError> {
    let resolved = input::resolve_input(input_str.as_ref(), 120).await?;
    let pdf_path = resolved.path().to_path_buf();
    text::extract_metadata(&pdf_path, None).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Run the configured number of passes concurrently over the document text.
///
/// An all-whitespace document short-circuits to zero passes — there is
/// nothing to hand the model, and the schedule is empty by construction.
pub(crate) async fn run_passes(
    model: &Arc<dyn ScheduleModel>,
    document_text: &str,
    config: &ExtractionConfig,
) -> Vec<PassResult> {
    if document_text.trim().is_empty() {
        return Vec::new();
    }

    let total_passes = config.passes;
    let mut results: Vec<PassResult> = stream::iter((1..=total_passes).map(|pass_num| {
        let model = Arc::clone(model);
        let config = config.clone();
        let text = document_text.to_string();
        async move { run_pass(&model, pass_num, total_passes, &text, &config).await }
    }))
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    // Sort by pass number for stable reporting
    results.sort_by_key(|p| p.pass);
    results
}

/// Instantiate a named provider with the given model.
fn create_provider_model(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn ScheduleModel>, HaircutError> {
    let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        HaircutError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })?;
    Ok(Arc::new(ProviderModel::new(provider)))
}

/// Default model per provider.
fn default_model_for_provider(provider_name: &str) -> &'static str {
    match provider_name {
        "gemini" | "google" => "gemini-2.0-flash",
        _ => "gpt-4.1-nano",
    }
}

/// Resolve the model backend, from most-specific to least-specific.
///
/// The four-level fallback chain lets library users and CLI users each set
/// exactly as much or as little as they need:
///
/// 1. **Pre-built backend** (`config.backend`) — the caller constructed
///    the model boundary entirely; we use it as-is. This is also the test
///    seam for deterministic stand-ins.
///
/// 2. **Named provider + model** (`config.provider_name`) — the factory
///    reads the corresponding API key (`GEMINI_API_KEY`, etc.) from the
///    environment.
///
/// 3. **Environment pair** (`HAIRCUT_LLM_PROVIDER` + `HAIRCUT_MODEL`) —
///    both set means the execution environment (Makefile, shell script,
///    CI) chose; honoured even when multiple API keys are present.
///
/// 4. **Auto-detection** — Gemini is preferred when `GEMINI_API_KEY` is
///    set (the CME schedule prompt was tuned against Gemini), otherwise
///    the factory scans all known API key variables and picks the first
///    available provider.
fn resolve_model(config: &ExtractionConfig) -> Result<Arc<dyn ScheduleModel>, HaircutError> {
    // 1) User-provided backend takes priority
    if let Some(ref backend) = config.backend {
        return Ok(Arc::clone(backend));
    }

    // 2) Provider name + model
    if let Some(ref name) = config.provider_name {
        let model = config
            .model
            .as_deref()
            .unwrap_or_else(|| default_model_for_provider(name));
        return create_provider_model(name, model);
    }

    // 3) Environment pair
    if let (Ok(prov), Ok(model)) = (
        std::env::var("HAIRCUT_LLM_PROVIDER"),
        std::env::var("HAIRCUT_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider_model(&prov, &model);
        }
    }

    // 4) Prefer Gemini when its key is present
    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.is_empty() {
            let model = config.model.as_deref().unwrap_or("gemini-2.0-flash");
            return create_provider_model("gemini", model);
        }
    }

    let (provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| HaircutError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    debug!("Auto-detected LLM provider from environment");
    Ok(Arc::new(ProviderModel::new(provider)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::llm::ModelReply;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic stand-in: counts invocations, returns fixed JSON.
    struct FixedModel {
        calls: AtomicUsize,
        reply: String,
    }

    impl FixedModel {
        fn new(reply: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: reply.to_string(),
            }
        }
    }

    #[async_trait]
    impl ScheduleModel for FixedModel {
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

    const TWO_ROWS: &str = r#"[
        {"asset_class": "U.S. Treasuries T-Bills", "valid_from": "0",
         "valid_to": "1", "duration_unit": "Years", "value": "1%"},
        {"asset_class": "U.S. Treasuries TNOTES", "valid_from": "1",
         "valid_to": "2", "duration_unit": "Years", "value": "2%"}
    ]"#;

    #[tokio::test]
    async fn empty_document_runs_no_passes() {
        let fixed = Arc::new(FixedModel::new(TWO_ROWS));
        let model: Arc<dyn ScheduleModel> = fixed.clone();
        let config = ExtractionConfig::default();

        let passes = run_passes(&model, "   \n\n  ", &config).await;
        assert!(passes.is_empty());
        assert_eq!(fixed.calls.load(Ordering::SeqCst), 0, "model must not be invoked");
        assert!(merge_entries(&passes).is_empty());
    }

    #[tokio::test]
    async fn deterministic_backend_gives_deterministic_output() {
        let model: Arc<dyn ScheduleModel> = Arc::new(FixedModel::new(TWO_ROWS));
        let config = ExtractionConfig::default();

        let first = merge_entries(&run_passes(&model, "Asset Class ...", &config).await);
        let second = merge_entries(&run_passes(&model, "Asset Class ...", &config).await);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[tokio::test]
    async fn multi_pass_unions_and_dedups() {
        let fixed = Arc::new(FixedModel::new(TWO_ROWS));
        let model: Arc<dyn ScheduleModel> = fixed.clone();
        let config = ExtractionConfig::builder().passes(4).build().unwrap();

        let passes = run_passes(&model, "Asset Class ...", &config).await;
        assert_eq!(passes.len(), 4);
        assert_eq!(fixed.calls.load(Ordering::SeqCst), 4);
        // Identical replies collapse to the two distinct rows.
        assert_eq!(merge_entries(&passes).len(), 2);
        // Sorted by pass number regardless of completion order.
        let order: Vec<usize> = passes.iter().map(|p| p.pass).collect();
        assert_eq!(order, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn empty_reply_array_is_success_with_no_entries() {
        let model: Arc<dyn ScheduleModel> = Arc::new(FixedModel::new("[]"));
        let config = ExtractionConfig::default();

        let passes = run_passes(&model, "No schedules here.", &config).await;
        assert_eq!(passes.len(), 1);
        assert!(passes[0].error.is_none());
        assert!(merge_entries(&passes).is_empty());
    }

    #[test]
    fn default_models_per_provider() {
        assert_eq!(default_model_for_provider("gemini"), "gemini-2.0-flash");
        assert_eq!(default_model_for_provider("openai"), "gpt-4.1-nano");
    }
}
