//! Configuration types for haircut-schedule extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`],
//! built via its [`ExtractionConfigBuilder`]. Keeping every knob in one
//! struct makes it trivial to share configs between the CLI and the upload
//! service, and to diff two runs to understand why their outputs differ.

use crate::error::HaircutError;
use crate::pipeline::llm::ScheduleModel;
use std::fmt;
use std::sync::Arc;

/// Configuration for a haircut-schedule extraction.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2haircut::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .passes(4)
///     .model("gemini-2.0-flash")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// LLM model identifier, e.g. "gemini-2.0-flash", "gpt-4.1-nano".
    /// If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic").
    /// If None along with `backend`, the provider is auto-detected from
    /// environment API keys.
    pub provider_name: Option<String>,

    /// Pre-constructed model backend. Takes precedence over
    /// `provider_name`. The seam for deterministic stand-ins in tests.
    pub backend: Option<Arc<dyn ScheduleModel>>,

    /// Sampling temperature for the LLM completion. Default: 0.1.
    ///
    /// Low temperature keeps the model faithful to the numbers actually
    /// printed in the schedule tables. Higher values introduce paraphrase
    /// and invented brackets.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per pass. Default: 4096.
    ///
    /// A full CME acceptable-collateral schedule runs to a few hundred
    /// rows; setting this too low silently truncates the JSON array
    /// mid-entry and the pass is retried as malformed.
    pub max_tokens: usize,

    /// Maximum retry attempts on a transient failure per pass. Default: 3.
    ///
    /// Covers 5xx/timeout errors and replies that do not decode into the
    /// schedule shape — the hosted model occasionally wraps the array in
    /// prose despite the prompt.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff).
    /// Default: 500. Doubles after each attempt: 500 ms → 1 s → 2 s.
    pub retry_backoff_ms: u64,

    /// Number of model passes over the document. Default: 1.
    ///
    /// Complex multi-page schedule tables sometimes come back incomplete
    /// from a single completion. Extra passes issue the identical request
    /// again and union the decoded rows, deduplicating exact matches.
    pub passes: usize,

    /// Maximum passes in flight at once. Default: 4.
    pub concurrency: usize,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Custom instruction prompt. If None, uses the built-in default.
    pub system_prompt: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Per-model-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            backend: None,
            temperature: 0.1,
            max_tokens: 4096,
            max_retries: 3,
            retry_backoff_ms: 500,
            passes: 1,
            concurrency: 4,
            password: None,
            system_prompt: None,
            download_timeout_secs: 120,
            api_timeout_secs: 60,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("backend", &self.backend.as_ref().map(|_| "<dyn ScheduleModel>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("passes", &self.passes)
            .field("concurrency", &self.concurrency)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn backend(mut self, backend: Arc<dyn ScheduleModel>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn passes(mut self, n: usize) -> Self {
        self.config.passes = n.max(1);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, HaircutError> {
        let c = &self.config;
        if c.passes == 0 {
            return Err(HaircutError::InvalidConfig("Passes must be ≥ 1".into()));
        }
        if c.concurrency == 0 {
            return Err(HaircutError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if !(0.0..=2.0).contains(&c.temperature) {
            return Err(HaircutError::InvalidConfig(format!(
                "Temperature must be 0.0–2.0, got {}",
                c.temperature
            )));
        }
        if c.max_tokens == 0 {
            return Err(HaircutError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
