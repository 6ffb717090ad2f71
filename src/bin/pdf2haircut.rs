//! CLI binary for pdf2haircut.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig` and prints the schedule JSON.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2haircut::{extract, extract_to_file, inspect, ExtractionConfig};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic extraction (pretty JSON on stdout)
  pdf2haircut acceptable-collateral-futures-options-select-forwards.pdf

  # Write to a file
  pdf2haircut collateral.pdf -o haircuts.json

  # Four sweeps over the same document, unioned
  pdf2haircut --passes 4 collateral.pdf

  # Use a specific model
  pdf2haircut --provider gemini --model gemini-2.0-flash collateral.pdf

  # Extract from a URL
  pdf2haircut https://www.cmegroup.com/.../collateral.pdf

  # Inspect PDF metadata (no API key needed)
  pdf2haircut --inspect-only collateral.pdf

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (preferred when set)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  HAIRCUT_LLM_PROVIDER    Override provider (gemini, openai, anthropic, …)
  HAIRCUT_MODEL           Override model ID
  PDFIUM_LIB_PATH         Directory containing libpdfium
"#;

/// Extract CME collateral haircut schedules from PDF documents.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2haircut",
    version,
    about = "Extract CME collateral haircut schedules from PDF documents using LLMs",
    long_about = "Extract structured haircut-schedule records (asset class, validity bracket, \
duration unit, percentage) from CME collateral PDF documents. The PDF text is extracted \
page by page and handed to a hosted LLM with a fixed instruction prompt and schema.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write the schedule JSON to this file instead of stdout.
    #[arg(short, long, env = "HAIRCUT_OUTPUT")]
    output: Option<PathBuf>,

    /// LLM model ID (e.g. gemini-2.0-flash, gpt-4.1-nano).
    #[arg(long, env = "HAIRCUT_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, …
    #[arg(long, env = "HAIRCUT_PROVIDER")]
    provider: Option<String>,

    /// Number of model sweeps over the document; results are unioned.
    #[arg(long, env = "HAIRCUT_PASSES", default_value_t = 1)]
    passes: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "HAIRCUT_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Max LLM output tokens per pass.
    #[arg(long, env = "HAIRCUT_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Retries per pass on LLM failure.
    #[arg(long, env = "HAIRCUT_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "HAIRCUT_PASSWORD")]
    password: Option<String>,

    /// Path to a text file containing a custom instruction prompt.
    #[arg(long, env = "HAIRCUT_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Emit compact JSON instead of pretty-printed.
    #[arg(long)]
    compact: bool,

    /// Print extraction stats to stderr.
    #[arg(long)]
    stats: bool,

    /// Print PDF metadata only, no extraction.
    #[arg(long)]
    inspect_only: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "HAIRCUT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-pass LLM call timeout in seconds.
    #[arg(long, env = "HAIRCUT_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "HAIRCUT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the schedule JSON.
    #[arg(short, long, env = "HAIRCUT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input).await.context("Failed to inspect PDF")?;

        println!("File:         {}", cli.input);
        if let Some(ref t) = meta.title {
            println!("Title:        {}", t);
        }
        if let Some(ref a) = meta.author {
            println!("Author:       {}", a);
        }
        if let Some(ref s) = meta.subject {
            println!("Subject:      {}", s);
        }
        println!("Pages:        {}", meta.page_count);
        println!("PDF Version:  {}", meta.pdf_version);
        if let Some(ref p) = meta.producer {
            println!("Producer:     {}", p);
        }
        if let Some(ref c) = meta.creator {
            println!("Creator:      {}", c);
        }
        return Ok(());
    }

    let config = build_config(&cli).await?;

    // One spinner for the whole run: extraction is a single model round
    // trip (or a handful of concurrent sweeps), not a per-page pipeline.
    let spinner = if !cli.quiet {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(format!("Extracting haircut schedule from {}…", cli.input));
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    // ── Run extraction ───────────────────────────────────────────────────
    if let Some(ref output_path) = cli.output {
        let result = extract_to_file(&cli.input, output_path, &config).await;
        if let Some(bar) = spinner {
            bar.finish_and_clear();
        }
        let stats = result.context("Extraction failed")?;

        if !cli.quiet {
            eprintln!(
                "{} entries from {} pages  →  {}",
                stats.entries_extracted,
                stats.page_count,
                output_path.display()
            );
        }
        if cli.stats {
            print_stats(&stats);
        }
    } else {
        let result = extract(&cli.input, &config).await;
        if let Some(bar) = spinner {
            bar.finish_and_clear();
        }
        let output = result.context("Extraction failed")?;

        let json = if cli.compact {
            serde_json::to_string(&output.entries)
        } else {
            serde_json::to_string_pretty(&output.entries)
        }
        .context("Failed to serialise entries")?;

        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(json.as_bytes())
            .context("Failed to write to stdout")?;
        handle.write_all(b"\n").ok();

        if cli.stats {
            print_stats(&output.stats);
        }
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = ExtractionConfig::builder()
        .passes(cli.passes)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .max_retries(cli.max_retries)
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password);
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}

fn print_stats(stats: &pdf2haircut::ExtractionStats) {
    eprintln!(
        "pages: {} ({} with text)  chars: {}  passes: {} ({} failed)",
        stats.page_count,
        stats.pages_with_text,
        stats.document_chars,
        stats.passes_run,
        stats.failed_passes,
    );
    eprintln!(
        "tokens: {} in / {} out  timing: text {}ms, llm {}ms, total {}ms",
        stats.total_prompt_tokens,
        stats.total_completion_tokens,
        stats.text_duration_ms,
        stats.llm_duration_ms,
        stats.total_duration_ms,
    );
}
