//! Upload-service binary for pdf2haircut.
//!
//! Binds the axum router from the library's `server` module and serves the
//! single `POST /upload/` endpoint until SIGINT/SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use pdf2haircut::server::{router, shutdown_signal, AppState};
use pdf2haircut::ExtractionConfig;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

/// Serve the haircut-schedule extraction endpoint.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2haircut-server",
    version,
    about = "Upload service: POST /upload/ a CME collateral PDF, get its haircut schedule as JSON"
)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "HAIRCUT_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "HAIRCUT_PORT", default_value_t = 8000)]
    port: u16,

    /// LLM model ID (e.g. gemini-2.0-flash, gpt-4.1-nano).
    #[arg(long, env = "HAIRCUT_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, …
    #[arg(long, env = "HAIRCUT_PROVIDER")]
    provider: Option<String>,

    /// Number of model sweeps per upload; results are unioned.
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

    /// Per-pass LLM call timeout in seconds.
    #[arg(long, env = "HAIRCUT_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pdf2haircut=info,tower_http=debug")),
        )
        .init();

    tracing::info!("Starting upload service");

    let mut builder = ExtractionConfig::builder()
        .passes(cli.passes)
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .max_retries(cli.max_retries)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }

    let config = builder.build().context("Invalid configuration")?;
    let app = router(AppState::new(config));

    let addr = SocketAddr::from((
        cli.host
            .parse::<std::net::IpAddr>()
            .context("Invalid --host address")?,
        cli.port,
    ));
    tracing::info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind listener")?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Upload service stopped");
    Ok(())
}
