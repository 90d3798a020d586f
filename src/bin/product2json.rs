//! CLI binary for edgequake-product2json.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` / `ExtractionRequest` and prints the result.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_product2json::{
    extract, DocumentInput, ExtractError, ExtractionConfig, ExtractionOutcome,
    ExtractionProgressCallback, ExtractionRequest, PipelineStage, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that shows the current pipeline stage and logs each extracted input.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_stage(&self, stage: PipelineStage) {
        let msg = match stage {
            PipelineStage::Idle => "validating request…",
            PipelineStage::Extracting => "reading documents and page…",
            PipelineStage::Aggregating => "combining text…",
            PipelineStage::Structuring => "waiting for the model…",
            PipelineStage::Validating => "parsing response…",
            PipelineStage::Done => "done",
        };
        self.bar.set_prefix(stage.to_string());
        self.bar.set_message(msg);
    }

    fn on_document_extracted(&self, index: usize, name: &str, chars: usize) {
        self.bar.println(format!(
            "  {} PDF {:>2}  {:<32}  {}",
            green("✓"),
            index + 1,
            name,
            dim(&format!("{chars:>6} chars")),
        ));
    }

    fn on_web_extracted(&self, url: &str, chars: usize) {
        self.bar.println(format!(
            "  {} URL     {:<32}  {}",
            green("✓"),
            url,
            dim(&format!("{chars:>6} chars")),
        ));
    }

    fn on_complete(&self, outcome: &ExtractionOutcome) {
        self.bar.finish_and_clear();
        match outcome {
            ExtractionOutcome::Structured(_) => eprintln!("{} structured record extracted", green("✔")),
            ExtractionOutcome::Fallback(f) => eprintln!("{} {}", yellow("⚠"), f.warning),
        }
    }

    fn on_failed(&self, error: &ExtractError) {
        self.bar.finish_and_clear();
        eprintln!("{} {} failed", red("✘"), error.stage());
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One spec sheet
  product2json --pdf lamp-spec.pdf

  # Several PDFs plus the product page
  product2json --pdf spec.pdf --pdf care.pdf --url https://shop.example/lamp-x

  # Write the record to a file
  product2json --url https://shop.example/lamp-x -o lamp-x.json

  # Include run statistics
  product2json --pdf spec.pdf --stats

OUTPUT:
  The parsed JSON record, or, when the model does not answer with JSON:
    { "raw_output": "<model text>", "warning": "Could not parse as JSON." }

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          API key forwarded to the model call
  PRODUCT2JSON_MODEL      Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium (needed for --pdf)
  RUST_LOG                Log filter (overrides -v / -q)
"#;

/// Extract a structured product record from PDFs and/or a product page.
#[derive(Parser, Debug)]
#[command(
    name = "product2json",
    version,
    about = "Extract structured product data from PDF spec sheets and product pages using LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF document to read (repeatable).
    #[arg(long = "pdf", value_name = "FILE")]
    pdfs: Vec<PathBuf>,

    /// Product page URL.
    #[arg(long)]
    url: Option<String>,

    /// API key for the model provider.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Model ID (e.g. gpt-4, gpt-4.1-mini).
    #[arg(long, env = "PRODUCT2JSON_MODEL", default_value = "gpt-4")]
    model: String,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "PRODUCT2JSON_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max tokens the model may generate.
    #[arg(long, env = "PRODUCT2JSON_MAX_TOKENS", default_value_t = 2048)]
    max_tokens: usize,

    /// Max characters of page text sent to the model.
    #[arg(long, env = "PRODUCT2JSON_WEB_LIMIT", default_value_t = 10_000)]
    web_limit: usize,

    /// Page fetch timeout in seconds.
    #[arg(long, env = "PRODUCT2JSON_FETCH_TIMEOUT", default_value_t = 30)]
    fetch_timeout: u64,

    /// Model call timeout in seconds.
    #[arg(long, env = "PRODUCT2JSON_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// PDFs extracted at once.
    #[arg(short, long, env = "PRODUCT2JSON_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "PRODUCT2JSON_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Write JSON to this file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Single-line JSON.
    #[arg(long)]
    compact: bool,

    /// Wrap the result as { "outcome": ..., "stats": ... }.
    #[arg(long)]
    stats: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PRODUCT2JSON_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build request ────────────────────────────────────────────────────
    let mut request = ExtractionRequest::new(cli.api_key.clone());
    for path in &cli.pdfs {
        let doc = DocumentInput::from_path(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        request = request.document(doc);
    }
    if let Some(ref url) = cli.url {
        request = request.url(url.clone());
    }

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as ProgressCallback)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    // ── Run extraction ───────────────────────────────────────────────────
    let output = extract(request, &config).await.context("Extraction failed")?;

    let json = match (cli.stats, cli.compact) {
        (true, true) => serde_json::to_string(&output),
        (true, false) => serde_json::to_string_pretty(&output),
        (false, true) => serde_json::to_string(&output.outcome),
        (false, false) => serde_json::to_string_pretty(&output.outcome),
    }
    .context("Failed to serialise output")?;

    if let Some(ref path) = cli.output {
        tokio::fs::write(path, format!("{json}\n"))
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !cli.quiet {
            eprintln!("→ {}", path.display());
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{json}").context("Failed to write to stdout")?;
    }

    if !cli.quiet && !show_progress && output.outcome.is_fallback() {
        eprintln!("{} model output was not JSON; raw text returned", yellow("⚠"));
    }
    if !cli.quiet {
        eprintln!(
            "   {} tokens in  /  {} tokens out  —  {}ms total",
            dim(&output.stats.prompt_tokens.to_string()),
            dim(&output.stats.completion_tokens.to_string()),
            output.stats.total_duration_ms,
        );
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .model(cli.model.clone())
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .web_text_limit(cli.web_limit)
        .fetch_timeout_secs(cli.fetch_timeout)
        .api_timeout_secs(cli.api_timeout)
        .concurrency(cli.concurrency);

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
