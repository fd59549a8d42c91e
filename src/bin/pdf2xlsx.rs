//! CLI binary for pdf2xlsx.
//!
//! A thin shim over the library crate: each subcommand loads its inputs,
//! drives one [`WorkflowEngine`] through a transition sequence and writes the
//! downloads to disk.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf2xlsx::messages::state_title;
use pdf2xlsx::pipeline::input;
use pdf2xlsx::{
    Document, Locale, Mode, PipelineError, WorkflowConfig, WorkflowEngine, WorkflowObserver,
    WorkflowState,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Spinner observer using indicatif ─────────────────────────────────────────

/// Shows the localized title of the current state next to a spinner and
/// clears itself once the engine stops.
struct SpinnerObserver {
    bar: ProgressBar,
    locale: Locale,
}

impl SpinnerObserver {
    fn new(locale: Locale) -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        Arc::new(Self { bar, locale })
    }
}

impl WorkflowObserver for SpinnerObserver {
    fn on_transition(&self, _from: &'static str, to: &WorkflowState) {
        if to.is_busy() {
            self.bar.set_message(state_title(self.locale, to));
            self.bar.enable_steady_tick(Duration::from_millis(80));
        } else {
            self.bar.finish_and_clear();
            self.bar.reset();
        }
    }

    fn on_conversion_counted(&self, total: u64) {
        self.bar
            .println(dim(&format!("  {total} conversions so far")));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract the table of one PDF into invoice.xlsx
  pdf2xlsx convert invoice.pdf

  # Several PDFs are merged (in the given order) before extraction
  pdf2xlsx convert jan.pdf feb.pdf mar.pdf -o q1.xlsx

  # Merge only
  pdf2xlsx merge part1.pdf part2.pdf -o book.pdf

  # Merge, then convert the merged document
  pdf2xlsx merge a.pdf b.pdf --then-convert --xlsx-out table.xlsx

  # Inputs may be URLs
  pdf2xlsx convert https://example.com/report.pdf

  # How many conversions have succeeded on this machine
  pdf2xlsx count

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium (otherwise ./ then the system loader)
  PDF2XLSX_LOCALE         Message language: en or fa
  PDF2XLSX_COUNTER_PATH   Where the conversion counter is stored
"#;

/// Extract tables from PDFs into Excel workbooks, or merge PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2xlsx",
    version,
    about = "Extract tables from PDFs into Excel workbooks using LLMs, and merge PDFs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the table from one PDF, or from several merged in order.
    Convert {
        /// Local PDF paths or HTTP/HTTPS URLs.
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Workbook path. Default: `<input name>.xlsx`, or `merged_files.xlsx`.
        #[arg(short, long, env = "PDF2XLSX_OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Merge two or more PDFs, preserving file and page order.
    Merge {
        /// Local PDF paths or HTTP/HTTPS URLs, in merge order.
        #[arg(required = true, num_args = 2..)]
        inputs: Vec<String>,

        /// Merged PDF path. Default: `merged_files.pdf`.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also extract the table from the merged document.
        #[arg(long)]
        then_convert: bool,

        /// Workbook path when `--then-convert` is set. Default: `merged_files.xlsx`.
        #[arg(long, requires = "then_convert")]
        xlsx_out: Option<PathBuf>,
    },

    /// Print the number of successful conversions.
    Count,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Message language: en, fa.
    #[arg(long, global = true, env = "PDF2XLSX_LOCALE", default_value = "en")]
    locale: Locale,

    /// Worksheet name in the produced workbook.
    #[arg(long, global = true, env = "PDF2XLSX_SHEET_NAME", default_value = "Sheet1")]
    sheet_name: String,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, global = true, env = "PDF2XLSX_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Max LLM output tokens for the table JSON.
    #[arg(long, global = true, env = "PDF2XLSX_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "PDF2XLSX_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Table inference timeout in seconds.
    #[arg(long, global = true, env = "PDF2XLSX_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, global = true, env = "PDF2XLSX_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Conversion counter file.
    #[arg(long, global = true, env = "PDF2XLSX_COUNTER_PATH")]
    counter_path: Option<PathBuf>,

    /// Disable the spinner.
    #[arg(long, global = true, env = "PDF2XLSX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2XLSX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF2XLSX_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let common = &cli.common;

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives the feedback that matters; library INFO logs would
    // tear through it.
    let show_progress = !common.quiet && !common.no_progress;
    let filter = if common.verbose {
        "debug"
    } else if common.quiet || show_progress {
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

    let config = build_config(common).await?;
    let mut engine =
        WorkflowEngine::from_config(&config).context("Failed to open conversion counter")?;
    if show_progress {
        engine.add_observer(SpinnerObserver::new(config.locale));
    }

    match &cli.command {
        Command::Count => {
            let total = engine
                .counter()
                .get()
                .context("Failed to read conversion counter")?;
            println!("{total}");
        }

        Command::Convert { inputs, output } => {
            let start = Instant::now();
            load_inputs(&mut engine, inputs, &config).await?;
            engine.submit(Mode::Convert).await?;
            let path = write_artifact(&engine, output.as_deref()).await?;
            report(common, &path, start);
        }

        Command::Merge {
            inputs,
            output,
            then_convert,
            xlsx_out,
        } => {
            let start = Instant::now();
            load_inputs(&mut engine, inputs, &config).await?;
            engine.submit(Mode::MergeOnly).await?;
            bail_if_failed(&engine)?;

            let merged = engine.download_merged_document()?;
            let path = output
                .clone()
                .unwrap_or_else(|| PathBuf::from(&merged.file_name));
            write_bytes(&path, &merged.bytes).await?;
            report(common, &path, start);

            if *then_convert {
                let start = Instant::now();
                engine.continue_to_convert().await?;
                let path = write_artifact(&engine, xlsx_out.as_deref()).await?;
                report(common, &path, start);
            }
        }
    }

    Ok(())
}

/// Map CLI args to `WorkflowConfig`.
async fn build_config(common: &CommonArgs) -> Result<WorkflowConfig> {
    let mut builder = WorkflowConfig::builder()
        .locale(common.locale)
        .sheet_name(common.sheet_name.clone())
        .max_tokens(common.max_tokens)
        .temperature(common.temperature)
        .api_timeout_secs(common.api_timeout)
        .download_timeout_secs(common.download_timeout);

    if let Some(ref model) = common.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = common.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref path) = common.counter_path {
        builder = builder.counter_path(path.clone());
    }
    if let Some(ref path) = common.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}

/// Resolve every input in order and hand them to the engine.
async fn load_inputs(engine: &mut WorkflowEngine, inputs: &[String], config: &WorkflowConfig) -> Result<()> {
    let mut documents: Vec<Document> = Vec::with_capacity(inputs.len());
    for raw in inputs {
        let doc = input::resolve_input(raw, config.download_timeout_secs)
            .await
            .with_context(|| format!("Failed to load {}", raw))?;
        documents.push(doc);
    }

    let offered = documents.len();
    let accepted = engine.add_files(documents)?;
    if accepted < offered {
        eprintln!(
            "{} skipped {} non-PDF input(s)",
            dim("·"),
            offered - accepted
        );
    }
    if accepted == 0 {
        bail!("No PDF inputs to process");
    }
    Ok(())
}

/// Write the spreadsheet download to `output`, or to its suggested name.
async fn write_artifact(engine: &WorkflowEngine, output: Option<&Path>) -> Result<PathBuf> {
    bail_if_failed(engine)?;
    let download = engine.download_artifact()?;
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&download.file_name));
    write_bytes(&path, &download.bytes).await?;
    Ok(path)
}

async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Print the localized message of a failed run and exit non-zero.
fn bail_if_failed(engine: &WorkflowEngine) -> Result<()> {
    if let WorkflowState::Failed { error, message } = engine.state() {
        eprintln!("{} {}", red("✘"), bold(message));
        return Err(failure(error));
    }
    Ok(())
}

fn failure(error: &PipelineError) -> anyhow::Error {
    anyhow::Error::new(error.clone()).context(format!("{:?} failure", error.kind()))
}

fn report(common: &CommonArgs, path: &Path, start: Instant) {
    if common.quiet {
        return;
    }
    eprintln!(
        "{}  {}ms  →  {}",
        green("✔"),
        start.elapsed().as_millis(),
        bold(&path.display().to_string()),
    );
}
