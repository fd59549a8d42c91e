//! # pdf2xlsx
//!
//! Turn the table inside a PDF into an Excel workbook, or merge several PDFs
//! into one, through a single explicit workflow state machine.
//!
//! ## Pipeline Overview
//!
//! ```text
//! FileSet (ordered PDFs)
//!  │
//!  ├─ merge     (≥ 2 documents) pdfium copies every page, in order
//!  ├─ extract   pdfium reads page text, page 1 → page N
//!  ├─ infer     one LLM round trip → { headers, rows }
//!  ├─ validate  every row must be as wide as the header row
//!  └─ encode    single-sheet .xlsx workbook
//! ```
//!
//! The [`WorkflowEngine`] owns the [`FileSet`] and exactly one
//! [`WorkflowState`]. Front ends (the bundled `pdf2xlsx` CLI, a web handler,
//! a desktop shell) only call its transition methods and render the state.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2xlsx::{Document, Mode, WorkflowConfig, WorkflowEngine, WorkflowState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let config = WorkflowConfig::default();
//!     let mut engine = WorkflowEngine::from_config(&config)?;
//!
//!     engine.add_files(vec![Document::from_path("invoice.pdf")?])?;
//!     engine.submit(Mode::Convert).await?;
//!
//!     if let WorkflowState::ConversionSucceeded { .. } = engine.state() {
//!         let download = engine.download_artifact()?;
//!         std::fs::write(&download.file_name, &download.bytes)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2xlsx` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod counter;
pub mod engine;
pub mod error;
pub mod fileset;
pub mod messages;
pub mod observer;
pub mod pipeline;
pub mod prompts;
pub mod state;
pub mod table;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConfigError, WorkflowConfig, WorkflowConfigBuilder};
pub use counter::{ConversionCounter, CounterStore, JsonFileCounterStore, MemoryCounterStore};
pub use engine::{Collaborators, WorkflowEngine};
pub use error::{ErrorKind, PipelineError, StoreError, TransitionError};
pub use fileset::{Document, FileSet, PDF_MIME};
pub use messages::Locale;
pub use observer::{NoopObserver, WorkflowObserver};
pub use pipeline::{PdfMerger, SpreadsheetArtifact, SpreadsheetEncoder, TableInference, TextExtractor};
pub use state::{Action, Download, Mode, WorkflowState};
pub use table::Table;
