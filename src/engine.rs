//! The workflow engine: one explicit state machine over the file set.
//!
//! ## State graph
//!
//! ```text
//!            submit(convert, 1 file)
//!   Idle ───────────────────────────────▶ Processing ──▶ ConversionSucceeded
//!    │  submit(convert, n>1)                  ▲
//!    ├──────────────────▶ Merging ───────────┘
//!    │  submit(merge_only, n>=2)   │
//!    └──────────────────▶ Merging ─┴──▶ MergeSucceeded ──download──▶ PostMerge
//!                                                                      │
//!                                          continue_to_convert ◀───────┘
//!
//!   any failure ──▶ Failed ──retry──▶ (replays the originating action)
//!   any state   ──reset──▶ Idle
//! ```
//!
//! Every public method is one transition attempt. An attempt the current
//! state does not allow returns a [`TransitionError`] and changes nothing.
//! Collaborator failures never surface as `Err`; they land in
//! [`WorkflowState::Failed`] with a localized message.

use crate::config::WorkflowConfig;
use crate::counter::{ConversionCounter, JsonFileCounterStore};
use crate::error::{PipelineError, StoreError, TransitionError};
use crate::fileset::{Document, FileSet, PDF_MIME};
use crate::messages::{failure_message, Locale};
use crate::observer::SharedObserver;
use crate::pipeline::encode::XlsxEncoder;
use crate::pipeline::extract::{join_pages, PdfiumTextExtractor};
use crate::pipeline::infer::LlmTableInference;
use crate::pipeline::merge::PdfiumMerger;
use crate::pipeline::{PdfMerger, SpreadsheetArtifact, SpreadsheetEncoder, TableInference, TextExtractor};
use crate::state::{Action, Download, Mode, WorkflowState};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Name of the merged document when it feeds the convert pipeline.
pub const MERGED_FOR_CONVERT: &str = "merged.pdf";
/// Name of the merged document produced by a merge-only run.
pub const MERGED_STANDALONE: &str = "merged_files.pdf";
/// Suggested spreadsheet name when the source was a merge result.
pub const MERGED_SUGGESTED_NAME: &str = "merged_files";

const FALLBACK_SUGGESTED_NAME: &str = "converted";

/// The four external capabilities the engine sequences.
#[derive(Clone)]
pub struct Collaborators {
    pub extractor: Arc<dyn TextExtractor>,
    pub inference: Arc<dyn TableInference>,
    pub encoder: Arc<dyn SpreadsheetEncoder>,
    pub merger: Arc<dyn PdfMerger>,
}

impl Collaborators {
    /// pdfium for extraction and merging, the configured LLM for inference,
    /// the OOXML writer for encoding.
    pub fn from_config(config: &WorkflowConfig) -> Self {
        Self {
            extractor: Arc::new(PdfiumTextExtractor),
            inference: Arc::new(LlmTableInference::new(config)),
            encoder: Arc::new(XlsxEncoder::new(config.sheet_name.clone())),
            merger: Arc::new(PdfiumMerger),
        }
    }
}

/// What a retry replays.
#[derive(Debug, Clone)]
enum Origin {
    Submit(Mode),
    Continue(Document),
}

/// Drives a [`FileSet`] through the convert and merge pipelines.
pub struct WorkflowEngine {
    collaborators: Collaborators,
    counter: ConversionCounter,
    locale: Locale,
    files: FileSet,
    state: WorkflowState,
    origin: Option<Origin>,
    observers: Vec<SharedObserver>,
}

impl WorkflowEngine {
    pub fn new(collaborators: Collaborators, counter: ConversionCounter, locale: Locale) -> Self {
        Self {
            collaborators,
            counter,
            locale,
            files: FileSet::new(),
            state: WorkflowState::Idle,
            origin: None,
            observers: Vec::new(),
        }
    }

    /// Production wiring. The counter is file-backed at `config.counter_path`
    /// (or the platform data directory) and read once here, so a corrupt
    /// counter file is reported at start-up rather than after a conversion.
    pub fn from_config(config: &WorkflowConfig) -> Result<Self, StoreError> {
        let path = config
            .counter_path
            .clone()
            .or_else(JsonFileCounterStore::default_path);
        let counter = match path {
            Some(path) => {
                debug!("Conversion counter at {}", path.display());
                ConversionCounter::new(Arc::new(JsonFileCounterStore::new(path)))
            }
            None => {
                warn!("No data directory available; conversion counter is in-memory");
                ConversionCounter::in_memory()
            }
        };
        let total = counter.get()?;
        debug!("{} conversions so far", total);

        Ok(Self::new(
            Collaborators::from_config(config),
            counter,
            config.locale,
        ))
    }

    /// Register an observer for every subsequent transition.
    pub fn add_observer(&mut self, observer: SharedObserver) {
        self.observers.push(observer);
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn files(&self) -> &FileSet {
        &self.files
    }

    pub fn counter(&self) -> &ConversionCounter {
        &self.counter
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Actions the current state has a transition for.
    pub fn allowed_actions(&self) -> Vec<Action> {
        self.state.allowed_actions()
    }

    /// Whether `submit(mode)` would start a pipeline right now, including the
    /// file-count guards. Front ends use this to enable their buttons.
    pub fn can_submit(&self, mode: Mode) -> bool {
        if !self.state.allows(Action::Submit) {
            return false;
        }
        match mode {
            Mode::Convert => !self.files.is_empty(),
            Mode::MergeOnly => self.files.len() >= 2,
        }
    }

    // ── File set ─────────────────────────────────────────────────────────

    /// Append documents; non-PDF documents are dropped. Returns how many
    /// were accepted.
    pub fn add_files(
        &mut self,
        documents: impl IntoIterator<Item = Document>,
    ) -> Result<usize, TransitionError> {
        self.check(Action::AddFiles)?;
        let accepted = self.files.add(documents);
        debug!("Accepted {} files ({} pending)", accepted, self.files.len());
        Ok(accepted)
    }

    /// Remove the document at `index`. Out of range is a no-op (`Ok(None)`).
    pub fn remove_file(&mut self, index: usize) -> Result<Option<Document>, TransitionError> {
        self.check(Action::RemoveFile)?;
        Ok(self.files.remove(index))
    }

    // ── Pipelines ────────────────────────────────────────────────────────

    /// Start the pipeline for `mode` on the current file set.
    ///
    /// Converting an empty file set does nothing. Merging needs at least two
    /// files. Pipeline failures are reported through the state, not `Err`.
    pub async fn submit(&mut self, mode: Mode) -> Result<(), TransitionError> {
        self.check(Action::Submit)?;

        match mode {
            Mode::Convert if self.files.is_empty() => {
                debug!("Convert submitted with no files; nothing to do");
                return Ok(());
            }
            Mode::MergeOnly if self.files.len() < 2 => {
                return Err(TransitionError::TooFewFiles {
                    required: 2,
                    actual: self.files.len(),
                });
            }
            _ => {}
        }

        self.origin = Some(Origin::Submit(mode));
        self.run_submit(mode).await;
        Ok(())
    }

    /// Convert the merged document offered after a merge-only run.
    pub async fn continue_to_convert(&mut self) -> Result<(), TransitionError> {
        self.check(Action::ContinueToConvert)?;
        let merged = match &self.state {
            WorkflowState::PostMerge { merged } => merged.clone(),
            _ => return Err(self.not_allowed(Action::ContinueToConvert)),
        };

        self.origin = Some(Origin::Continue(merged.clone()));
        self.run_convert(merged, MERGED_SUGGESTED_NAME.to_string())
            .await;
        Ok(())
    }

    /// Replay the action that led to the failed state, from file bytes.
    pub async fn retry(&mut self) -> Result<(), TransitionError> {
        self.check(Action::Retry)?;
        let origin = self
            .origin
            .clone()
            .ok_or_else(|| self.not_allowed(Action::Retry))?;

        info!("Retrying after failure");
        match origin {
            Origin::Submit(mode) => self.run_submit(mode).await,
            Origin::Continue(merged) => {
                self.run_convert(merged, MERGED_SUGGESTED_NAME.to_string())
                    .await
            }
        }
        Ok(())
    }

    /// Back to idle from anywhere: files, artifacts and retry origin are dropped.
    pub fn reset(&mut self) {
        self.files.clear();
        self.origin = None;
        if self.state != WorkflowState::Idle {
            self.transition(WorkflowState::Idle);
        }
    }

    // ── Downloads ────────────────────────────────────────────────────────

    /// The spreadsheet, named `<suggested>.xlsx`.
    pub fn download_artifact(&self) -> Result<Download, TransitionError> {
        match &self.state {
            WorkflowState::ConversionSucceeded {
                artifact,
                file_name,
            } => Ok(Download {
                file_name: format!("{}.xlsx", file_name),
                mime_type: artifact.mime_type,
                bytes: artifact.bytes.clone(),
            }),
            _ => Err(self.refusal(Action::DownloadArtifact)),
        }
    }

    /// The merged PDF. The first download after a merge-only run moves the
    /// engine on to offering conversion of the merged document.
    pub fn download_merged_document(&mut self) -> Result<Download, TransitionError> {
        let merged = match &self.state {
            WorkflowState::MergeSucceeded { merged } | WorkflowState::PostMerge { merged } => {
                merged.clone()
            }
            _ => return Err(self.refusal(Action::DownloadMergedDocument)),
        };

        if matches!(self.state, WorkflowState::MergeSucceeded { .. }) {
            self.transition(WorkflowState::PostMerge {
                merged: merged.clone(),
            });
        }

        Ok(Download {
            file_name: merged.name().to_string(),
            mime_type: PDF_MIME,
            bytes: merged.into_bytes(),
        })
    }

    // ── Internals ────────────────────────────────────────────────────────

    async fn run_submit(&mut self, mode: Mode) {
        match mode {
            Mode::MergeOnly => {
                self.transition(WorkflowState::Merging);
                match self.merge_files(MERGED_STANDALONE).await {
                    Ok(merged) => self.transition(WorkflowState::MergeSucceeded { merged }),
                    Err(e) => self.fail(e),
                }
            }
            Mode::Convert => {
                let (source, file_name) = if self.files.len() == 1 {
                    let Some(doc) = self.files.get(0).cloned() else {
                        return;
                    };
                    let name = suggested_file_name(doc.name());
                    (doc, name)
                } else {
                    self.transition(WorkflowState::Merging);
                    match self.merge_files(MERGED_FOR_CONVERT).await {
                        Ok(merged) => (merged, MERGED_SUGGESTED_NAME.to_string()),
                        Err(e) => return self.fail(e),
                    }
                };
                self.run_convert(source, file_name).await;
            }
        }
    }

    async fn merge_files(&self, name: &str) -> Result<Document, PipelineError> {
        let start = Instant::now();
        info!("Merging {} documents", self.files.len());
        let bytes = self.collaborators.merger.merge(self.files.documents()).await?;
        info!("Merge finished in {}ms", start.elapsed().as_millis());
        Ok(Document::pdf(name, bytes))
    }

    async fn run_convert(&mut self, source: Document, file_name: String) {
        self.transition(WorkflowState::Processing);
        match self.convert_document(&source).await {
            Ok(artifact) => {
                self.transition(WorkflowState::ConversionSucceeded {
                    artifact,
                    file_name,
                });
                self.count_conversion();
            }
            Err(e) => self.fail(e),
        }
    }

    /// extract → join → infer → validate → encode, strictly in sequence.
    async fn convert_document(&self, source: &Document) -> Result<SpreadsheetArtifact, PipelineError> {
        let total_start = Instant::now();
        info!("Converting '{}' ({} bytes)", source.name(), source.size());

        let pages = self.collaborators.extractor.extract(source).await?;
        let text = join_pages(&pages);
        debug!("Extracted {} pages, {} chars", pages.len(), text.len());

        let infer_start = Instant::now();
        let table = self.collaborators.inference.infer(&text).await?;
        debug!("Inference took {}ms", infer_start.elapsed().as_millis());

        table.validate()?;
        let artifact = self.collaborators.encoder.encode(&table).await?;

        info!(
            "Converted '{}': {} columns, {} rows in {}ms",
            source.name(),
            table.headers.len(),
            table.rows.len(),
            total_start.elapsed().as_millis()
        );
        Ok(artifact)
    }

    /// A failed write is logged; the conversion itself already succeeded.
    fn count_conversion(&self) {
        match self.counter.increment() {
            Ok(total) => {
                debug!("Conversion count now {}", total);
                for obs in &self.observers {
                    obs.on_conversion_counted(total);
                }
            }
            Err(e) => warn!("Could not persist conversion counter: {}", e),
        }
    }

    fn fail(&mut self, error: PipelineError) {
        let message = failure_message(self.locale, &error);
        warn!("Pipeline failed ({:?}): {}", error.kind(), error);
        for obs in &self.observers {
            obs.on_failure(&error, &message);
        }
        self.transition(WorkflowState::Failed { error, message });
    }

    fn transition(&mut self, next: WorkflowState) {
        let from = self.state.name();
        self.state = next;
        debug!("State: {} → {}", from, self.state.name());
        for obs in &self.observers {
            obs.on_transition(from, &self.state);
        }
    }

    fn check(&self, action: Action) -> Result<(), TransitionError> {
        if self.state.allows(action) {
            Ok(())
        } else {
            Err(self.refusal(action))
        }
    }

    fn refusal(&self, action: Action) -> TransitionError {
        if self.state.is_busy() {
            TransitionError::Busy {
                action,
                state: self.state.name(),
            }
        } else {
            self.not_allowed(action)
        }
    }

    fn not_allowed(&self, action: Action) -> TransitionError {
        TransitionError::NotAllowed {
            action,
            state: self.state.name(),
        }
    }
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("state", &self.state.name())
            .field("files", &self.files.len())
            .field("locale", &self.locale)
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// The source name minus its last extension; `converted` if nothing is left.
pub fn suggested_file_name(source_name: &str) -> String {
    let stem = match source_name.rfind('.') {
        Some(idx) => &source_name[..idx],
        None => source_name,
    };
    if stem.trim().is_empty() {
        FALLBACK_SUGGESTED_NAME.to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggested_name_strips_last_extension() {
        assert_eq!(suggested_file_name("invoice.pdf"), "invoice");
        assert_eq!(suggested_file_name("q3.report.PDF"), "q3.report");
        assert_eq!(suggested_file_name("no_extension"), "no_extension");
    }

    #[test]
    fn suggested_name_falls_back_when_empty() {
        assert_eq!(suggested_file_name(".pdf"), "converted");
        assert_eq!(suggested_file_name(""), "converted");
    }
}
