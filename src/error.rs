//! Error types for the pdf2xlsx library.
//!
//! Three distinct error types reflect three distinct failure modes:
//!
//! * [`PipelineError`] — a collaborator (pdfium, the LLM, the encoder)
//!   failed while a pipeline was running. The engine never returns it to the
//!   caller; it is classified, stored in [`crate::WorkflowState::Failed`] and
//!   the caller decides whether to retry.
//!
//! * [`TransitionError`] — the caller asked for something the current state
//!   does not allow (submit while busy, merge a single file, download before
//!   success). Returned as `Err` and the state is left untouched.
//!
//! * [`StoreError`] — the conversion counter could not be read or written.

use crate::state::Action;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of every collaborator failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Document bytes could not be read as a PDF.
    Load,
    /// Inference credentials missing or rejected.
    Auth,
    /// Inference endpoint unreachable or timed out.
    Network,
    /// Inference answered, but not with the `{headers, rows}` contract.
    MalformedResponse,
    /// A row is not as wide as the header row.
    MalformedTable,
    /// Anything else.
    Unknown,
}

/// A failed pipeline step.
///
/// `Clone` so the same value can live in the failed state and be handed to
/// observers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    // ── Document errors ───────────────────────────────────────────────────
    /// The document is not a readable PDF.
    #[error("Could not load PDF '{name}': {detail}")]
    Load { name: String, detail: String },

    // ── Inference errors ──────────────────────────────────────────────────
    /// The LLM provider rejected the credentials (401/403, invalid key).
    #[error("Table inference authentication failed: {detail}")]
    Auth { detail: String },

    /// The LLM provider could not be reached in time.
    #[error("Table inference unreachable: {detail}")]
    Network { detail: String },

    /// The LLM answered with something other than `{headers, rows}`.
    #[error("Table inference returned a malformed response: {detail}")]
    MalformedResponse { detail: String },

    // ── Table errors ──────────────────────────────────────────────────────
    /// Row `row` (1-indexed) has `found` cells but the header row has `expected`.
    #[error("Row {row} has {found} cells, expected {expected}")]
    MalformedTable {
        row: usize,
        expected: usize,
        found: usize,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    #[error("Unexpected error: {detail}")]
    Unknown { detail: String },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Load { .. } => ErrorKind::Load,
            PipelineError::Auth { .. } => ErrorKind::Auth,
            PipelineError::Network { .. } => ErrorKind::Network,
            PipelineError::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            PipelineError::MalformedTable { .. } => ErrorKind::MalformedTable,
            PipelineError::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    pub(crate) fn unknown(detail: impl Into<String>) -> Self {
        PipelineError::Unknown {
            detail: detail.into(),
        }
    }
}

/// An action that is illegal in the engine's current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// A pipeline is already running.
    #[error("Cannot {action} while {state}")]
    Busy { action: Action, state: &'static str },

    /// The action has no transition out of the current state.
    #[error("Cannot {action} in state {state}")]
    NotAllowed { action: Action, state: &'static str },

    /// Merging needs at least two documents.
    #[error("Merging needs at least {required} PDF files, {actual} selected")]
    TooFewFiles { required: usize, actual: usize },
}

/// Failure reading or writing the persisted conversion counter.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Counter file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Counter file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not replace counter file: {0}")]
    Persist(#[from] tempfile::PersistError),
}
