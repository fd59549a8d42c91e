//! The workflow state and the actions a front end can attempt.

use crate::error::PipelineError;
use crate::fileset::Document;
use crate::pipeline::SpreadsheetArtifact;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which pipeline a submit runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Extract a table into a spreadsheet. Several files are merged first.
    #[default]
    Convert,
    /// Only merge the files (needs at least two).
    MergeOnly,
}

/// Everything a front end can ask the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    AddFiles,
    RemoveFile,
    Submit,
    ContinueToConvert,
    Retry,
    Reset,
    DownloadArtifact,
    DownloadMergedDocument,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::AddFiles => "add files",
            Action::RemoveFile => "remove a file",
            Action::Submit => "submit",
            Action::ContinueToConvert => "continue to convert",
            Action::Retry => "retry",
            Action::Reset => "reset",
            Action::DownloadArtifact => "download the spreadsheet",
            Action::DownloadMergedDocument => "download the merged PDF",
        };
        f.write_str(s)
    }
}

/// The single current state of a [`crate::WorkflowEngine`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WorkflowState {
    /// Collecting files; nothing running.
    #[default]
    Idle,
    /// The merger is concatenating the file set.
    Merging,
    /// A merge-only run finished; the merged PDF is ready to download.
    MergeSucceeded { merged: Document },
    /// The merged PDF was handed out; converting it is offered next.
    PostMerge { merged: Document },
    /// Extraction, inference and encoding are running.
    Processing,
    /// The spreadsheet is ready. `file_name` has no extension.
    ConversionSucceeded {
        artifact: SpreadsheetArtifact,
        file_name: String,
    },
    /// The last pipeline failed. `message` is localized for display.
    Failed {
        error: PipelineError,
        message: String,
    },
}

impl WorkflowState {
    /// Stable lowercase name, used in logs and transition errors.
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Merging => "merging",
            WorkflowState::MergeSucceeded { .. } => "merge_succeeded",
            WorkflowState::PostMerge { .. } => "post_merge",
            WorkflowState::Processing => "processing",
            WorkflowState::ConversionSucceeded { .. } => "conversion_succeeded",
            WorkflowState::Failed { .. } => "failed",
        }
    }

    /// A pipeline is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, WorkflowState::Merging | WorkflowState::Processing)
    }

    /// Actions with a transition out of this state, ignoring file-count guards.
    pub fn allowed_actions(&self) -> Vec<Action> {
        match self {
            WorkflowState::Idle => vec![
                Action::AddFiles,
                Action::RemoveFile,
                Action::Submit,
                Action::Reset,
            ],
            WorkflowState::Merging | WorkflowState::Processing => vec![Action::Reset],
            WorkflowState::MergeSucceeded { .. } => {
                vec![Action::DownloadMergedDocument, Action::Reset]
            }
            WorkflowState::PostMerge { .. } => vec![
                Action::ContinueToConvert,
                Action::DownloadMergedDocument,
                Action::Reset,
            ],
            WorkflowState::ConversionSucceeded { .. } => {
                vec![Action::DownloadArtifact, Action::Reset]
            }
            WorkflowState::Failed { .. } => vec![Action::Retry, Action::Reset],
        }
    }

    pub fn allows(&self, action: Action) -> bool {
        self.allowed_actions().contains(&action)
    }
}

/// Bytes handed to the user, with the name and type a browser or file
/// system needs.
#[derive(Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for Download {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Download")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
