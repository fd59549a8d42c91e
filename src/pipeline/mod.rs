//! Collaborators the workflow engine sequences.
//!
//! Each trait is one external capability; each submodule holds the
//! production implementation. The engine only sees the traits, so tests (and
//! other front ends) swap in their own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ merge ──▶ extract ──▶ infer ──▶ encode
//! (path/URL) (pdfium)  (pdfium)    (LLM)     (xlsx)
//! ```
//!
//! 1. [`input`]   — read a local path or download a URL into a [`Document`]
//! 2. [`merge`]   — append every page of every document, in order; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`extract`] — page text, page 1 to N, also on the blocking pool
//! 4. [`infer`]   — one LLM round trip returning `{headers, rows}`; the only
//!    stage with network I/O besides URL inputs
//! 5. [`encode`]  — write the table as a single-sheet OOXML workbook

pub mod encode;
pub mod extract;
pub mod infer;
pub mod input;
pub mod merge;
pub mod pdfium;

use crate::error::PipelineError;
use crate::fileset::Document;
use crate::table::Table;
use async_trait::async_trait;
use std::fmt;

/// MIME type of the produced workbook.
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Reads the text of a PDF, one string per page, in page order.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, document: &Document) -> Result<Vec<String>, PipelineError>;
}

/// Infers one table from document text.
#[async_trait]
pub trait TableInference: Send + Sync {
    async fn infer(&self, text: &str) -> Result<Table, PipelineError>;
}

/// Encodes a validated table as a downloadable spreadsheet.
#[async_trait]
pub trait SpreadsheetEncoder: Send + Sync {
    async fn encode(&self, table: &Table) -> Result<SpreadsheetArtifact, PipelineError>;
}

/// Concatenates documents into one PDF, preserving document and page order.
#[async_trait]
pub trait PdfMerger: Send + Sync {
    async fn merge(&self, documents: &[Document]) -> Result<Vec<u8>, PipelineError>;
}

/// An encoded spreadsheet and its MIME type.
#[derive(Clone, PartialEq, Eq)]
pub struct SpreadsheetArtifact {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl SpreadsheetArtifact {
    pub fn xlsx(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: XLSX_MIME,
        }
    }
}

impl fmt::Debug for SpreadsheetArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpreadsheetArtifact")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
