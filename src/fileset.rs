//! Input documents and the ordered set the engine works on.

use crate::error::PipelineError;
use crate::pipeline::input;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Declared content type of every document the file set accepts.
pub const PDF_MIME: &str = "application/pdf";

/// An input or merged PDF: raw bytes plus the name and type it was declared with.
///
/// The bytes are never modified after construction.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl Document {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// A document declared as `application/pdf`.
    pub fn pdf(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(name, PDF_MIME, bytes)
    }

    /// Read a local file. The content type is declared from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        input::load_local(path.as_ref())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_pdf(&self) -> bool {
        self.content_type.eq_ignore_ascii_case(PDF_MIME)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Ordered collection of pending documents. Position is identity and merge
/// order is list order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    documents: Vec<Document>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append documents in the given order. Anything not declared as PDF is
    /// dropped. Returns how many were accepted.
    pub fn add(&mut self, documents: impl IntoIterator<Item = Document>) -> usize {
        let before = self.documents.len();
        for doc in documents {
            if doc.is_pdf() {
                self.documents.push(doc);
            } else {
                debug!(
                    "Dropping '{}': content type {} is not {}",
                    doc.name, doc.content_type, PDF_MIME
                );
            }
        }
        self.documents.len() - before
    }

    /// Remove the document at `index`; later documents shift down by one.
    /// Out-of-range indices leave the set unchanged.
    pub fn remove(&mut self, index: usize) -> Option<Document> {
        if index < self.documents.len() {
            Some(self.documents.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.documents.clear();
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Document> {
        self.documents.get(index)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }
}
