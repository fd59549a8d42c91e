//! PDF merging via pdfium.
//!
//! An empty output document receives every page of every input, input by
//! input, page by page. The order given is the order written; nothing is
//! reordered or deduplicated.

use crate::error::PipelineError;
use crate::fileset::Document;
use crate::pipeline::{pdfium, PdfMerger};
use async_trait::async_trait;
use tracing::{debug, info};

/// [`PdfMerger`] that copies pages with pdfium's page import.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumMerger;

#[async_trait]
impl PdfMerger for PdfiumMerger {
    async fn merge(&self, documents: &[Document]) -> Result<Vec<u8>, PipelineError> {
        let inputs: Vec<(String, Vec<u8>)> = documents
            .iter()
            .map(|d| (d.name().to_string(), d.bytes().to_vec()))
            .collect();

        tokio::task::spawn_blocking(move || merge_blocking(&inputs))
            .await
            .map_err(|e| PipelineError::unknown(format!("Merge task panicked: {}", e)))?
    }
}

fn merge_blocking(inputs: &[(String, Vec<u8>)]) -> Result<Vec<u8>, PipelineError> {
    let pdfium = pdfium::bind()?;
    let mut merged = pdfium
        .create_new_pdf()
        .map_err(|e| PipelineError::unknown(format!("Could not create output PDF: {:?}", e)))?;

    for (name, bytes) in inputs {
        let source = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| pdfium::load_error(name, e))?;
        let page_count = source.pages().len();

        merged
            .pages_mut()
            .append(&source)
            .map_err(|e| PipelineError::Load {
                name: name.clone(),
                detail: format!("copying pages failed: {:?}", e),
            })?;

        debug!(
            "Appended {} pages from '{}' (output now {} pages)",
            page_count,
            name,
            merged.pages().len()
        );
    }

    let total_pages = merged.pages().len();
    let bytes = merged
        .save_to_bytes()
        .map_err(|e| PipelineError::unknown(format!("Could not save merged PDF: {:?}", e)))?;

    info!(
        "Merged {} documents into {} pages ({} bytes)",
        inputs.len(),
        total_pages,
        bytes.len()
    );
    Ok(bytes)
}
