//! PDF text extraction via pdfium.
//!
//! Pages are read strictly in order on one blocking-pool thread. pdfium
//! shares per-document state across page loads, so pages are never read in
//! parallel.

use crate::error::PipelineError;
use crate::fileset::Document;
use crate::pipeline::{pdfium, TextExtractor};
use async_trait::async_trait;
use tracing::{debug, info};

/// [`TextExtractor`] backed by pdfium's text layer.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumTextExtractor;

#[async_trait]
impl TextExtractor for PdfiumTextExtractor {
    async fn extract(&self, document: &Document) -> Result<Vec<String>, PipelineError> {
        let name = document.name().to_string();
        let bytes = document.bytes().to_vec();

        tokio::task::spawn_blocking(move || extract_blocking(&name, &bytes))
            .await
            .map_err(|e| PipelineError::unknown(format!("Extraction task panicked: {}", e)))?
    }
}

fn extract_blocking(name: &str, bytes: &[u8]) -> Result<Vec<String>, PipelineError> {
    let pdfium = pdfium::bind()?;
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| pdfium::load_error(name, e))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    let mut texts = Vec::with_capacity(total_pages);

    for (idx, page) in pages.iter().enumerate() {
        let text = page.text().map_err(|e| PipelineError::Load {
            name: name.to_string(),
            detail: format!("text layer of page {}: {:?}", idx + 1, e),
        })?;
        let cleaned = normalise_page_text(&text.all());
        debug!("Page {}/{}: {} chars", idx + 1, total_pages, cleaned.len());
        texts.push(cleaned);
    }

    info!("Extracted text of {} pages from '{}'", total_pages, name);
    Ok(texts)
}

/// CRLF → LF and trailing whitespace trimmed per line.
fn normalise_page_text(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Concatenate page texts in order, each followed by a blank line.
pub fn join_pages(pages: &[String]) -> String {
    let mut text = String::with_capacity(pages.iter().map(|p| p.len() + 2).sum());
    for page in pages {
        text.push_str(page);
        text.push_str("\n\n");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_pages_keeps_order_and_separates_with_blank_line() {
        let pages = vec!["first".to_string(), "second".to_string()];
        assert_eq!(join_pages(&pages), "first\n\nsecond\n\n");
    }

    #[test]
    fn join_no_pages_is_empty() {
        assert_eq!(join_pages(&[]), "");
    }

    #[test]
    fn normalise_line_endings_and_trailing_space() {
        assert_eq!(normalise_page_text("a  \r\nb\t\rc"), "a\nb\nc");
    }
}
