//! Input resolution: turn a user-supplied path or URL into a [`Document`].
//!
//! Files whose name does not end in `.pdf` are read but declared as
//! `application/octet-stream`, so the file set drops them the same way a
//! browser file picker with a PDF filter would. Anything declared as PDF must
//! start with the `%PDF` magic; a mislabelled file fails here with a readable
//! message instead of deep inside pdfium.

use crate::error::PipelineError;
use crate::fileset::{Document, PDF_MIME};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

const OCTET_STREAM: &str = "application/octet-stream";
const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a CLI argument: URLs are downloaded, everything else is read from disk.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<Document, PipelineError> {
    if is_url(input) {
        download(input, timeout_secs).await
    } else {
        load_local(Path::new(input))
    }
}

/// Read a local file into a [`Document`].
pub fn load_local(path: &Path) -> Result<Document, PipelineError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut file = std::fs::File::open(path).map_err(|e| {
        let detail = match e.kind() {
            std::io::ErrorKind::NotFound => "file not found".to_string(),
            std::io::ErrorKind::PermissionDenied => "permission denied".to_string(),
            _ => e.to_string(),
        };
        PipelineError::Load {
            name: name.clone(),
            detail,
        }
    })?;

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| PipelineError::Load {
        name: name.clone(),
        detail: e.to_string(),
    })?;

    let content_type = if has_pdf_extension(&name) {
        check_magic(&name, &bytes)?;
        PDF_MIME
    } else {
        OCTET_STREAM
    };

    debug!(
        "Loaded '{}' ({} bytes, {})",
        path.display(),
        bytes.len(),
        content_type
    );
    Ok(Document::new(name, content_type, bytes))
}

/// Download a URL into memory.
pub async fn download(url: &str, timeout_secs: u64) -> Result<Document, PipelineError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| PipelineError::unknown(format!("HTTP client setup failed: {}", e)))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| request_error(url, timeout_secs, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(PipelineError::Load {
            name: url.to_string(),
            detail: format!("HTTP {}", status),
        });
    }

    let name = filename_from_url(url);
    let bytes = response
        .bytes()
        .await
        .map_err(|e| request_error(url, timeout_secs, e))?
        .to_vec();

    check_magic(&name, &bytes)?;
    info!("Downloaded '{}' ({} bytes)", name, bytes.len());
    Ok(Document::pdf(name, bytes))
}

fn request_error(url: &str, timeout_secs: u64, e: reqwest::Error) -> PipelineError {
    if e.is_timeout() {
        PipelineError::Network {
            detail: format!("download of {} timed out after {}s", url, timeout_secs),
        }
    } else if e.is_connect() || e.is_request() || e.is_body() {
        PipelineError::Network {
            detail: format!("{}: {}", url, e),
        }
    } else {
        PipelineError::Load {
            name: url.to_string(),
            detail: e.to_string(),
        }
    }
}

fn check_magic(name: &str, bytes: &[u8]) -> Result<(), PipelineError> {
    if bytes.len() < PDF_MAGIC.len() || &bytes[..PDF_MAGIC.len()] != PDF_MAGIC {
        let head = &bytes[..bytes.len().min(PDF_MAGIC.len())];
        return Err(PipelineError::Load {
            name: name.to_string(),
            detail: format!("not a PDF (starts with {:?})", head),
        });
    }
    Ok(())
}

fn has_pdf_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Last path segment of the URL, or `downloaded.pdf`.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}
