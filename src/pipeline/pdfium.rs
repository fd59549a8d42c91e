//! Binding to the pdfium shared library.
//!
//! Resolution order: `PDFIUM_LIB_PATH` (path to the library file), then the
//! platform library name in the working directory, then the system loader.
//! Every call binds afresh inside the blocking task that uses it; pdfium keeps
//! thread-local state and the handle must not cross threads.

use crate::error::PipelineError;
use pdfium_render::prelude::*;

pub fn bind() -> Result<Pdfium, PipelineError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(path),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| {
        PipelineError::unknown(format!(
            "Failed to bind to pdfium library: {:?}. Set PDFIUM_LIB_PATH=/path/to/libpdfium",
            e
        ))
    })?;

    Ok(Pdfium::new(bindings))
}

/// Map a pdfium load failure for document `name` to a load error.
pub fn load_error(name: &str, e: PdfiumError) -> PipelineError {
    let detail = format!("{:?}", e);
    let detail = if detail.contains("Password") || detail.contains("password") {
        "document is encrypted and requires a password".to_string()
    } else {
        detail
    };
    PipelineError::Load {
        name: name.to_string(),
        detail,
    }
}
