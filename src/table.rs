//! The structured table inferred from document text.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};

/// Column headers plus rows of cells, all as strings, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// Reject tables the encoder must not see: no headers, or a row whose
    /// width differs from the header row.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.headers.is_empty() {
            return Err(PipelineError::MalformedResponse {
                detail: "table has no headers".into(),
            });
        }
        let expected = self.width();
        if let Some((idx, row)) = self
            .rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != expected)
        {
            return Err(PipelineError::MalformedTable {
                row: idx + 1,
                expected,
                found: row.len(),
            });
        }
        Ok(())
    }
}
