//! File Import
//!
//! Turns uploaded telemetry files into RawRecord-shaped documents, the same
//! shape the store serves. Supported formats:
//! - CSV with a header row naming the telemetry columns
//! - JSON arrays of documents
//!
//! Malformed rows never abort an import: they are skipped and collected as
//! warnings so the operator sees an empty-but-valid result instead of a
//! crashed session.

mod csv_import;
mod json_import;

pub use csv_import::CsvImporter;
pub use json_import::JsonImporter;

use std::path::Path;

use thiserror::Error;

use crate::telemetry::RawRecord;

/// Upper bound on collected warnings; beyond it a summary line is appended.
pub(crate) const MAX_WARNINGS: usize = 100;

/// Errors that abort an import outright (unreadable input, no recognizable
/// structure). Row-level problems are warnings, not errors.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of an import: the shaped records plus what was skipped.
#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub records: Vec<RawRecord>,
    pub rows_failed: usize,
    pub warnings: Vec<String>,
}

impl ImportOutcome {
    pub(crate) fn push_warning(&mut self, warning: String) {
        self.rows_failed += 1;
        if self.warnings.len() < MAX_WARNINGS {
            self.warnings.push(warning);
        } else if self.warnings.len() == MAX_WARNINGS {
            self.warnings.push("... further warnings suppressed".to_string());
        }
    }
}

/// A telemetry file parser yielding store-shaped documents.
pub trait FileImporter: Send + Sync {
    /// Parse file content into records, collecting row-level warnings.
    fn import(&self, content: &str) -> Result<ImportOutcome, ImportError>;
}

/// Import `path`, choosing the parser by file extension.
pub fn import_file(path: &Path) -> Result<ImportOutcome, ImportError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let importer: Box<dyn FileImporter> = match extension.as_str() {
        "csv" => Box::new(CsvImporter::new()),
        "json" => Box::new(JsonImporter),
        other => return Err(ImportError::UnsupportedFile(other.to_string())),
    };

    let content = std::fs::read_to_string(path)?;
    importer.import(&content)
}
