//! Result types returned by the conversion entry points.
//!
//! A batch never fails because one file failed: each file gets a
//! [`FileResult`] carrying either content or a [`ConversionError`], and the
//! [`BatchOutput`] aggregates them with summary [`BatchStats`].

use crate::config::OutputFormat;
use crate::error::{ConversionError, Doc2TextError};
use serde::{Deserialize, Serialize};

/// Outcome for one input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    /// 0-based position in the input list.
    pub index: usize,
    /// Name the file was submitted under.
    pub source_name: String,
    /// Name the converted content is delivered under (`<stem>.md` / `<stem>.txt`).
    pub output_name: String,
    /// Converted content; empty when `error` is set.
    pub content: String,
    /// Engine that handled the file.
    pub engine: String,
    /// Wall-clock time spent on this file.
    pub duration_ms: u64,
    /// Set when the file failed to convert.
    pub error: Option<ConversionError>,
}

impl FileResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary numbers for a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_files: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Sum of content lengths (bytes) over successful files.
    pub total_chars: usize,
    pub total_duration_ms: u64,
}

impl BatchStats {
    pub fn from_results(files: &[FileResult], total_duration_ms: u64) -> Self {
        let succeeded = files.iter().filter(|f| f.is_success()).count();
        Self {
            total_files: files.len(),
            succeeded,
            failed: files.len() - succeeded,
            total_chars: files
                .iter()
                .filter(|f| f.is_success())
                .map(|f| f.content.len())
                .sum(),
            total_duration_ms,
        }
    }
}

/// Everything a batch produced, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutput {
    pub format: OutputFormat,
    pub files: Vec<FileResult>,
    pub stats: BatchStats,
}

impl BatchOutput {
    /// Successfully converted files.
    pub fn successes(&self) -> impl Iterator<Item = &FileResult> {
        self.files.iter().filter(|f| f.is_success())
    }

    /// `(filename, error)` pairs for every failed file.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &ConversionError)> {
        self.files
            .iter()
            .filter_map(|f| f.error.as_ref().map(|e| (f.source_name.as_str(), e)))
    }

    /// Treat any failed file as an error.
    pub fn into_result(self) -> Result<Self, Doc2TextError> {
        if self.stats.failed > 0 {
            Err(Doc2TextError::PartialFailure {
                succeeded: self.stats.succeeded,
                failed: self.stats.failed,
                total: self.stats.total_files,
            })
        } else {
            Ok(self)
        }
    }
}
