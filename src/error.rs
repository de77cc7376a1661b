//! Error types for the doc2text library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Doc2TextError`]: **Fatal**: the run cannot proceed at all (input
//!   missing, too many files, output directory not writable). Returned as
//!   `Err(Doc2TextError)` from the top-level `convert*` functions.
//!
//! * [`ConversionError`]: **Non-fatal**: one file could not be converted
//!   (unsupported or corrupt format, engine missing, temp file not writable)
//!   but every other file in the batch is unaffected. Stored inside
//!   [`crate::output::FileResult`] so callers get `(filename, error)` pairs
//!   instead of losing the whole batch to one bad file.
//!
//! The sanitizer has no error type: it is total.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the doc2text library.
#[derive(Debug, Error)]
pub enum Doc2TextError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a readable file, a URL, or `-`.
    #[error("Invalid input '{input}': {reason}")]
    InvalidInput { input: String, reason: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The batch was empty.
    #[error("No input files given")]
    NoInputs,

    /// The batch exceeds the configured file limit.
    #[error("Too many files: {count} given, at most {max} allowed per run")]
    TooManyFiles { count: usize, max: usize },

    // ── Result errors ─────────────────────────────────────────────────────
    /// Some files converted but at least one failed.
    ///
    /// Returned by [`crate::output::BatchOutput::into_result`] when the
    /// caller wants to treat any file failure as an error.
    #[error("{failed}/{total} files failed to convert")]
    PartialFailure {
        succeeded: usize,
        failed: usize,
        total: usize,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not assemble the ZIP bundle.
    #[error("Failed to build ZIP bundle: {0}")]
    BundleFailed(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single file.
///
/// A conversion failure is terminal for that file in that run; nothing is
/// retried.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ConversionError {
    /// The bytes could not be staged in a temporary file.
    #[error("Conversion failed: could not write temporary file: {detail}")]
    TempFile { detail: String },

    /// The engine could not be started (e.g. `markitdown` not installed).
    #[error("Conversion failed: engine '{engine}' is unavailable: {detail}")]
    EngineUnavailable { engine: String, detail: String },

    /// The engine ran but rejected the document.
    #[error("Conversion failed: {reason}")]
    EngineFailed { engine: String, reason: String },

    /// The engine does not handle this kind of file.
    #[error("Conversion failed: '{extension}' files are not supported by engine '{engine}'")]
    Unsupported { engine: String, extension: String },
}

impl ConversionError {
    /// Name of the engine involved, when there is one.
    pub fn engine(&self) -> Option<&str> {
        match self {
            ConversionError::TempFile { .. } => None,
            ConversionError::EngineUnavailable { engine, .. }
            | ConversionError::EngineFailed { engine, .. }
            | ConversionError::Unsupported { engine, .. } => Some(engine),
        }
    }
}
