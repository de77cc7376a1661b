//! Eager (whole-batch) conversion entry points.
//!
//! These functions wait for every file, then return a [`BatchOutput`] in
//! input order. Use [`crate::stream::convert_stream`] instead to receive each
//! file as soon as it finishes.
//!
//! A file that fails to convert never aborts the batch: its
//! [`ConversionError`] is recorded in its [`FileResult`] and the remaining
//! files carry on.

use crate::config::{ConversionConfig, OutputFormat};
use crate::error::{ConversionError, Doc2TextError};
use crate::output::{BatchOutput, BatchStats, FileResult};
use crate::pipeline::engine::MarkdownEngine;
use crate::pipeline::input::{self, InputFile};
use crate::pipeline::{adapter, bundle, sanitize};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert a batch of in-memory files.
///
/// # Errors
/// Returns `Err(Doc2TextError)` only when the batch cannot start:
/// - no inputs
/// - more inputs than `config.max_files`
///
/// Per-file failures are reported in the returned [`BatchOutput`].
pub async fn convert_batch(
    inputs: Vec<InputFile>,
    config: &ConversionConfig,
) -> Result<BatchOutput, Doc2TextError> {
    let total_start = Instant::now();
    check_batch_size(inputs.len(), config)?;

    let total = inputs.len();
    let engine = config.resolve_engine();
    info!(
        "Starting batch: {} file(s), format={}, engine={}",
        total,
        config.format,
        engine.name()
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut files: Vec<FileResult> = stream::iter(
        inputs
            .into_iter()
            .enumerate()
            .map(|(index, file)| spawn_file(Arc::clone(&engine), index, total, file, config)),
    )
    .buffer_unordered(config.concurrency)
    .collect()
    .await;

    files.sort_by_key(|f| f.index);

    let stats = BatchStats::from_results(&files, total_start.elapsed().as_millis() as u64);
    info!(
        "Batch complete: {} succeeded, {} failed out of {} in {}ms",
        stats.succeeded, stats.failed, stats.total_files, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, stats.succeeded);
    }

    Ok(BatchOutput {
        format: config.format,
        files,
        stats,
    })
}

/// Resolve paths, URLs, or `-` and convert them as one batch.
///
/// Inputs are read before any conversion starts; an unreadable input is a
/// fatal error rather than a per-file one, since there are no bytes to report
/// on.
pub async fn convert_paths<S: AsRef<str>>(
    inputs: &[S],
    config: &ConversionConfig,
) -> Result<BatchOutput, Doc2TextError> {
    check_batch_size(inputs.len(), config)?;
    let files = input::resolve_inputs(inputs, config.download_timeout_secs).await?;
    convert_batch(files, config).await
}

/// Convert a batch and write each successful file into `dir`.
///
/// Each file is written atomically (temp file + rename) under its unique
/// delivery name. The full [`BatchOutput`] is returned so callers can report
/// failures.
pub async fn convert_to_dir(
    inputs: Vec<InputFile>,
    dir: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<BatchOutput, Doc2TextError> {
    let output = convert_batch(inputs, config).await?;
    write_outputs(&output, dir.as_ref()).await?;
    Ok(output)
}

/// Write every successful file of `output` into `dir`.
pub async fn write_outputs(output: &BatchOutput, dir: &Path) -> Result<(), Doc2TextError> {
    for (name, file) in bundle::named_successes(output) {
        let path = dir.join(&name);
        bundle::write_atomic(&path, file.content.as_bytes()).await?;
        debug!("Wrote {}", path.display());
    }
    Ok(())
}

/// Synchronous wrapper around [`convert_batch`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_batch_sync(
    inputs: Vec<InputFile>,
    config: &ConversionConfig,
) -> Result<BatchOutput, Doc2TextError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Doc2TextError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_batch(inputs, config))
}

/// Convert one file on the calling thread.
///
/// Blocking: runs the engine directly. Equivalent to a one-file batch
/// without the size check or progress events.
pub fn convert_file(input: &InputFile, config: &ConversionConfig) -> FileResult {
    let engine = config.resolve_engine();
    convert_one(engine.as_ref(), 0, input, config)
}

// ── Internal helpers ─────────────────────────────────────────────────────

pub(crate) fn check_batch_size(count: usize, config: &ConversionConfig) -> Result<(), Doc2TextError> {
    if count == 0 {
        return Err(Doc2TextError::NoInputs);
    }
    match config.max_files {
        Some(max) if count > max => Err(Doc2TextError::TooManyFiles { count, max }),
        _ => Ok(()),
    }
}

/// Run one file on a blocking worker, reporting progress around it.
///
/// A panicking engine is turned into a per-file error.
pub(crate) async fn spawn_file(
    engine: Arc<dyn MarkdownEngine>,
    index: usize,
    total: usize,
    file: InputFile,
    config: &ConversionConfig,
) -> FileResult {
    let cfg = config.clone();
    let name = file.name.clone();
    let engine_name = engine.name().to_string();

    let joined = tokio::task::spawn_blocking(move || {
        if let Some(ref cb) = cfg.progress_callback {
            cb.on_file_start(index, total, &file.name);
        }
        let result = convert_one(engine.as_ref(), index, &file, &cfg);
        if let Some(ref cb) = cfg.progress_callback {
            match &result.error {
                None => cb.on_file_complete(index, total, &result.source_name, result.content.len()),
                Some(e) => cb.on_file_error(index, total, &result.source_name, &e.to_string()),
            }
        }
        result
    })
    .await;

    match joined {
        Ok(result) => result,
        Err(e) => {
            warn!("Worker for {} did not finish: {}", name, e);
            let error = ConversionError::EngineFailed {
                engine: engine_name.clone(),
                reason: format!("worker panicked: {e}"),
            };
            if let Some(ref cb) = config.progress_callback {
                cb.on_file_error(index, total, &name, &error.to_string());
            }
            FileResult {
                index,
                output_name: bundle::output_name(&name, config.format),
                source_name: name,
                content: String::new(),
                engine: engine_name,
                duration_ms: 0,
                error: Some(error),
            }
        }
    }
}

fn convert_one(
    engine: &dyn MarkdownEngine,
    index: usize,
    input: &InputFile,
    config: &ConversionConfig,
) -> FileResult {
    let start = Instant::now();
    let format = config.format;
    let converted = adapter::convert_to_markdown(
        engine,
        &input.bytes,
        &input.name,
        config.scratch_dir.as_deref(),
    )
    .map(|markdown| match format {
        OutputFormat::Markdown => markdown,
        OutputFormat::Text => sanitize::sanitize_with(&markdown, &config.sanitize_options()),
    });

    let (content, error) = match converted {
        Ok(content) => (content, None),
        Err(e) => (String::new(), Some(e)),
    };

    FileResult {
        index,
        source_name: input.name.clone(),
        output_name: bundle::output_name(&input.name, format),
        content,
        engine: engine.name().to_string(),
        duration_ms: start.elapsed().as_millis() as u64,
        error,
    }
}
