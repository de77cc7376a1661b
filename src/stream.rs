//! Streaming conversion API: emit files as they complete.
//!
//! Unlike the eager [`crate::convert::convert_batch`], which returns after
//! every file is done, [`convert_stream`] yields each [`FileResult`] as soon
//! as its worker finishes, so callers can show or save results immediately.
//! Results arrive in completion order; sort by `index` if order matters.

use crate::config::ConversionConfig;
use crate::convert::{check_batch_size, spawn_file};
use crate::error::{ConversionError, Doc2TextError};
use crate::output::FileResult;
use crate::pipeline::input::InputFile;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-file results.
pub type FileStream = Pin<Box<dyn Stream<Item = Result<FileResult, (String, ConversionError)>> + Send>>;

/// Convert files, streaming results as they are ready.
///
/// # Returns
/// - `Ok(FileStream)`: a stream of `Ok(FileResult)` for successes and
///   `Err((filename, error))` for failures
/// - `Err(Doc2TextError)`: the batch is empty or over the file limit
///
/// Batch-level progress events (`on_batch_start`/`on_batch_complete`) are not
/// fired; per-file events are.
///
/// # Example
/// ```rust,no_run
/// use doc2text::{convert_stream, ConversionConfig, InputFile};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let files = vec![InputFile::new("notes.md", std::fs::read("notes.md")?)];
/// let mut stream = convert_stream(files, &ConversionConfig::default())?;
/// while let Some(item) = stream.next().await {
///     match item {
///         Ok(f) => println!("{}: {} chars", f.output_name, f.content.len()),
///         Err((name, e)) => eprintln!("{name}: {e}"),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn convert_stream(
    inputs: Vec<InputFile>,
    config: &ConversionConfig,
) -> Result<FileStream, Doc2TextError> {
    check_batch_size(inputs.len(), config)?;

    let total = inputs.len();
    let engine = config.resolve_engine();
    info!("Starting streaming conversion of {} file(s)", total);

    let concurrency = config.concurrency;
    let config = config.clone();
    let s = stream::iter(inputs.into_iter().enumerate())
        .map(move |(index, file)| {
            let engine = Arc::clone(&engine);
            let cfg = config.clone();
            async move {
                let mut result = spawn_file(engine, index, total, file, &cfg).await;
                match result.error.take() {
                    None => Ok(result),
                    Some(e) => Err((result.source_name, e)),
                }
            }
        })
        .buffer_unordered(concurrency);

    Ok(Box::pin(s))
}
