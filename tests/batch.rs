//! Batch-level integration tests: error isolation, ordering, delivery.
//!
//! A scripted in-process engine stands in for markitdown so these run
//! without any external tools.

use doc2text::{
    convert_batch, convert_batch_sync, convert_stream, convert_to_dir, zip_bytes, ConversionConfig,
    ConversionError, ConversionProgressCallback, Doc2TextError, InputFile, MarkdownEngine,
    OutputFormat,
};
use futures::StreamExt;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Echoes the staged file back as Markdown, fails on `.bad`, and sleeps on
/// `.slow` so completion order differs from input order.
struct ScriptedEngine;

impl MarkdownEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn convert_path(&self, path: &Path) -> Result<String, ConversionError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("bad") => Err(ConversionError::EngineFailed {
                engine: "scripted".into(),
                reason: "cannot read this file".into(),
            }),
            Some("slow") => {
                std::thread::sleep(Duration::from_millis(150));
                Ok(std::fs::read_to_string(path).unwrap_or_default())
            }
            _ => Ok(std::fs::read_to_string(path).unwrap_or_default()),
        }
    }
}

fn config(format: OutputFormat) -> ConversionConfig {
    ConversionConfig::builder()
        .engine(Arc::new(ScriptedEngine))
        .format(format)
        .concurrency(4)
        .build()
        .unwrap()
}

fn mixed_inputs() -> Vec<InputFile> {
    vec![
        InputFile::new("first.slow", "# First\n\n**one**"),
        InputFile::new("broken.bad", "irrelevant"),
        InputFile::new("third.md", "- item"),
    ]
}

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
    started: AtomicUsize,
}

impl ConversionProgressCallback for RecordingCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.events.lock().unwrap().push(format!("batch_start:{total_files}"));
    }

    fn on_file_start(&self, _index: usize, _total: usize, _name: &str) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn on_file_complete(&self, _index: usize, _total: usize, name: &str, _chars: usize) {
        self.events.lock().unwrap().push(format!("ok:{name}"));
    }

    fn on_file_error(&self, _index: usize, _total: usize, name: &str, error: &str) {
        assert!(error.starts_with("Conversion failed:"));
        self.events.lock().unwrap().push(format!("err:{name}"));
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("batch_complete:{total_files}:{success_count}"));
    }
}

// ── Batch ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_failure_is_isolated_and_order_kept() {
    let output = convert_batch(mixed_inputs(), &config(OutputFormat::Text))
        .await
        .unwrap();

    let names: Vec<&str> = output.files.iter().map(|f| f.source_name.as_str()).collect();
    assert_eq!(names, ["first.slow", "broken.bad", "third.md"]);

    assert_eq!(output.files[0].content, "First\n\none");
    assert_eq!(output.files[0].output_name, "first.txt");
    assert_eq!(output.files[2].content, "item");

    let failures: Vec<_> = output.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "broken.bad");
    assert_eq!(
        failures[0].1.to_string(),
        "Conversion failed: cannot read this file"
    );

    assert_eq!(output.stats.total_files, 3);
    assert_eq!(output.stats.succeeded, 2);
    assert_eq!(output.stats.failed, 1);

    let err = output.into_result().unwrap_err();
    assert!(matches!(
        err,
        Doc2TextError::PartialFailure {
            succeeded: 2,
            failed: 1,
            total: 3
        }
    ));
}

#[tokio::test]
async fn test_markdown_format_is_not_sanitized() {
    let output = convert_batch(
        vec![InputFile::new("a.md", "# Keep **this**")],
        &config(OutputFormat::Markdown),
    )
    .await
    .unwrap();
    assert_eq!(output.files[0].content, "# Keep **this**");
    assert_eq!(output.files[0].output_name, "a.md");
}

#[tokio::test]
async fn test_batch_limits() {
    let cfg = config(OutputFormat::Text);
    assert!(matches!(
        convert_batch(Vec::new(), &cfg).await,
        Err(Doc2TextError::NoInputs)
    ));

    let too_many: Vec<InputFile> = (0..11)
        .map(|i| InputFile::new(format!("f{i}.md"), "x"))
        .collect();
    assert!(matches!(
        convert_batch(too_many, &cfg).await,
        Err(Doc2TextError::TooManyFiles { count: 11, max: 10 })
    ));
}

#[tokio::test]
async fn test_progress_events() {
    let cb = Arc::new(RecordingCallback::default());
    let cfg = ConversionConfig::builder()
        .engine(Arc::new(ScriptedEngine))
        .format(OutputFormat::Text)
        .progress_callback(cb.clone() as Arc<dyn ConversionProgressCallback>)
        .build()
        .unwrap();

    convert_batch(mixed_inputs(), &cfg).await.unwrap();

    let events = cb.events.lock().unwrap().clone();
    assert_eq!(events.first().map(String::as_str), Some("batch_start:3"));
    assert_eq!(events.last().map(String::as_str), Some("batch_complete:3:2"));
    assert!(events.contains(&"ok:first.slow".to_string()));
    assert!(events.contains(&"ok:third.md".to_string()));
    assert!(events.contains(&"err:broken.bad".to_string()));
    assert_eq!(cb.started.load(Ordering::SeqCst), 3);
}

#[test]
fn test_sync_wrapper() {
    let output = convert_batch_sync(
        vec![InputFile::new("notes.md", "## Notes")],
        &config(OutputFormat::Text),
    )
    .unwrap();
    assert_eq!(output.files[0].content, "Notes");
}

// ── Temp files ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_scratch_dir_is_empty_after_batch() {
    let scratch = tempfile::tempdir().unwrap();
    let cfg = ConversionConfig::builder()
        .engine(Arc::new(ScriptedEngine))
        .scratch_dir(scratch.path())
        .build()
        .unwrap();

    convert_batch(mixed_inputs(), &cfg).await.unwrap();

    let leftover: Vec<_> = std::fs::read_dir(scratch.path()).unwrap().collect();
    assert!(leftover.is_empty(), "temp files left behind: {leftover:?}");
}

// ── Delivery ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_convert_to_dir_writes_successes() {
    let out = tempfile::tempdir().unwrap();
    let inputs = vec![
        InputFile::new("report.final.md", "# Report"),
        InputFile::new("report.final.txt", "plain"),
        InputFile::new("broken.bad", "x"),
    ];

    let output = convert_to_dir(inputs, out.path(), &config(OutputFormat::Text))
        .await
        .unwrap();
    assert_eq!(output.stats.succeeded, 2);

    let read = |name: &str| std::fs::read_to_string(out.path().join(name)).unwrap();
    assert_eq!(read("report.final.txt"), "Report");
    assert_eq!(read("report.final-2.txt"), "plain");
    assert!(!out.path().join("broken.txt").exists());
}

#[tokio::test]
async fn test_zip_has_one_entry_per_success() {
    let inputs = vec![
        InputFile::new("a.md", "**A**"),
        InputFile::new("a.html", "<p>B</p>"),
        InputFile::new("c.bad", ""),
    ];
    let output = convert_batch(inputs, &config(OutputFormat::Text))
        .await
        .unwrap();

    let bytes = zip_bytes(&output).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 2);

    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(names, ["a-2.txt", "a.txt"]);

    let mut body = String::new();
    archive.by_name("a-2.txt").unwrap().read_to_string(&mut body).unwrap();
    assert_eq!(body, "B");
}

// ── Streaming ────────────────────────────────────────────────────────────────

#[test]
fn test_stream_yields_every_file() {
    let stream = convert_stream(mixed_inputs(), &config(OutputFormat::Text)).unwrap();

    let items: Vec<_> = tokio_test::block_on(stream.collect());

    assert_eq!(items.len(), 3);
    let mut ok: Vec<String> = items
        .iter()
        .filter_map(|r| r.as_ref().ok().map(|f| f.source_name.clone()))
        .collect();
    ok.sort();
    assert_eq!(ok, ["first.slow", "third.md"]);

    let errs: Vec<&str> = items
        .iter()
        .filter_map(|r| r.as_ref().err().map(|(name, _)| name.as_str()))
        .collect();
    assert_eq!(errs, ["broken.bad"]);
}

#[tokio::test]
async fn test_stream_rejects_empty_batch() {
    assert!(matches!(
        convert_stream(Vec::new(), &config(OutputFormat::Text)),
        Err(Doc2TextError::NoInputs)
    ));
}
