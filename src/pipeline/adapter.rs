//! Conversion adapter: bytes in, Markdown out.
//!
//! ## Why a temp file?
//!
//! Engines such as `markitdown` only accept a file-system path, and they
//! sniff the format from the extension. The adapter stages the bytes in a
//! `NamedTempFile` that carries the original extension, hands its path to
//! the engine, and lets the RAII handle delete the file when the call returns,
//! fails, or unwinds. When a scratch directory is given, the temp file is
//! created inside it so the owner of that directory can remove everything at
//! once (the CLI does this on Ctrl-C).

use crate::error::ConversionError;
use crate::pipeline::engine::MarkdownEngine;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

/// Convert `bytes` to Markdown with `engine`.
///
/// `filename_hint` is only used for its extension. The temporary copy of
/// `bytes` never outlives this call.
pub fn convert_to_markdown(
    engine: &dyn MarkdownEngine,
    bytes: &[u8],
    filename_hint: &str,
    scratch_dir: Option<&Path>,
) -> Result<String, ConversionError> {
    let suffix = suffix_for(filename_hint);
    let mut builder = tempfile::Builder::new();
    builder.prefix("doc2text-").suffix(&suffix);

    let mut tmp = match scratch_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(|e| ConversionError::TempFile {
        detail: e.to_string(),
    })?;

    tmp.write_all(bytes)
        .and_then(|_| tmp.flush())
        .map_err(|e| ConversionError::TempFile {
            detail: e.to_string(),
        })?;

    debug!(
        "Staged {} ({} bytes) at {}",
        filename_hint,
        bytes.len(),
        tmp.path().display()
    );

    let result = engine.convert_path(tmp.path());
    match &result {
        Ok(md) => info!(
            "Converted {} with {} ({} chars)",
            filename_hint,
            engine.name(),
            md.len()
        ),
        Err(e) => warn!("Failed to convert {}: {}", filename_hint, e),
    }

    if let Err(e) = tmp.close() {
        warn!("Failed to remove temp file for {}: {}", filename_hint, e);
    }
    result
}

/// `.ext` of the hint, or an empty suffix when there is none.
fn suffix_for(filename_hint: &str) -> String {
    Path::new(filename_hint)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Records the path it was given and whether the file existed at the time.
    struct RecordingEngine {
        seen: Mutex<Option<(PathBuf, String)>>,
        fail: bool,
    }

    impl RecordingEngine {
        fn new(fail: bool) -> Self {
            Self {
                seen: Mutex::new(None),
                fail,
            }
        }
    }

    impl MarkdownEngine for RecordingEngine {
        fn name(&self) -> &str {
            "recording"
        }

        fn convert_path(&self, path: &Path) -> Result<String, ConversionError> {
            let content = std::fs::read_to_string(path).unwrap_or_default();
            *self.seen.lock().unwrap() = Some((path.to_path_buf(), content.clone()));
            if self.fail {
                Err(ConversionError::EngineFailed {
                    engine: "recording".into(),
                    reason: "nope".into(),
                })
            } else {
                Ok(content)
            }
        }
    }

    #[test]
    fn test_suffix_for() {
        assert_eq!(suffix_for("slides.final.pptx"), ".pptx");
        assert_eq!(suffix_for("Makefile"), "");
    }

    #[test]
    fn test_temp_file_keeps_extension_and_is_removed() {
        let engine = RecordingEngine::new(false);
        let md = convert_to_markdown(&engine, b"# hi", "notes.md", None).unwrap();
        assert_eq!(md, "# hi");

        let (path, content) = engine.seen.lock().unwrap().clone().unwrap();
        assert_eq!(content, "# hi");
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("md"));
        assert!(!path.exists(), "temp file must be removed after success");
    }

    #[test]
    fn test_temp_file_removed_on_failure() {
        let engine = RecordingEngine::new(true);
        let err = convert_to_markdown(&engine, b"data", "deck.pptx", None).unwrap_err();
        assert!(err.to_string().contains("nope"));

        let (path, _) = engine.seen.lock().unwrap().clone().unwrap();
        assert!(!path.exists(), "temp file must be removed after failure");
    }

    #[test]
    fn test_scratch_dir_is_used_and_left_empty() {
        let scratch = tempfile::tempdir().unwrap();
        let engine = RecordingEngine::new(false);
        convert_to_markdown(&engine, b"x", "a.txt", Some(scratch.path())).unwrap();

        let (path, _) = engine.seen.lock().unwrap().clone().unwrap();
        assert_eq!(path.parent(), Some(scratch.path()));
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_scratch_dir_is_temp_file_error() {
        let engine = RecordingEngine::new(false);
        let err = convert_to_markdown(
            &engine,
            b"x",
            "a.txt",
            Some(Path::new("/definitely/not/a/real/dir")),
        )
        .unwrap_err();
        assert!(matches!(err, ConversionError::TempFile { .. }));
    }
}
