//! Conversion engines: the opaque "document → Markdown" collaborator.
//!
//! doc2text does not parse PDF, DOCX or PPTX itself. It delegates to an
//! engine behind the [`MarkdownEngine`] trait, which only has to turn a file
//! on disk into Markdown. Engines are blocking; the orchestration layer runs
//! them on `spawn_blocking` workers.
//!
//! | Engine | Handles |
//! |--------|---------|
//! | [`MarkItDownEngine`] | everything the `markitdown` CLI supports (PDF, Office, EPUB, images, …) |
//! | [`PassthroughEngine`] | text-native files, read as UTF-8 |
//! | [`AutoEngine`] | passthrough for text-native files, MarkItDown for the rest (default) |

use crate::error::ConversionError;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use tracing::debug;

/// Extensions whose content already is (or reads fine as) Markdown text.
pub const TEXT_EXTENSIONS: &[&str] = &[
    "md", "markdown", "txt", "text", "csv", "tsv", "json", "xml", "html", "htm", "log", "rst",
];

/// A blocking document-to-Markdown converter.
///
/// Implementations must be `Send + Sync`: one engine instance is shared by
/// every worker of a batch.
pub trait MarkdownEngine: Send + Sync {
    /// Short identifier used in logs and error messages.
    fn name(&self) -> &str;

    /// Convert the file at `path` to Markdown.
    fn convert_path(&self, path: &Path) -> Result<String, ConversionError>;
}

/// Lower-cased extension of `path`, or `""` if it has none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

/// True when the extension is one [`PassthroughEngine`] reads directly.
pub fn is_text_extension(ext: &str) -> bool {
    TEXT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
}

// ── MarkItDown ───────────────────────────────────────────────────────────────

/// Runs the external `markitdown` command and captures its stdout.
#[derive(Debug, Clone)]
pub struct MarkItDownEngine {
    program: String,
}

impl MarkItDownEngine {
    pub const DEFAULT_PROGRAM: &'static str = "markitdown";

    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for MarkItDownEngine {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROGRAM)
    }
}

impl MarkdownEngine for MarkItDownEngine {
    fn name(&self) -> &str {
        "markitdown"
    }

    fn convert_path(&self, path: &Path) -> Result<String, ConversionError> {
        debug!("Running {} {}", self.program, path.display());
        let output = Command::new(&self.program)
            .arg(path)
            .output()
            .map_err(|e| ConversionError::EngineUnavailable {
                engine: self.name().to_string(),
                detail: format!("failed to run '{}': {e}", self.program),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = last_meaningful_line(&stderr)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} exited with {}", self.program, output.status));
            return Err(ConversionError::EngineFailed {
                engine: self.name().to_string(),
                reason,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Python tracebacks end with the exception line; that is the useful part.
fn last_meaningful_line(stderr: &str) -> Option<&str> {
    stderr.lines().map(str::trim).rev().find(|l| !l.is_empty())
}

// ── Passthrough ──────────────────────────────────────────────────────────────

/// Reads text-native files verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughEngine;

impl MarkdownEngine for PassthroughEngine {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn convert_path(&self, path: &Path) -> Result<String, ConversionError> {
        let ext = extension_of(path);
        if !is_text_extension(&ext) {
            return Err(ConversionError::Unsupported {
                engine: self.name().to_string(),
                extension: ext,
            });
        }
        let bytes = std::fs::read(path).map_err(|e| ConversionError::EngineFailed {
            engine: self.name().to_string(),
            reason: format!("failed to read {}: {e}", path.display()),
        })?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(text.strip_prefix('\u{FEFF}').unwrap_or(text.as_ref()).to_string())
    }
}

// ── Auto ─────────────────────────────────────────────────────────────────────

/// Routes text-native files to [`PassthroughEngine`] and everything else to
/// [`MarkItDownEngine`], so plain Markdown and text inputs work without
/// `markitdown` installed.
#[derive(Debug, Clone, Default)]
pub struct AutoEngine {
    passthrough: PassthroughEngine,
    markitdown: MarkItDownEngine,
}

impl AutoEngine {
    pub fn new(markitdown: MarkItDownEngine) -> Self {
        Self {
            passthrough: PassthroughEngine,
            markitdown,
        }
    }

    fn route(&self, path: &Path) -> &dyn MarkdownEngine {
        if is_text_extension(&extension_of(path)) {
            &self.passthrough
        } else {
            &self.markitdown
        }
    }
}

impl MarkdownEngine for AutoEngine {
    fn name(&self) -> &str {
        "auto"
    }

    fn convert_path(&self, path: &Path) -> Result<String, ConversionError> {
        let engine = self.route(path);
        debug!("auto engine routed {} to {}", path.display(), engine.name());
        engine.convert_path(path)
    }
}

/// Which built-in engine to construct when no engine instance is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    Auto,
    MarkItDown,
    Passthrough,
}

impl EngineKind {
    /// Build the engine, using `markitdown_program` wherever MarkItDown is involved.
    pub fn build(self, markitdown_program: &str) -> Arc<dyn MarkdownEngine> {
        match self {
            EngineKind::Auto => Arc::new(AutoEngine::new(MarkItDownEngine::new(markitdown_program))),
            EngineKind::MarkItDown => Arc::new(MarkItDownEngine::new(markitdown_program)),
            EngineKind::Passthrough => Arc::new(PassthroughEngine),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        f.write_all(content).unwrap();
        f
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("a/b/Report.PDF")), "pdf");
        assert_eq!(extension_of(Path::new("README")), "");
    }

    #[test]
    fn test_passthrough_reads_markdown() {
        let f = write_temp(".md", b"\xEF\xBB\xBF# Hello\n");
        let md = PassthroughEngine.convert_path(f.path()).unwrap();
        assert_eq!(md, "# Hello\n");
    }

    #[test]
    fn test_passthrough_rejects_binary_formats() {
        let f = write_temp(".pdf", b"%PDF-1.7");
        let err = PassthroughEngine.convert_path(f.path()).unwrap_err();
        assert_eq!(
            err,
            ConversionError::Unsupported {
                engine: "passthrough".into(),
                extension: "pdf".into()
            }
        );
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        let f = write_temp(".docx", b"PK");
        let engine = MarkItDownEngine::new("definitely-not-a-real-markitdown-binary");
        let err = engine.convert_path(f.path()).unwrap_err();
        assert!(matches!(err, ConversionError::EngineUnavailable { .. }), "got {err:?}");
    }

    #[test]
    fn test_auto_routes_text_without_markitdown() {
        let f = write_temp(".txt", b"plain words");
        let engine = AutoEngine::new(MarkItDownEngine::new("definitely-not-a-real-markitdown-binary"));
        assert_eq!(engine.convert_path(f.path()).unwrap(), "plain words");
    }

    #[test]
    fn test_last_meaningful_line() {
        let tb = "Traceback (most recent call last):\n  File \"x\"\nValueError: bad zip\n\n";
        assert_eq!(last_meaningful_line(tb), Some("ValueError: bad zip"));
        assert_eq!(last_meaningful_line("  \n"), None);
    }
}
