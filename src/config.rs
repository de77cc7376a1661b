//! Configuration types for document conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. One struct is shared (cloned) by every
//! worker of a batch, so it holds only cheap, thread-safe values.

use crate::error::Doc2TextError;
use crate::pipeline::engine::{EngineKind, MarkItDownEngine, MarkdownEngine};
use crate::pipeline::sanitize::{Charset, SanitizeOptions};
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for a conversion run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use doc2text::{ConversionConfig, OutputFormat};
///
/// let config = ConversionConfig::builder()
///     .format(OutputFormat::Text)
///     .concurrency(2)
///     .build()
///     .unwrap();
/// assert_eq!(config.format.extension(), ".txt");
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Markdown as produced by the engine, or sanitized plain text. Default: Markdown.
    pub format: OutputFormat,

    /// Built-in engine to use when `engine` is not set. Default: [`EngineKind::Auto`].
    pub engine_kind: EngineKind,

    /// Pre-constructed engine. Takes precedence over `engine_kind`.
    pub engine: Option<Arc<dyn MarkdownEngine>>,

    /// Program invoked by the MarkItDown engine. Default: `markitdown`.
    pub markitdown_program: String,

    /// Files converted at the same time. Default: 4.
    ///
    /// Each conversion blocks a worker thread on an external process, so this
    /// is bounded by cores rather than by network latency.
    pub concurrency: usize,

    /// Maximum files accepted per run; `None` means unlimited. Default: 10.
    pub max_files: Option<usize>,

    /// Letters and digits kept by the sanitizer in [`OutputFormat::Text`]. Default: ASCII.
    pub charset: Charset,

    /// Directory for the adapter's temporary files. Default: system temp dir.
    ///
    /// Point this at a directory you own to be able to clean up everything a
    /// run left behind, e.g. after an interrupt.
    pub scratch_dir: Option<PathBuf>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional progress callback invoked as files are processed.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            engine_kind: EngineKind::default(),
            engine: None,
            markitdown_program: MarkItDownEngine::DEFAULT_PROGRAM.to_string(),
            concurrency: 4,
            max_files: Some(10),
            charset: Charset::default(),
            scratch_dir: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("format", &self.format)
            .field("engine_kind", &self.engine_kind)
            .field("engine", &self.engine.as_ref().map(|e| e.name().to_string()))
            .field("markitdown_program", &self.markitdown_program)
            .field("concurrency", &self.concurrency)
            .field("max_files", &self.max_files)
            .field("charset", &self.charset)
            .field("scratch_dir", &self.scratch_dir)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The engine this config resolves to.
    ///
    /// A pre-built `engine` wins; otherwise `engine_kind` is instantiated with
    /// `markitdown_program`.
    pub fn resolve_engine(&self) -> Arc<dyn MarkdownEngine> {
        match self.engine {
            Some(ref engine) => Arc::clone(engine),
            None => self.engine_kind.build(&self.markitdown_program),
        }
    }

    pub fn sanitize_options(&self) -> SanitizeOptions {
        SanitizeOptions {
            charset: self.charset,
        }
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl fmt::Debug for ConversionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ConversionConfigBuilder {
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn engine_kind(mut self, kind: EngineKind) -> Self {
        self.config.engine_kind = kind;
        self
    }

    pub fn engine(mut self, engine: Arc<dyn MarkdownEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    pub fn markitdown_program(mut self, program: impl Into<String>) -> Self {
        self.config.markitdown_program = program.into();
        self
    }

    /// Must be at least 1; checked by [`build`](Self::build).
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    /// `0` removes the limit.
    pub fn max_files(mut self, n: usize) -> Self {
        self.config.max_files = if n == 0 { None } else { Some(n) };
        self
    }

    pub fn charset(mut self, charset: Charset) -> Self {
        self.config.charset = charset;
        self
    }

    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_dir = Some(dir.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Attach a progress callback that receives per-file events.
    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Doc2TextError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(Doc2TextError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.engine.is_none()
            && c.engine_kind != EngineKind::Passthrough
            && c.markitdown_program.trim().is_empty()
        {
            return Err(Doc2TextError::InvalidConfig(
                "MarkItDown program must not be empty".into(),
            ));
        }
        if let Some(ref dir) = c.scratch_dir {
            if !dir.is_dir() {
                return Err(Doc2TextError::InvalidConfig(format!(
                    "Scratch directory {} does not exist",
                    dir.display()
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What each converted file is delivered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Engine Markdown, structure preserved. (default)
    #[default]
    Markdown,
    /// Markdown run through the sanitizer.
    Text,
}

impl OutputFormat {
    /// File extension including the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Markdown => ".md",
            OutputFormat::Text => ".txt",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "text/markdown",
            OutputFormat::Text => "text/plain",
        }
    }

    /// Lower-case name, as used in bundle file names.
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Text => "text",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = ConversionConfig::default();
        assert_eq!(c.format, OutputFormat::Markdown);
        assert_eq!(c.max_files, Some(10));
        assert_eq!(c.engine_kind, EngineKind::Auto);
        assert_eq!(c.markitdown_program, "markitdown");
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let err = ConversionConfig::builder().concurrency(0).build().unwrap_err();
        assert!(matches!(err, Doc2TextError::InvalidConfig(_)));
        assert!(err.to_string().contains("Concurrency"));
    }

    #[test]
    fn test_max_files_zero_is_unlimited() {
        let c = ConversionConfig::builder().max_files(0).build().unwrap();
        assert_eq!(c.max_files, None);
    }

    #[test]
    fn test_empty_program_rejected() {
        let err = ConversionConfig::builder()
            .markitdown_program("  ")
            .build()
            .unwrap_err();
        assert!(matches!(err, Doc2TextError::InvalidConfig(_)));

        // Passthrough never runs the program.
        assert!(ConversionConfig::builder()
            .engine_kind(EngineKind::Passthrough)
            .markitdown_program("")
            .build()
            .is_ok());
    }

    #[test]
    fn test_missing_scratch_dir_rejected() {
        let err = ConversionConfig::builder()
            .scratch_dir("/definitely/not/a/real/dir")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Scratch directory"));
    }

    #[test]
    fn test_resolve_engine_prefers_instance() {
        let c = ConversionConfig::builder()
            .engine(Arc::new(crate::pipeline::engine::PassthroughEngine))
            .engine_kind(EngineKind::MarkItDown)
            .build()
            .unwrap();
        assert_eq!(c.resolve_engine().name(), "passthrough");

        let c = ConversionConfig::builder()
            .engine_kind(EngineKind::MarkItDown)
            .build()
            .unwrap();
        assert_eq!(c.resolve_engine().name(), "markitdown");
    }

    #[test]
    fn test_output_format_names() {
        assert_eq!(OutputFormat::Markdown.extension(), ".md");
        assert_eq!(OutputFormat::Text.extension(), ".txt");
        assert_eq!(OutputFormat::Text.mime_type(), "text/plain");
        assert_eq!(OutputFormat::Markdown.to_string(), "markdown");
    }
}
