//! # doc2text
//!
//! Convert office documents, PDFs, and web pages to Markdown or to clean
//! plain text.
//!
//! ## Why this crate?
//!
//! Document converters such as `markitdown` produce good Markdown, but many
//! consumers (search indexes, embedding pipelines, plain-text mail) want the
//! words without the syntax. This crate wraps a pluggable Markdown engine and
//! adds a deterministic, ordered sanitizer that strips headers, emphasis,
//! links, code, quotes, list markers, rules, and HTML, then normalises
//! whitespace.
//!
//! ## Pipeline Overview
//!
//! ```text
//! files / URLs / stdin
//!  │
//!  ├─ 1. Input     read local files, download URLs, or take stdin
//!  ├─ 2. Adapter   stage bytes in a temp file (always removed)
//!  ├─ 3. Engine    markitdown (or passthrough for text formats) → Markdown
//!  ├─ 4. Sanitize  ordered rules → plain text   (text format only)
//!  └─ 5. Bundle    <stem>.md / <stem>.txt, a directory, or a ZIP
//! ```
//!
//! Files are converted concurrently. A file that fails never stops the rest
//! of the batch; its error is kept alongside its name in the output.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc2text::{convert_paths, ConversionConfig, OutputFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .format(OutputFormat::Text)
//!         .build()?;
//!     let output = convert_paths(&["report.docx", "slides.pptx"], &config).await?;
//!     for file in output.successes() {
//!         println!("{}:\n{}", file.output_name, file.content);
//!     }
//!     for (name, err) in output.failures() {
//!         eprintln!("{name}: {err}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! The sanitizer is usable on its own:
//!
//! ```rust
//! assert_eq!(doc2text::sanitize("## Hello **World**"), "Hello World");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doc2text` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! doc2text = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, OutputFormat};
pub use convert::{
    convert_batch, convert_batch_sync, convert_file, convert_paths, convert_to_dir, write_outputs,
};
pub use error::{ConversionError, Doc2TextError};
pub use output::{BatchOutput, BatchStats, FileResult};
pub use pipeline::adapter::convert_to_markdown;
pub use pipeline::bundle::{bundle_name, output_name, write_zip, zip_bytes};
pub use pipeline::engine::{AutoEngine, EngineKind, MarkItDownEngine, MarkdownEngine, PassthroughEngine};
pub use pipeline::input::InputFile;
pub use pipeline::sanitize::{sanitize, sanitize_with, Charset, SanitizeOptions};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::{convert_stream, FileStream};
