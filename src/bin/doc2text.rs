//! CLI binary for doc2text.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and delivers the converted files.

use anyhow::{Context, Result};
use clap::Parser;
use doc2text::{
    bundle_name, convert_paths, write_outputs, write_zip, BatchOutput, Charset, ConversionConfig,
    ConversionProgressCallback, EngineKind, OutputFormat, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Exit status after Ctrl-C, as a shell would report SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

/// Attempts at removing the scratch directory after an interrupt.
const SCRATCH_REMOVE_ATTEMPTS: usize = 20;
const SCRATCH_REMOVE_BACKOFF: Duration = Duration::from_millis(50);

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch plus a log line per
/// file. Files finish out of order when `--concurrency` is above 1.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Per-file wall-clock start times, keyed by input index.
    start_times: Mutex<HashMap<usize, Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(SPINNER);

        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Reading inputs…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
        })
    }

    fn activate_bar(&self, total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(SPINNER);

        self.bar.set_length(total as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, index: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&index))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Abandon the bar without printing a summary (used on Ctrl-C).
    fn abandon(&self) {
        self.bar.finish_and_clear();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.activate_bar(total_files);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_files} file(s)…"))
        ));
    }

    fn on_file_start(&self, index: usize, _total: usize, name: &str) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(index, Instant::now());
        }
        self.bar.set_message(name.to_string());
    }

    fn on_file_complete(&self, index: usize, _total: usize, name: &str, chars: usize) {
        let secs = self.elapsed_secs(index);
        self.bar.println(format!(
            "  {} {:<32}  {:<8}  {}",
            green("✓"),
            name,
            dim(&format!("{chars:>7} chars")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, _total: usize, name: &str, error: &str) {
        let secs = self.elapsed_secs(index);
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:<32}  {}  {}",
            red("✗"),
            name,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let failed = total_files.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} file(s) converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files converted  ({} failed)",
                if failed == total_files { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Print Markdown for one document
  doc2text report.docx

  # Plain text for several documents, written next to each other
  doc2text -f text -o out/ report.docx slides.pptx sheet.xlsx

  # Bundle plain-text outputs into a ZIP
  doc2text -f text --zip converted_files_text.zip *.pdf

  # Sanitize Markdown from stdin
  cat notes.md | doc2text -f text -

  # Convert a web page
  doc2text https://example.com/article.html

  # JSON with per-file results and errors
  doc2text --json a.pdf b.docx > batch.json

ENGINES:
  auto         passthrough for text formats (md, txt, csv, html, ...),
               markitdown for everything else (default)
  markitdown   always run the markitdown CLI
  passthrough  text formats only; other files fail with "unsupported"

ENVIRONMENT VARIABLES:
  MARKITDOWN_BIN      Path to the markitdown executable
  DOC2TEXT_FORMAT     Default output format (markdown, text)
  DOC2TEXT_*          Every other flag, upper-cased (e.g. DOC2TEXT_CONCURRENCY)
  RUST_LOG            Override log filtering (e.g. RUST_LOG=doc2text=debug)

EXIT STATUS:
  0    every file converted
  1    at least one file failed, or the run could not start
  130  interrupted (Ctrl-C); temporary files are removed
"#;

/// Convert documents to Markdown or plain text.
#[derive(Parser, Debug)]
#[command(
    name = "doc2text",
    version,
    about = "Convert documents to Markdown or plain text",
    long_about = "Convert documents (PDF, Word, PowerPoint, Excel, HTML, and more) to Markdown \
with markitdown, or to clean plain text with all Markdown syntax stripped. Accepts local files, \
HTTP/HTTPS URLs, and `-` for standard input.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local file paths, HTTP/HTTPS URLs, or `-` for stdin.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output format.
    #[arg(short, long, env = "DOC2TEXT_FORMAT", value_enum, default_value = "markdown")]
    format: FormatArg,

    /// Write one `<stem>.md` / `<stem>.txt` per file into this directory.
    #[arg(short, long, env = "DOC2TEXT_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Bundle successful outputs into this ZIP file (or a directory to hold it).
    #[arg(long, env = "DOC2TEXT_ZIP")]
    zip: Option<PathBuf>,

    /// Print the batch result (contents, errors, stats) as JSON.
    #[arg(long, env = "DOC2TEXT_JSON")]
    json: bool,

    /// Conversion engine.
    #[arg(long, env = "DOC2TEXT_ENGINE", value_enum, default_value = "auto")]
    engine: EngineArg,

    /// markitdown executable.
    #[arg(long, env = "MARKITDOWN_BIN", default_value = "markitdown")]
    markitdown_bin: String,

    /// Number of files converted at once.
    #[arg(short, long, env = "DOC2TEXT_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Maximum files per run (0 = unlimited).
    #[arg(long, env = "DOC2TEXT_MAX_FILES", default_value_t = 10)]
    max_files: usize,

    /// Keep non-ASCII letters and digits in text output.
    #[arg(long, env = "DOC2TEXT_UNICODE")]
    unicode: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "DOC2TEXT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable progress bar.
    #[arg(long, env = "DOC2TEXT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2TEXT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOC2TEXT_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Markdown,
    Text,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Markdown => OutputFormat::Markdown,
            FormatArg::Text => OutputFormat::Text,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum EngineArg {
    Auto,
    Markitdown,
    Passthrough,
}

impl From<EngineArg> for EngineKind {
    fn from(v: EngineArg) -> Self {
        match v {
            EngineArg::Auto => EngineKind::Auto,
            EngineArg::Markitdown => EngineKind::MarkItDown,
            EngineArg::Passthrough => EngineKind::Passthrough,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; --verbose brings them back.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Scratch directory ────────────────────────────────────────────────
    // Every temp file of this run lives here, so an interrupted run can
    // remove them all at once.
    let scratch = tempfile::Builder::new()
        .prefix("doc2text-run-")
        .tempdir()
        .context("Failed to create scratch directory")?;

    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(
        &cli,
        scratch.path(),
        progress.clone().map(|cb| cb as ProgressCallback),
    )?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = tokio::select! {
        res = convert_paths(cli.inputs.as_slice(), &config) => res.context("Conversion failed")?,
        _ = tokio::signal::ctrl_c() => {
            if let Some(ref cb) = progress {
                cb.abandon();
            }
            eprintln!("{} interrupted, removing temporary files", red("✘"));
            // Blocking workers may still hold engine processes; do not wait for them.
            if let Err(e) = remove_scratch(scratch).await {
                eprintln!("{} {}", red("✘"), e);
            }
            std::process::exit(EXIT_INTERRUPTED.into());
        }
    };

    deliver(&cli, &output).await?;

    if !cli.quiet {
        report(&output);
    }

    Ok(if output.stats.failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Remove the run's scratch directory after an interrupt.
///
/// Workers still inside the adapter can create a temp file while the
/// directory is being emptied, which makes the removal fail with "directory
/// not empty". Retry until the directory is gone; once it is, late workers
/// can no longer create files in it.
async fn remove_scratch(scratch: TempDir) -> Result<()> {
    let path = scratch.path().to_path_buf();
    let mut result = scratch.close();

    for _ in 0..SCRATCH_REMOVE_ATTEMPTS {
        if result.is_ok() || !path.exists() {
            return Ok(());
        }
        tokio::time::sleep(SCRATCH_REMOVE_BACKOFF).await;
        result = tokio::fs::remove_dir_all(&path).await;
    }

    if !path.exists() {
        return Ok(());
    }
    result.with_context(|| format!("Failed to remove scratch directory {}", path.display()))
}

/// Map CLI args to `ConversionConfig`.
fn build_config(
    cli: &Cli,
    scratch_dir: &Path,
    progress: Option<ProgressCallback>,
) -> Result<ConversionConfig> {
    let charset = if cli.unicode {
        Charset::Unicode
    } else {
        Charset::Ascii
    };

    let mut builder = ConversionConfig::builder()
        .format(cli.format.into())
        .engine_kind(cli.engine.into())
        .markitdown_program(cli.markitdown_bin.clone())
        .concurrency(cli.concurrency)
        .max_files(cli.max_files)
        .charset(charset)
        .scratch_dir(scratch_dir)
        .download_timeout_secs(cli.download_timeout);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Send converted files wherever the flags ask for.
async fn deliver(cli: &Cli, output: &BatchOutput) -> Result<()> {
    if let Some(ref dir) = cli.output_dir {
        write_outputs(output, dir)
            .await
            .with_context(|| format!("Failed to write outputs to {}", dir.display()))?;
        if !cli.quiet {
            eprintln!(
                "{}  {} file(s)  →  {}",
                green("✔"),
                output.stats.succeeded,
                bold(&dir.display().to_string())
            );
        }
    }

    if let Some(ref zip) = cli.zip {
        let path = if zip.is_dir() {
            zip.join(bundle_name(output.format))
        } else {
            zip.clone()
        };
        let entries = write_zip(output, &path)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !cli.quiet {
            eprintln!(
                "{}  {} entr{}  →  {}",
                green("✔"),
                entries,
                if entries == 1 { "y" } else { "ies" },
                bold(&path.display().to_string())
            );
        }
    }

    if cli.json {
        let json = serde_json::to_string_pretty(output).context("Failed to serialise output")?;
        println!("{json}");
    } else if cli.output_dir.is_none() && cli.zip.is_none() {
        print_to_stdout(output).context("Failed to write to stdout")?;
    }

    Ok(())
}

fn print_to_stdout(output: &BatchOutput) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let with_headers = output.files.len() > 1;

    for (i, file) in output.successes().enumerate() {
        if with_headers {
            if i > 0 {
                handle.write_all(b"\n")?;
            }
            writeln!(handle, "==> {} <==", file.source_name)?;
        }
        handle.write_all(file.content.as_bytes())?;
        if !file.content.ends_with('\n') {
            handle.write_all(b"\n")?;
        }
    }
    handle.flush()
}

/// Failure list and one-line summary on stderr.
fn report(output: &BatchOutput) {
    let stats = &output.stats;
    if stats.failed > 0 {
        eprintln!("{}", bold("Errors:"));
        for (name, err) in output.failures() {
            eprintln!("  • {}: {}", name, red(&err.to_string()));
        }
    }
    eprintln!(
        "{} succeeded, {} failed out of {}  {}",
        stats.succeeded,
        stats.failed,
        stats.total_files,
        dim(&format!("{}ms", stats.total_duration_ms)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn scratch() -> TempDir {
        tempfile::Builder::new()
            .prefix("doc2text-run-")
            .tempdir()
            .unwrap()
    }

    #[tokio::test]
    async fn test_remove_scratch_deletes_leftovers() {
        let dir = scratch();
        let path = dir.path().to_path_buf();
        std::fs::write(path.join("doc2text-a.pdf"), b"%PDF").unwrap();
        std::fs::create_dir(path.join("nested")).unwrap();
        std::fs::write(path.join("nested/doc2text-b.docx"), b"PK").unwrap();

        remove_scratch(dir).await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_remove_scratch_outlasts_late_writers() {
        let dir = scratch();
        let path = dir.path().to_path_buf();
        let started = Arc::new(AtomicBool::new(false));

        // Keeps staging files for a while, as adapter workers do after Ctrl-C.
        let writer = {
            let path = path.clone();
            let started = Arc::clone(&started);
            std::thread::spawn(move || {
                for i in 0..100 {
                    let staged = tempfile::Builder::new()
                        .prefix("doc2text-")
                        .suffix(&format!(".{i}.pdf"))
                        .tempfile_in(&path);
                    started.store(true, Ordering::SeqCst);
                    match staged {
                        Ok(file) => {
                            let _ = file.keep();
                        }
                        Err(_) => break,
                    }
                    std::thread::sleep(Duration::from_millis(2));
                }
            })
        };

        while !started.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        remove_scratch(dir).await.unwrap();
        writer.join().unwrap();

        assert!(!path.exists(), "scratch directory survived the interrupt");
    }

    #[test]
    fn test_cli_parses_inputs_and_format() {
        let cli = Cli::try_parse_from(["doc2text", "-f", "text", "a.pdf", "b.docx"]).unwrap();
        assert_eq!(cli.inputs, ["a.pdf", "b.docx"]);
        assert!(matches!(cli.format, FormatArg::Text));
        assert_eq!(cli.max_files, 10);
    }
}
