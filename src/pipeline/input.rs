//! Input resolution: turn a user-supplied path, URL, or `-` into bytes.
//!
//! The conversion adapter works on `(filename, bytes)` pairs, the same shape an
//! upload form delivers. This module produces those pairs from the places a
//! CLI user can point at: local files, HTTP(S) URLs, and standard input.

use crate::error::Doc2TextError;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

/// Name given to Markdown read from standard input.
pub const STDIN_NAME: &str = "stdin.md";

/// One input document, ready for the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
    /// File name including extension; only the extension drives conversion.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to an [`InputFile`].
///
/// `-` reads standard input as Markdown; URLs are downloaded; anything else
/// is a local path.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<InputFile, Doc2TextError> {
    if input == "-" {
        read_stdin().await
    } else if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

/// Resolve every input, stopping at the first that cannot be read.
pub async fn resolve_inputs<S: AsRef<str>>(
    inputs: &[S],
    timeout_secs: u64,
) -> Result<Vec<InputFile>, Doc2TextError> {
    let mut files = Vec::with_capacity(inputs.len());
    for input in inputs {
        files.push(resolve_input(input.as_ref(), timeout_secs).await?);
    }
    Ok(files)
}

async fn read_stdin() -> Result<InputFile, Doc2TextError> {
    let mut bytes = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut bytes)
        .await
        .map_err(|e| Doc2TextError::InvalidInput {
            input: "-".into(),
            reason: format!("failed to read stdin: {e}"),
        })?;
    debug!("Read {} bytes from stdin", bytes.len());
    Ok(InputFile::new(STDIN_NAME, bytes))
}

async fn read_local(path_str: &str) -> Result<InputFile, Doc2TextError> {
    let path = PathBuf::from(path_str);

    if path.is_dir() {
        return Err(Doc2TextError::InvalidInput {
            input: path_str.to_string(),
            reason: "is a directory".into(),
        });
    }

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Doc2TextError::PermissionDenied { path: path.clone() },
        _ => Doc2TextError::FileNotFound { path: path.clone() },
    })?;

    debug!("Read local file: {} ({} bytes)", path.display(), bytes.len());
    Ok(InputFile::new(file_name_of(&path), bytes))
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<InputFile, Doc2TextError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Doc2TextError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Doc2TextError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            Doc2TextError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(Doc2TextError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let name = filename_from_url(url);
    let bytes = response
        .bytes()
        .await
        .map_err(|e| Doc2TextError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} ({} bytes)", name, bytes.len());
    Ok(InputFile::new(name, bytes.to_vec()))
}

/// Last path segment of the URL when it looks like a file name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.html".to_string()
}
