//! Output naming and ZIP bundling.
//!
//! Converted files are delivered as `<stem><ext>`, where `<stem>` is the
//! source name without its last extension and `<ext>` comes from the
//! [`OutputFormat`]. A batch of several files can also be delivered as a
//! single deflated ZIP archive.

use crate::config::OutputFormat;
use crate::error::Doc2TextError;
use crate::output::{BatchOutput, FileResult};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// `report.final.pdf` → `report.final.txt` for [`OutputFormat::Text`].
pub fn output_name(source_name: &str, format: OutputFormat) -> String {
    let path = Path::new(source_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string());
    format!("{stem}{}", format.extension())
}

/// Default archive name, e.g. `converted_files_text.zip`.
pub fn bundle_name(format: OutputFormat) -> String {
    format!("converted_files_{}.zip", format.as_str())
}

/// Make names unique by appending `-2`, `-3`, … before the extension.
///
/// Two uploads called `notes.pdf` and `notes.docx` would otherwise overwrite
/// each other as `notes.md`.
pub fn dedupe_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for name in names {
        let mut candidate = name.to_string();
        let mut n = 2;
        while taken.contains(&candidate) {
            let path = Path::new(name);
            let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
            candidate = match path.extension() {
                Some(ext) => format!("{stem}-{n}.{}", ext.to_string_lossy()),
                None => format!("{stem}-{n}"),
            };
            n += 1;
        }
        taken.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

/// Successful results paired with their unique delivery names.
pub fn named_successes(output: &BatchOutput) -> Vec<(String, &FileResult)> {
    let ok: Vec<&FileResult> = output.successes().collect();
    let names = dedupe_names(ok.iter().map(|f| f.output_name.as_str()));
    names.into_iter().zip(ok).collect()
}

/// Build a ZIP archive of every successful file in memory.
pub fn zip_bytes(output: &BatchOutput) -> Result<Vec<u8>, Doc2TextError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opt = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, file) in named_successes(output) {
        zip.start_file(name.as_str(), opt)
            .map_err(|e| Doc2TextError::BundleFailed(e.to_string()))?;
        zip.write_all(file.content.as_bytes())
            .map_err(|e| Doc2TextError::BundleFailed(e.to_string()))?;
    }

    let cursor = zip
        .finish()
        .map_err(|e| Doc2TextError::BundleFailed(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// Write the ZIP archive to `path` atomically (temp file + rename).
pub async fn write_zip(output: &BatchOutput, path: &Path) -> Result<usize, Doc2TextError> {
    let bytes = zip_bytes(output)?;
    write_atomic(path, bytes.as_slice()).await?;
    let entries = output.stats.succeeded;
    info!("Wrote {} ({} entries, {} bytes)", path.display(), entries, bytes.len());
    Ok(entries)
}

/// Write `data` to `path` via a sibling temp file and rename.
pub(crate) async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), Doc2TextError> {
    let fail = |e: std::io::Error| Doc2TextError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(fail)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, data).await.map_err(fail)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(fail)
}
