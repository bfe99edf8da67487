//! Shared file I/O utilities.

use std::{
    fs::{create_dir_all, read, remove_file, rename, write},
    path::{Path, PathBuf},
    process,
    sync::atomic::{AtomicU64, Ordering},
};

use glob::{MatchOptions, Pattern, glob_with};
use log::warn;

use crate::error::{Error, Result};

/// A source font file handle.
#[derive(Debug, Clone)]
pub struct FontFile {
    path: PathBuf,
}

impl FontFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Family name derived from the file name: `Noto Sans SC.otf` -> `Noto Sans SC`.
    pub fn family(&self) -> String {
        family_from_file_name(&self.path.file_name().unwrap_or_default().to_string_lossy())
    }

    /// Read font data, distinguishing a missing file from other I/O failures.
    pub fn read(&self) -> Result<Vec<u8>> {
        if !self.exists() {
            return Err(Error::MissingFontFile { path: self.path.clone() });
        }
        read(&self.path).map_err(|source| Error::ReadFont { path: self.path.clone(), source })
    }
}

impl AsRef<Path> for FontFile {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Strip a `.ttf` or `.otf` suffix (any case) from a font file name.
pub fn family_from_file_name(file_name: &str) -> String {
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".ttf") || lower.ends_with(".otf") {
        file_name[..file_name.len() - 4].to_string()
    } else {
        file_name.to_string()
    }
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Write `data` to `path` so readers never observe a partial file.
///
/// The bytes go to a sibling temp file first and are then renamed over the
/// destination.
pub fn write_atomic(path: &Path, data: impl AsRef<[u8]>) -> Result<()> {
    ensure_parent_dir(path)?;
    let file_name = path.file_name().unwrap_or_default().to_string_lossy();
    let tmp = path.with_file_name(format!(
        ".{file_name}.{}.{}.tmp",
        process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    write(&tmp, data).map_err(|e| Error::write(&tmp, e))?;
    if let Err(e) = rename(&tmp, path) {
        if let Err(cleanup) = remove_file(&tmp) {
            warn!("Failed to remove temp file {}: {cleanup}", tmp.display());
        }
        return Err(Error::write(path, e));
    }
    Ok(())
}

/// Create a directory and its parents if missing.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    create_dir_all(dir).map_err(|e| Error::write(dir, e))
}

/// Create parent directory if it doesn't exist.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }
    Ok(())
}

/// Find files under `dir` whose extension matches one of `extensions`
/// (case-insensitive). Results are sorted by path.
///
/// A missing directory yields an empty list.
pub fn find_files_by_extension(
    dir: &Path,
    extensions: &[&str],
    recursive: bool,
) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let dir_str = dir.to_str().ok_or_else(|| Error::Config {
        path: dir.to_path_buf(),
        message: "directory path is not valid UTF-8".to_string(),
    })?;
    let options = MatchOptions { case_sensitive: false, ..MatchOptions::new() };
    let middle = if recursive { "/**/" } else { "/" };

    let mut files = Vec::new();
    for ext in extensions {
        let pattern = format!("{}{middle}*.{ext}", Pattern::escape(dir_str));
        let entries = glob_with(&pattern, options).map_err(|e| Error::Config {
            path: dir.to_path_buf(),
            message: format!("bad glob pattern {pattern}: {e}"),
        })?;
        files.extend(entries.filter_map(|entry| entry.ok()).filter(|p| p.is_file()));
    }
    files.sort();
    files.dedup();
    Ok(files)
}
