//! Post-run enumeration of recovered files.
//!
//! The worker writes into a timestamped `Recovery_YYYYMMDD_HHMMSS`
//! directory under the destination; the scan targets the newest one and
//! falls back to the destination itself for older worker versions that
//! wrote in place.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::error::{Result, SupervisorError};

/// Broad content category, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum FileCategory {
    Archives,
    Audio,
    Documents,
    Images,
    Videos,
    Other,
}

impl FileCategory {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "svg" | "webp" | "ico" | "tiff" | "tif"
            | "heic" | "heif" | "raw" | "cr2" | "nef" | "arw" => FileCategory::Images,
            "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "txt" | "rtf" | "odt"
            | "ods" | "odp" | "csv" | "md" => FileCategory::Documents,
            "mp4" | "avi" | "mkv" | "mov" | "wmv" | "flv" | "webm" | "m4v" | "3gp" | "mpg"
            | "mpeg" => FileCategory::Videos,
            "mp3" | "wav" | "flac" | "aac" | "ogg" | "wma" | "m4a" | "opus" | "aiff" => {
                FileCategory::Audio
            }
            "zip" | "rar" | "7z" | "tar" | "gz" | "bz2" | "xz" | "iso" | "cab" => {
                FileCategory::Archives
            }
            _ => FileCategory::Other,
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileCategory::Archives => "Archives",
            FileCategory::Audio => "Audio",
            FileCategory::Documents => "Documents",
            FileCategory::Images => "Images",
            FileCategory::Videos => "Videos",
            FileCategory::Other => "Other",
        };
        f.write_str(name)
    }
}

/// One recovered file, relative to the recovery directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoveredFile {
    pub id: String,
    pub name: String,
    pub path: String,
    pub size: u64,
    pub category: FileCategory,
}

/// Enumerate the files the most recent run recovered under `destination`.
///
/// Results are sorted by category, then by name.
pub fn scan_recovered_files(destination: &str) -> Result<Vec<RecoveredFile>> {
    let dest_path = Path::new(destination);
    if !dest_path.exists() {
        return Err(SupervisorError::MissingDestinationDir(
            destination.to_string(),
        ));
    }

    let recovery_dir =
        find_latest_recovery_dir(dest_path).unwrap_or_else(|| dest_path.to_path_buf());

    let mut files: Vec<RecoveredFile> = Vec::new();
    let mut id_counter = 0u64;

    for entry in WalkDir::new(&recovery_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default();
        let size = entry.metadata().map(|meta| meta.len()).unwrap_or(0);
        let relative = path
            .strip_prefix(&recovery_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned();

        id_counter += 1;
        files.push(RecoveredFile {
            id: id_counter.to_string(),
            name,
            path: relative,
            size,
            category: FileCategory::from_extension(&ext),
        });
    }

    files.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
    Ok(files)
}

/// Newest `Recovery_*` directory directly under `base`, by mtime.
fn find_latest_recovery_dir(base: &Path) -> Option<PathBuf> {
    let mut latest: Option<(PathBuf, std::time::SystemTime)> = None;

    let entries = fs::read_dir(base).ok()?;
    for entry in entries.filter_map(|entry| entry.ok()) {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if !entry.file_name().to_string_lossy().starts_with("Recovery_") {
            continue;
        }
        let modified = match entry.metadata().and_then(|meta| meta.modified()) {
            Ok(modified) => modified,
            Err(_) => continue,
        };
        match &latest {
            Some((_, prev)) if modified <= *prev => {}
            _ => latest = Some((path, modified)),
        }
    }

    latest.map(|(path, _)| path)
}
