//! Removal of superseded legacy artifacts from migrated cold buckets

use crate::error::{MigrateError, Result};
use caplife_domain::{classify_name, ArtifactClass, BucketKey, Mode};
use caplife_store::CaptureLayout;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Kinds of leftovers the cleanup removes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyPattern {
    /// `*.tmp` partial write
    PartialWrite,
    /// `capture_<n>_thumbnail.*` inside a captures bucket
    EmbeddedThumbnail,
    /// `*.m3u8` playlist inside a segments bucket
    BucketPlaylist,
}

/// Match a file name found in a cold bucket of `class`
pub fn legacy_pattern(class: ArtifactClass, name: &str) -> Option<LegacyPattern> {
    let lower = name.to_ascii_lowercase();
    if lower.ends_with(".tmp") {
        return Some(LegacyPattern::PartialWrite);
    }
    match class {
        ArtifactClass::Capture => classify_name(name)
            .filter(|parsed| parsed.legacy && parsed.class == ArtifactClass::Thumbnail)
            .map(|_| LegacyPattern::EmbeddedThumbnail),
        ArtifactClass::Segment if lower.ends_with(".m3u8") => Some(LegacyPattern::BucketPlaylist),
        _ => None,
    }
}

/// Outcome for one bucket directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryResult {
    /// Bucket directory
    pub path: PathBuf,
    /// Files matching a legacy pattern
    pub matched: usize,
    /// Files removed (always 0 in dry-run)
    pub removed: usize,
    /// First error hit in this directory
    pub error: Option<String>,
}

impl DirectoryResult {
    /// True if the directory was fully processed
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of a cleanup run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Nothing was deleted
    pub dry_run: bool,
    /// Capture roots found under the stream base
    pub roots: Vec<PathBuf>,
    /// Every bucket directory that held a match or failed
    pub directories: Vec<DirectoryResult>,
}

impl CleanupReport {
    /// Files matched across all directories
    pub fn total_matched(&self) -> usize {
        self.directories.iter().map(|d| d.matched).sum()
    }

    /// Files removed across all directories
    pub fn total_removed(&self) -> usize {
        self.directories.iter().map(|d| d.removed).sum()
    }

    /// Directories that reported an error
    pub fn failed_directories(&self) -> impl Iterator<Item = &DirectoryResult> {
        self.directories.iter().filter(|d| !d.is_success())
    }

    /// True if every directory succeeded
    pub fn is_success(&self) -> bool {
        self.failed_directories().next().is_none()
    }
}

/// Deletes superseded legacy files from already-migrated capture roots
///
/// Only cold bucket directories are inspected; hot directories and anything
/// outside `<root>/<class>/<0-23>/` are never touched.
#[derive(Debug, Clone, Copy)]
pub struct LegacyCleaner {
    mode: Mode,
}

impl LegacyCleaner {
    /// Cleaner running in `mode`
    pub fn new(mode: Mode) -> Self {
        Self { mode }
    }

    /// Capture roots under `stream_base`: the base itself, or its direct children
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Structural`] if `stream_base` is not a directory.
    pub fn find_capture_roots(stream_base: &Path) -> Result<Vec<PathBuf>> {
        if !stream_base.is_dir() {
            return Err(MigrateError::Structural {
                path: stream_base.to_path_buf(),
                reason: "stream base is not a directory".into(),
            });
        }
        if CaptureLayout::is_capture_root(stream_base) {
            return Ok(vec![stream_base.to_path_buf()]);
        }

        let reader = fs::read_dir(stream_base).map_err(|source| MigrateError::Io {
            path: stream_base.to_path_buf(),
            source,
        })?;
        let mut roots: Vec<PathBuf> = reader
            .flatten()
            .map(|item| item.path())
            .filter(|path| path.is_dir() && CaptureLayout::is_capture_root(path))
            .collect();
        roots.sort();
        Ok(roots)
    }

    /// Clean every capture root under `stream_base`
    pub fn run(&self, stream_base: &Path) -> Result<CleanupReport> {
        let roots = Self::find_capture_roots(stream_base)?;
        if roots.is_empty() {
            tracing::warn!(base = %stream_base.display(), "No capture roots found");
        }

        let mut directories = Vec::new();
        for root in &roots {
            let layout = CaptureLayout::new(root);
            for class in ArtifactClass::ALL {
                for bucket in BucketKey::all() {
                    let dir = layout.bucket_dir(class, bucket);
                    if !dir.is_dir() {
                        continue;
                    }
                    let result = self.clean_bucket(class, &dir);
                    if result.matched > 0 || !result.is_success() {
                        directories.push(result);
                    }
                }
            }
        }

        let report = CleanupReport {
            dry_run: self.mode.is_dry_run(),
            roots,
            directories,
        };
        tracing::info!(
            matched = report.total_matched(),
            removed = report.total_removed(),
            failed = report.failed_directories().count(),
            "Legacy cleanup finished"
        );
        Ok(report)
    }

    fn clean_bucket(&self, class: ArtifactClass, dir: &Path) -> DirectoryResult {
        let mut result = DirectoryResult {
            path: dir.to_path_buf(),
            matched: 0,
            removed: 0,
            error: None,
        };

        let reader = match fs::read_dir(dir) {
            Ok(reader) => reader,
            Err(e) => {
                result.error = Some(e.to_string());
                return result;
            }
        };

        for item in reader.flatten() {
            let path = item.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !item.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let Some(pattern) = legacy_pattern(class, name) else {
                continue;
            };

            result.matched += 1;
            if self.mode.is_dry_run() {
                tracing::info!(file = %path.display(), pattern = ?pattern, "DRY RUN: would delete");
                continue;
            }

            match fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!(file = %path.display(), pattern = ?pattern, "Deleted");
                    result.removed += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "Delete failed");
                    result.error.get_or_insert_with(|| format!("{}: {}", name, e));
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns() {
        assert_eq!(
            legacy_pattern(ArtifactClass::Capture, "capture_5_thumbnail.jpg"),
            Some(LegacyPattern::EmbeddedThumbnail)
        );
        assert_eq!(
            legacy_pattern(ArtifactClass::Segment, "index.m3u8"),
            Some(LegacyPattern::BucketPlaylist)
        );
        assert_eq!(
            legacy_pattern(ArtifactClass::Metadata, "metadata_1.json.tmp"),
            Some(LegacyPattern::PartialWrite)
        );
        assert_eq!(legacy_pattern(ArtifactClass::Capture, "capture_5.jpg"), None);
        assert_eq!(legacy_pattern(ArtifactClass::Thumbnail, "index.m3u8"), None);
        assert_eq!(legacy_pattern(ArtifactClass::Segment, "capture_5_thumbnail.jpg"), None);
    }
}
