//! Classification primitives
//!
//! Pure functions mapping a file name to its artifact class and sequence number.
//! Shared by the archiver, the sweeper, the migration tool and the cleanup tool so
//! that every component agrees on what a file is.

use crate::ArtifactClass;
use std::cmp::Ordering;
use std::path::PathBuf;
use std::time::SystemTime;

/// Result of classifying a file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedName {
    /// Artifact class the name belongs to
    pub class: ArtifactClass,

    /// Monotonic sequence or timestamp component of the name
    pub sequence: u64,

    /// Name uses a pre-migration pattern (`capture_<n>_thumbnail.jpg`, `capture_<n>.json`)
    pub legacy: bool,
}

/// Classify a bare file name
///
/// Returns `None` for anything that is not a recognized capture artifact. Unclassified
/// files are never moved or deleted by any component.
///
/// # Examples
///
/// ```
/// use caplife_domain::{classify_name, ArtifactClass};
///
/// let parsed = classify_name("segment_000042.ts").unwrap();
/// assert_eq!(parsed.class, ArtifactClass::Segment);
/// assert_eq!(parsed.sequence, 42);
///
/// assert!(classify_name("notes.txt").is_none());
/// ```
pub fn classify_name(name: &str) -> Option<ParsedName> {
    let (stem, ext) = name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();

    if let Some(rest) = stem.strip_prefix("capture_") {
        if let Some(seq) = rest.strip_suffix("_thumbnail") {
            return parsed(ArtifactClass::Thumbnail, seq, &ext, true);
        }
        if ext == "json" {
            return parsed(ArtifactClass::Metadata, rest, &ext, true);
        }
        return parsed(ArtifactClass::Capture, rest, &ext, false);
    }

    ArtifactClass::ALL.into_iter().find_map(|class| {
        let rest = stem.strip_prefix(class.prefix())?.strip_prefix('_')?;
        parsed(class, rest, &ext, false)
    })
}

fn parsed(class: ArtifactClass, digits: &str, ext: &str, legacy: bool) -> Option<ParsedName> {
    if !class.extensions().contains(&ext) {
        return None;
    }
    Some(ParsedName {
        class,
        sequence: parse_sequence(digits)?,
        legacy,
    })
}

fn parse_sequence(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Point-in-time record of one capture file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureEntry {
    /// Full path at the time of the snapshot
    pub path: PathBuf,

    /// Bare file name
    pub name: String,

    /// Artifact class
    pub class: ArtifactClass,

    /// Creation time (mtime)
    pub modified: SystemTime,

    /// Sequence component of the name
    pub sequence: u64,
}

impl CaptureEntry {
    /// Build an entry from a path and mtime, returning `None` for unclassified names
    pub fn from_path(path: PathBuf, modified: SystemTime) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_string();
        let parsed = classify_name(&name)?;
        Some(Self {
            path,
            name,
            class: parsed.class,
            modified,
            sequence: parsed.sequence,
        })
    }
}

/// Ordering that sorts the most recently created entry first
///
/// Ties on mtime (coarse filesystem timestamps) fall back to the sequence number,
/// then to the name so the order is total.
pub fn newest_first(a: &CaptureEntry, b: &CaptureEntry) -> Ordering {
    b.modified
        .cmp(&a.modified)
        .then(b.sequence.cmp(&a.sequence))
        .then_with(|| b.name.cmp(&a.name))
}
