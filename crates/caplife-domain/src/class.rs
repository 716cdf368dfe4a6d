//! Artifact classes - the kinds of files a capture writer produces

use std::fmt;
use std::time::Duration;

/// Kind of artifact produced by the capture writer
///
/// Each class lives in its own directory under the capture root and has its own
/// hot capacity and cold retention policy:
/// - Segment: video segments, small hot window (live playlist look-back)
/// - Capture: still captures, short cold retention
/// - Thumbnail: downscaled captures
/// - Metadata: JSON sidecars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArtifactClass {
    /// Video segments (`segment_<seq>.ts`)
    Segment,

    /// Still captures (`capture_<seq>.jpg`)
    Capture,

    /// Thumbnails (`thumbnail_<seq>.jpg`, legacy `capture_<seq>_thumbnail.jpg`)
    Thumbnail,

    /// Metadata sidecars (`metadata_<seq>.json`, legacy `capture_<seq>.json`)
    Metadata,
}

impl ArtifactClass {
    /// All classes, in processing order
    pub const ALL: [ArtifactClass; 4] = [
        ArtifactClass::Segment,
        ArtifactClass::Capture,
        ArtifactClass::Thumbnail,
        ArtifactClass::Metadata,
    ];

    /// Get the class name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactClass::Segment => "segment",
            ArtifactClass::Capture => "capture",
            ArtifactClass::Thumbnail => "thumbnail",
            ArtifactClass::Metadata => "metadata",
        }
    }

    /// Directory name of this class under the capture root
    pub fn dir_name(&self) -> &'static str {
        match self {
            ArtifactClass::Segment => "segments",
            ArtifactClass::Capture => "captures",
            ArtifactClass::Thumbnail => "thumbnails",
            ArtifactClass::Metadata => "metadata",
        }
    }

    /// File name prefix written by the capture writer
    pub fn prefix(&self) -> &'static str {
        self.as_str()
    }

    /// Accepted (lowercase) file extensions
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            ArtifactClass::Segment => &["ts", "m4s", "mp4"],
            ArtifactClass::Capture | ArtifactClass::Thumbnail => &["jpg", "jpeg", "png"],
            ArtifactClass::Metadata => &["json"],
        }
    }

    /// Default number of files kept hot
    pub fn default_hot_capacity(&self) -> usize {
        match self {
            ArtifactClass::Segment => 10,
            _ => 100,
        }
    }

    /// Default age after which a cold bucket is purged
    pub fn default_cold_retention(&self) -> Duration {
        match self {
            ArtifactClass::Capture => Duration::from_secs(3600),
            _ => Duration::from_secs(24 * 3600),
        }
    }

    /// Parse a class from its name or directory name
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "segment" | "segments" => Some(ArtifactClass::Segment),
            "capture" | "captures" => Some(ArtifactClass::Capture),
            "thumbnail" | "thumbnails" => Some(ArtifactClass::Thumbnail),
            "metadata" => Some(ArtifactClass::Metadata),
            _ => None,
        }
    }
}

impl fmt::Display for ArtifactClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ArtifactClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid artifact class: {}", s))
    }
}
