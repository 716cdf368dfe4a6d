//! Cold bucket age assessment

use crate::CaptureEntry;
use std::time::{Duration, SystemTime};

/// Members of one bucket generation are created within the same clock hour.
/// A wider span means the bucket was reused before its old content was purged.
pub const GENERATION_SPAN: Duration = Duration::from_secs(65 * 60);

/// Summary of a cold bucket's content used by the retention sweeper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketAssessment {
    /// mtime of the newest member
    pub newest: SystemTime,

    /// mtime of the oldest member
    pub oldest: SystemTime,

    /// Number of members
    pub count: usize,
}

impl BucketAssessment {
    /// Assess a bucket listing. An empty bucket has no effective age.
    pub fn assess(entries: &[CaptureEntry]) -> Option<Self> {
        let newest = entries.iter().map(|e| e.modified).max()?;
        let oldest = entries.iter().map(|e| e.modified).min()?;
        Some(Self {
            newest,
            oldest,
            count: entries.len(),
        })
    }

    /// Time since the newest member was created
    ///
    /// Members with an mtime in the future count as age zero.
    pub fn effective_age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.newest).unwrap_or_default()
    }

    /// Whether the whole bucket is past `retention`
    pub fn is_expired(&self, now: SystemTime, retention: Duration) -> bool {
        self.effective_age(now) > retention
    }

    /// Whether members come from more than one day's use of this hour
    pub fn is_mixed_generation(&self) -> bool {
        self.newest
            .duration_since(self.oldest)
            .map(|span| span > GENERATION_SPAN)
            .unwrap_or(false)
    }
}
