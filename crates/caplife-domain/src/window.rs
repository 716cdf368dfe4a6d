//! Hot window partitioning

use crate::{newest_first, CaptureEntry};

/// Snapshot of a hot directory split into the newest `capacity` files and the rest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HotWindow {
    /// Newest files, newest first. At most `capacity` of them.
    pub keep: Vec<CaptureEntry>,

    /// Everything older than the kept files, newest first
    pub overflow: Vec<CaptureEntry>,
}

impl HotWindow {
    /// Partition a listing of a hot directory
    pub fn partition(mut entries: Vec<CaptureEntry>, capacity: usize) -> Self {
        entries.sort_by(newest_first);
        let overflow = if entries.len() > capacity {
            entries.split_off(capacity)
        } else {
            Vec::new()
        };
        Self {
            keep: entries,
            overflow,
        }
    }

    /// Overflow in the order the archiver moves it
    pub fn overflow_oldest_first(&self) -> impl Iterator<Item = &CaptureEntry> {
        self.overflow.iter().rev()
    }

    /// Total number of files in the snapshot
    pub fn len(&self) -> usize {
        self.keep.len() + self.overflow.len()
    }

    /// True if the snapshot was empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
