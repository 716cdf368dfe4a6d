//! Hot window tracking

use caplife_domain::{ArtifactClass, CaptureStore, HotWindow};

/// Snapshots a class's hot directory and splits it into keep / overflow
///
/// Each call is an independent point-in-time listing. Files written after the
/// snapshot are picked up on the next call; files that vanish after it are the
/// caller's to tolerate.
#[derive(Debug, Clone, Copy)]
pub struct HotWindowTracker {
    class: ArtifactClass,
    capacity: usize,
}

impl HotWindowTracker {
    /// Tracker for `class` keeping the newest `capacity` files hot
    pub fn new(class: ArtifactClass, capacity: usize) -> Self {
        Self { class, capacity }
    }

    /// Take a snapshot of the hot directory
    pub fn snapshot<S: CaptureStore>(&self, store: &S) -> Result<HotWindow, S::Error> {
        let entries = store.list_hot(self.class)?;
        Ok(HotWindow::partition(entries, self.capacity))
    }
}
