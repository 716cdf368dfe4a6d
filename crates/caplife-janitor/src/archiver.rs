//! Hot -> cold archiving

use crate::runner::{BlockingStore, OpError};
use crate::JanitorError;
use caplife_domain::{
    ArtifactClass, BucketClock, BucketKey, CaptureEntry, CaptureStore, FaultKind, Location, Mode,
    RelocateOutcome, StoreFault,
};
use caplife_store::HotWindowTracker;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::watch;

/// Outcome of one class's archive pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReport {
    /// Class that was processed
    pub class: ArtifactClass,

    /// Files in the hot snapshot
    pub hot_before: usize,

    /// Files beyond the hot capacity
    pub overflow: usize,

    /// Files moved into cold buckets
    pub moved: usize,

    /// Files that would have been moved (dry run)
    pub planned: usize,

    /// Files already gone when their turn came
    pub vanished: usize,

    /// Files left in hot after an I/O failure
    pub failed: usize,

    /// Files left in hot because the bucket already held that name
    pub conflicts: usize,

    /// Files deferred to the next cycle after a timeout
    pub deferred: usize,

    /// Pass stopped early on shutdown
    pub cancelled: bool,

    /// Moved (or planned) files per destination bucket
    pub destinations: BTreeMap<BucketKey, usize>,
}

impl ArchiveReport {
    /// Empty report for a class
    pub fn new(class: ArtifactClass) -> Self {
        Self {
            class,
            hot_before: 0,
            overflow: 0,
            moved: 0,
            planned: 0,
            vanished: 0,
            failed: 0,
            conflicts: 0,
            deferred: 0,
            cancelled: false,
            destinations: BTreeMap::new(),
        }
    }
}

enum Step {
    Moved,
    Vanished,
    Conflict,
    Failed,
    TimedOut,
}

/// Moves hot overflow into hour buckets
///
/// Each pass snapshots the hot directory, then renames every file beyond the
/// newest `capacity` into `Cold(hour_of_mtime)`, oldest first. A failed rename
/// leaves the file in hot, so re-running a pass only ever finds the work that
/// is still left.
pub struct Archiver<S> {
    runner: BlockingStore<S>,
    bucket_clock: BucketClock,
    mode: Mode,
    shutdown: watch::Receiver<bool>,
}

impl<S: CaptureStore> Archiver<S> {
    pub(crate) fn new(
        runner: BlockingStore<S>,
        bucket_clock: BucketClock,
        mode: Mode,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            runner,
            bucket_clock,
            mode,
            shutdown,
        }
    }

    /// Archive one class's overflow
    ///
    /// # Errors
    ///
    /// Fails only when the hot directory cannot be listed. Per-file failures are
    /// logged and counted in the report.
    pub async fn run_pass(&self, class: ArtifactClass, capacity: usize) -> Result<ArchiveReport, JanitorError> {
        let tracker = HotWindowTracker::new(class, capacity);
        let window = self
            .runner
            .call(move |store| tracker.snapshot(store))
            .await
            .map_err(|e| e.into_pass_error(class, "list_hot"))?;

        let mut report = ArchiveReport::new(class);
        report.hot_before = window.len();
        report.overflow = window.overflow.len();
        if window.overflow.is_empty() {
            return Ok(report);
        }

        let mut ensured = HashSet::new();
        for (done, entry) in window.overflow_oldest_first().enumerate() {
            if *self.shutdown.borrow() {
                report.cancelled = true;
                break;
            }

            let bucket = BucketKey::for_time(entry.modified, self.bucket_clock);
            debug_assert!(Location::Hot.can_transition_to(Location::Cold(bucket)));

            if self.mode.is_dry_run() {
                tracing::info!(class = %class, file = %entry.name, bucket = %bucket, "DRY RUN: would archive");
                report.planned += 1;
                *report.destinations.entry(bucket).or_insert(0) += 1;
                continue;
            }

            match self.move_one(entry, bucket, &mut ensured).await {
                Step::Moved => {
                    report.moved += 1;
                    *report.destinations.entry(bucket).or_insert(0) += 1;
                }
                Step::Vanished => report.vanished += 1,
                Step::Conflict => report.conflicts += 1,
                Step::Failed => report.failed += 1,
                Step::TimedOut => {
                    // The filesystem is stalled; leave the rest for the next cycle.
                    report.deferred += window.overflow.len() - done;
                    break;
                }
            }
        }

        Ok(report)
    }

    async fn move_one(
        &self,
        entry: &CaptureEntry,
        bucket: BucketKey,
        ensured: &mut HashSet<BucketKey>,
    ) -> Step {
        let class = entry.class;

        if !ensured.contains(&bucket) {
            match self.runner.call(move |store| store.ensure_bucket(class, bucket)).await {
                Ok(_) => {
                    ensured.insert(bucket);
                }
                Err(OpError::Timeout) => {
                    tracing::warn!(class = %class, bucket = %bucket, "Timed out creating bucket, deferring");
                    return Step::TimedOut;
                }
                Err(e) => {
                    tracing::warn!(class = %class, bucket = %bucket, error = ?e, "Cannot prepare bucket");
                    return Step::Failed;
                }
            }
        }

        let owned = entry.clone();
        match self.runner.call(move |store| store.archive(&owned, bucket)).await {
            Ok(RelocateOutcome::Moved(dest)) => {
                tracing::debug!(class = %class, file = %entry.name, dest = %dest.display(), "Archived");
                Step::Moved
            }
            Ok(RelocateOutcome::Vanished) => {
                tracing::debug!(class = %class, file = %entry.name, "Already gone, skipping");
                Step::Vanished
            }
            Err(OpError::Store(e)) if e.kind() == FaultKind::Conflict => {
                tracing::warn!(class = %class, file = %entry.name, bucket = %bucket, error = %e, "Name taken in bucket, leaving hot");
                Step::Conflict
            }
            Err(OpError::Store(e)) => {
                tracing::warn!(class = %class, file = %entry.name, error = %e, "Archive failed, will retry next pass");
                Step::Failed
            }
            Err(OpError::Timeout) => {
                tracing::warn!(class = %class, file = %entry.name, "Archive timed out, deferring");
                Step::TimedOut
            }
            Err(OpError::Join(msg)) => {
                tracing::warn!(class = %class, file = %entry.name, error = %msg, "Archive task failed");
                Step::Failed
            }
        }
    }
}
