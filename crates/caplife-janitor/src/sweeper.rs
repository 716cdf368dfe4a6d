//! Cold bucket retention

use crate::config::CollisionPolicy;
use crate::runner::{BlockingStore, OpError};
use crate::JanitorError;
use caplife_domain::{
    ArtifactClass, BucketAssessment, BucketKey, CaptureEntry, CaptureStore, Clock, Location, Mode,
};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::watch;

/// Outcome of one class's sweep pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Class that was processed
    pub class: ArtifactClass,

    /// Non-empty buckets inspected
    pub buckets_inspected: usize,

    /// Buckets emptied
    pub buckets_purged: usize,

    /// Files deleted
    pub files_purged: usize,

    /// Files that would have been deleted (dry run)
    pub planned: usize,

    /// Files already gone when their turn came
    pub vanished: usize,

    /// Deletions or listings that failed
    pub failed: usize,

    /// Operations deferred to the next cycle after a timeout
    pub deferred: usize,

    /// Buckets holding more than one day's content
    pub collisions: usize,

    /// Pass stopped early on shutdown
    pub cancelled: bool,
}

impl SweepReport {
    /// Empty report for a class
    pub fn new(class: ArtifactClass) -> Self {
        Self {
            class,
            buckets_inspected: 0,
            buckets_purged: 0,
            files_purged: 0,
            planned: 0,
            vanished: 0,
            failed: 0,
            deferred: 0,
            collisions: 0,
            cancelled: false,
        }
    }
}

/// Deletes cold bucket content once it ages past the class retention
///
/// Age is measured per bucket from its newest member; a bucket is either purged
/// whole or left alone. The bucket directory itself is kept for reuse.
pub struct RetentionSweeper<S> {
    runner: BlockingStore<S>,
    clock: Arc<dyn Clock>,
    collision_policy: CollisionPolicy,
    mode: Mode,
    shutdown: watch::Receiver<bool>,
}

impl<S: CaptureStore> RetentionSweeper<S> {
    pub(crate) fn new(
        runner: BlockingStore<S>,
        clock: Arc<dyn Clock>,
        collision_policy: CollisionPolicy,
        mode: Mode,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            runner,
            clock,
            collision_policy,
            mode,
            shutdown,
        }
    }

    /// Sweep all 24 buckets of a class
    ///
    /// # Errors
    ///
    /// Fails only when the class directory itself is missing or unreadable.
    pub async fn run_pass(&self, class: ArtifactClass, retention: Duration) -> Result<SweepReport, JanitorError> {
        self.runner
            .call(move |store| store.check_class_dir(class))
            .await
            .map_err(|e| e.into_pass_error(class, "check_class_dir"))?;

        let mut report = SweepReport::new(class);
        for bucket in BucketKey::all() {
            if *self.shutdown.borrow() {
                report.cancelled = true;
                break;
            }

            let entries = match self.runner.call(move |store| store.list_bucket(class, bucket)).await {
                Ok(entries) => entries,
                Err(OpError::Timeout) => {
                    tracing::warn!(class = %class, bucket = %bucket, "Listing bucket timed out, deferring sweep");
                    report.deferred += 1;
                    break;
                }
                Err(e) => {
                    tracing::warn!(class = %class, bucket = %bucket, error = ?e, "Cannot list bucket");
                    report.failed += 1;
                    continue;
                }
            };

            let Some(assessment) = BucketAssessment::assess(&entries) else {
                continue;
            };
            report.buckets_inspected += 1;

            let now = self.clock.now();
            let doomed = self.select_doomed(class, bucket, entries, &assessment, now, retention, &mut report);
            if doomed.is_empty() {
                continue;
            }
            debug_assert!(Location::Cold(bucket).can_transition_to(Location::Deleted));

            if self.mode.is_dry_run() {
                tracing::info!(class = %class, bucket = %bucket, files = doomed.len(), "DRY RUN: would purge");
                report.planned += doomed.len();
                continue;
            }

            let whole_bucket = doomed.len() == assessment.count;
            match self.purge(class, bucket, &doomed, &mut report).await {
                PurgeResult::Complete if whole_bucket => {
                    report.buckets_purged += 1;
                    tracing::info!(class = %class, bucket = %bucket, files = doomed.len(), "Purged expired bucket");
                }
                PurgeResult::Complete | PurgeResult::Partial => {}
                PurgeResult::Stalled => break,
            }
        }

        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    fn select_doomed(
        &self,
        class: ArtifactClass,
        bucket: BucketKey,
        entries: Vec<CaptureEntry>,
        assessment: &BucketAssessment,
        now: SystemTime,
        retention: Duration,
        report: &mut SweepReport,
    ) -> Vec<CaptureEntry> {
        let mixed = assessment.is_mixed_generation();
        if mixed {
            report.collisions += 1;
            tracing::warn!(
                class = %class,
                bucket = %bucket,
                files = assessment.count,
                "Bucket holds content from more than one day"
            );
        }

        if assessment.is_expired(now, retention) {
            return entries;
        }
        if mixed && self.collision_policy == CollisionPolicy::PurgeExpired {
            return entries
                .into_iter()
                .filter(|e| now.duration_since(e.modified).map(|age| age > retention).unwrap_or(false))
                .collect();
        }
        Vec::new()
    }

    async fn purge(
        &self,
        class: ArtifactClass,
        bucket: BucketKey,
        doomed: &[CaptureEntry],
        report: &mut SweepReport,
    ) -> PurgeResult {
        let mut result = PurgeResult::Complete;
        for (done, entry) in doomed.iter().enumerate() {
            if *self.shutdown.borrow() {
                report.cancelled = true;
                return PurgeResult::Stalled;
            }

            let owned = entry.clone();
            match self.runner.call(move |store| store.remove(&owned)).await {
                Ok(true) => report.files_purged += 1,
                Ok(false) => report.vanished += 1,
                Err(OpError::Timeout) => {
                    tracing::warn!(class = %class, bucket = %bucket, file = %entry.name, "Delete timed out, deferring");
                    report.deferred += doomed.len() - done;
                    return PurgeResult::Stalled;
                }
                Err(e) => {
                    tracing::warn!(class = %class, bucket = %bucket, file = %entry.name, error = ?e, "Delete failed");
                    report.failed += 1;
                    result = PurgeResult::Partial;
                }
            }
        }
        result
    }
}

enum PurgeResult {
    Complete,
    Partial,
    Stalled,
}
