//! Metrics collection for Janitor operations

use crate::{ArchiveReport, SweepReport};
use caplife_domain::ArtifactClass;
use std::collections::BTreeMap;

/// Counters for one artifact class
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassCounters {
    /// Files moved hot -> cold
    pub archived: usize,

    /// Files that disappeared before they could be moved or deleted
    pub vanished: usize,

    /// Files left in place after a transient I/O failure
    pub skipped: usize,

    /// Files deferred to the next cycle after a timeout
    pub deferred: usize,

    /// Files left in place because the destination name was taken
    pub conflicts: usize,

    /// Cold files deleted by retention
    pub purged_files: usize,

    /// Cold buckets emptied by retention
    pub purged_buckets: usize,

    /// Buckets found holding more than one day's content
    pub collisions: usize,

    /// Passes aborted by a structural failure
    pub structural_alerts: usize,
}

impl ClassCounters {
    /// Problems that need no operator action but indicate retries
    pub fn error_count(&self) -> usize {
        self.skipped + self.deferred + self.conflicts + self.structural_alerts
    }
}

/// Metrics collected during Janitor operations
///
/// Tracks per-class archive and retention activity plus pass counts.
#[derive(Debug, Clone, Default)]
pub struct JanitorMetrics {
    /// Counters per class
    pub classes: BTreeMap<ArtifactClass, ClassCounters>,

    /// Archive passes completed (one per tick, across all classes)
    pub archive_passes: usize,

    /// Sweep passes completed
    pub sweep_passes: usize,

    /// Total time spent inside passes, in milliseconds
    pub total_runtime_ms: u64,
}

impl JanitorMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&mut self, class: ArtifactClass) -> &mut ClassCounters {
        self.classes.entry(class).or_default()
    }

    /// Record the outcome of one class's archive pass
    pub fn record_archive(&mut self, report: &ArchiveReport) {
        let counters = self.counters(report.class);
        counters.archived += report.moved;
        counters.vanished += report.vanished;
        counters.skipped += report.failed;
        counters.deferred += report.deferred;
        counters.conflicts += report.conflicts;
    }

    /// Record the outcome of one class's sweep pass
    pub fn record_sweep(&mut self, report: &SweepReport) {
        let counters = self.counters(report.class);
        counters.purged_files += report.files_purged;
        counters.purged_buckets += report.buckets_purged;
        counters.vanished += report.vanished;
        counters.skipped += report.failed;
        counters.deferred += report.deferred;
        counters.collisions += report.collisions;
    }

    /// Record a pass aborted by a structural failure
    pub fn record_alert(&mut self, class: ArtifactClass) {
        self.counters(class).structural_alerts += 1;
    }

    /// Record a pass aborted by a timeout on its listing
    pub fn record_deferred_pass(&mut self, class: ArtifactClass) {
        self.counters(class).deferred += 1;
    }

    /// Record an archive tick completion
    pub fn record_archive_pass(&mut self, runtime_ms: u64) {
        self.archive_passes += 1;
        self.total_runtime_ms += runtime_ms;
    }

    /// Record a sweep tick completion
    pub fn record_sweep_pass(&mut self, runtime_ms: u64) {
        self.sweep_passes += 1;
        self.total_runtime_ms += runtime_ms;
    }

    /// Get total files archived across all classes
    pub fn total_archived(&self) -> usize {
        self.classes.values().map(|c| c.archived).sum()
    }

    /// Get total cold files purged across all classes
    pub fn total_purged(&self) -> usize {
        self.classes.values().map(|c| c.purged_files).sum()
    }

    /// Aggregated error/skip count across all classes
    pub fn total_errors(&self) -> usize {
        self.classes.values().map(ClassCounters::error_count).sum()
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        self.classes.clear();
        self.archive_passes = 0;
        self.sweep_passes = 0;
        self.total_runtime_ms = 0;
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Janitor Metrics Summary".to_string(),
            "======================".to_string(),
            format!("Archive passes: {}", self.archive_passes),
            format!("Sweep passes: {}", self.sweep_passes),
            format!("Total runtime: {}ms", self.total_runtime_ms),
            String::new(),
        ];

        for (class, c) in &self.classes {
            lines.push(format!("{}:", class));
            lines.push(format!("  archived: {}, vanished: {}", c.archived, c.vanished));
            lines.push(format!(
                "  purged: {} files in {} buckets, collisions: {}",
                c.purged_files, c.purged_buckets, c.collisions
            ));
            if c.error_count() > 0 {
                lines.push(format!(
                    "  skipped: {}, deferred: {}, conflicts: {}, alerts: {}",
                    c.skipped, c.deferred, c.conflicts, c.structural_alerts
                ));
            }
        }

        lines.push(format!("Total archived: {}", self.total_archived()));
        lines.push(format!("Total purged: {}", self.total_purged()));
        lines.push(format!("Total errors: {}", self.total_errors()));
        lines.join("\n")
    }
}
