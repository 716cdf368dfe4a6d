//! Migration execution

use crate::error::Result;
use crate::plan::{ClassPlan, MigrationPlan, PlannedMove};
use crate::report::{ClassReport, Counts, FailedMove, MigrationReport};
use caplife_domain::{ArtifactClass, Location, Mode, RelocateOutcome};
use caplife_store::{list_classified, relocate_into, CaptureLayout, FsStore, StoreError};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Applies a [`MigrationPlan`] in either mode
///
/// Dry-run and execute walk the same plan through the same loop; the mode only
/// decides whether the rename happens. Every move is one atomic rename into the
/// destination directory, the same primitive the archiver uses.
///
/// # Examples
///
/// ```no_run
/// use caplife_domain::Mode;
/// use caplife_migrate::{MigrateOptions, MigrationPlan, Migrator};
/// use std::path::Path;
///
/// # fn main() -> Result<(), caplife_migrate::MigrateError> {
/// let source = Path::new("/var/www/stream/capture1");
/// let plan = MigrationPlan::build(source, &MigrateOptions::default())?;
///
/// let report = Migrator::new(Mode::DryRun).apply(&plan, |failure| {
///     eprintln!("failed: {} ({})", failure.path.display(), failure.reason);
/// })?;
/// println!("{} files would move", report.total_planned());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Migrator {
    mode: Mode,
}

impl Migrator {
    /// Migrator running in `mode`
    pub fn new(mode: Mode) -> Self {
        Self { mode }
    }

    /// Mode this migrator runs in
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Run the plan, calling `on_failure` as soon as a file fails
    ///
    /// A failed file never stops the batch; every remaining file is still
    /// attempted.
    ///
    /// # Errors
    ///
    /// Fails only if the before/after counts cannot be taken.
    pub fn apply(&self, plan: &MigrationPlan, mut on_failure: impl FnMut(&FailedMove)) -> Result<MigrationReport> {
        let layout = CaptureLayout::new(&plan.target);
        let store = FsStore::new(&plan.target);

        let mut report = MigrationReport {
            source: plan.source.clone(),
            dry_run: self.mode.is_dry_run(),
            classes: Vec::with_capacity(plan.classes.len()),
            unclassified: plan.unclassified.len(),
            failures: Vec::new(),
        };

        for class_plan in &plan.classes {
            let class = class_plan.class;
            let before = Counts {
                flat: class_plan.moves.len(),
                ..placed_counts(&store, class)?
            };

            let mut class_report = ClassReport {
                class,
                before,
                after: before,
                to_hot: class_plan.to_hot(),
                to_cold: class_plan.to_cold(),
                moved: 0,
                vanished: 0,
                failed: 0,
                buckets: class_plan
                    .destinations()
                    .into_iter()
                    .map(|(bucket, count)| (bucket.hour(), count))
                    .collect(),
            };

            if self.mode.is_dry_run() {
                for planned in &class_plan.moves {
                    tracing::info!(class = %class, file = %planned.entry.name, to = %planned.to, "DRY RUN: would move");
                }
                class_report.after = Counts {
                    flat: 0,
                    hot: before.hot + class_report.to_hot,
                    cold: before.cold + class_report.to_cold,
                };
            } else {
                self.execute_class(&layout, class_plan, &mut class_report, &mut report.failures, &mut on_failure);
                class_report.after = Counts {
                    flat: flat_count(&plan.source, class)?,
                    ..placed_counts(&store, class)?
                };
                tracing::info!(
                    class = %class,
                    moved = class_report.moved,
                    failed = class_report.failed,
                    "Class migrated"
                );
            }

            report.classes.push(class_report);
        }

        Ok(report)
    }

    fn execute_class(
        &self,
        layout: &CaptureLayout,
        plan: &ClassPlan,
        report: &mut ClassReport,
        failures: &mut Vec<FailedMove>,
        on_failure: &mut impl FnMut(&FailedMove),
    ) {
        let mut prepared: HashMap<Location, PathBuf> = HashMap::new();

        for planned in &plan.moves {
            match move_one(layout, planned, &mut prepared) {
                Ok(RelocateOutcome::Moved(dest)) => {
                    tracing::debug!(file = %planned.entry.name, dest = %dest.display(), "Moved");
                    report.moved += 1;
                }
                Ok(RelocateOutcome::Vanished) => {
                    tracing::debug!(file = %planned.entry.name, "Already gone, skipping");
                    report.vanished += 1;
                }
                Err(reason) => {
                    tracing::warn!(file = %planned.entry.name, to = %planned.to, error = %reason, "Move failed");
                    let failure = FailedMove {
                        path: planned.entry.path.clone(),
                        to: planned.to,
                        reason,
                    };
                    on_failure(&failure);
                    failures.push(failure);
                    report.failed += 1;
                }
            }
        }
    }
}

fn move_one(
    layout: &CaptureLayout,
    planned: &PlannedMove,
    prepared: &mut HashMap<Location, PathBuf>,
) -> std::result::Result<RelocateOutcome, String> {
    if !Location::FlatLegacy.can_transition_to(planned.to) {
        return Err(format!("illegal transition flat -> {}", planned.to));
    }

    let dir = match prepared.get(&planned.to) {
        Some(dir) => dir.clone(),
        None => {
            let dir = match planned.to {
                Location::Cold(bucket) => layout.bucket_dir(planned.entry.class, bucket),
                _ => layout.class_dir(planned.entry.class),
            };
            fs::create_dir_all(&dir).map_err(|e| format!("cannot create {}: {}", dir.display(), e))?;
            prepared.insert(planned.to, dir.clone());
            dir
        }
    };

    relocate_into(&planned.entry, &dir).map_err(|e| e.to_string())
}

fn placed_counts(store: &FsStore, class: ArtifactClass) -> Result<Counts> {
    match store.occupancy(class) {
        Ok(occupancy) => Ok(Counts {
            flat: 0,
            hot: occupancy.hot,
            cold: occupancy.cold_total(),
        }),
        // Not created yet
        Err(StoreError::Structural { .. }) => Ok(Counts::default()),
        Err(e) => Err(e.into()),
    }
}

fn flat_count(source: &Path, class: ArtifactClass) -> Result<usize> {
    Ok(list_classified(source)?.iter().filter(|e| e.class == class).count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MigrateOptions;
    use caplife_domain::BucketClock;
    use std::collections::BTreeMap;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, secs: u64) {
        let file = fs::File::create(dir.join(name)).unwrap();
        file.set_modified(UNIX_EPOCH + Duration::from_secs(secs)).unwrap();
    }

    #[test]
    fn test_dry_run_projects_after_counts() {
        let dir = TempDir::new().unwrap();
        for i in 1..=5 {
            touch(dir.path(), &format!("metadata_{}.json", i), i * 60);
        }
        let options = MigrateOptions {
            capacities: [(ArtifactClass::Metadata, 3)].into(),
            bucket_clock: BucketClock::Utc,
            target_root: None,
        };
        let plan = MigrationPlan::build(dir.path(), &options).unwrap();
        let report = Migrator::new(Mode::DryRun).apply(&plan, |_| {}).unwrap();

        let metadata = report.class(ArtifactClass::Metadata).unwrap();
        assert_eq!(metadata.before, Counts { flat: 5, hot: 0, cold: 0 });
        assert_eq!(metadata.after, Counts { flat: 0, hot: 3, cold: 2 });
        assert_eq!(metadata.buckets, BTreeMap::from([(0, 2)]));
        assert!(!dir.path().join("metadata").exists());
    }

    #[test]
    fn test_illegal_destination_reported_not_moved() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "segment_1.ts", 10);
        let mut plan = MigrationPlan::build(dir.path(), &MigrateOptions::default()).unwrap();
        let segments = plan
            .classes
            .iter_mut()
            .find(|c| c.class == ArtifactClass::Segment)
            .unwrap();
        segments.moves[0].to = Location::Deleted;

        let mut seen = Vec::new();
        let report = Migrator::new(Mode::Execute)
            .apply(&plan, |f| seen.push(f.path.clone()))
            .unwrap();

        assert_eq!(report.total_failed(), 1);
        assert_eq!(seen, vec![dir.path().join("segment_1.ts")]);
        assert!(dir.path().join("segment_1.ts").exists());
    }
}
