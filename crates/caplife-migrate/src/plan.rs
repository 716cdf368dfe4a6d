//! Migration planning
//!
//! A plan is derived purely from what is still sitting in the flat directory.
//! Files moved by an earlier, interrupted run are no longer there, so planning
//! again after a crash yields exactly the work that is left.

use crate::error::{MigrateError, Result};
use caplife_domain::{ArtifactClass, BucketClock, BucketKey, CaptureEntry, HotWindow, Location};
use caplife_store::list_classified;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Options steering how flat files are distributed
#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    /// Hot capacity per class; classes not listed use their built-in default
    pub capacities: BTreeMap<ArtifactClass, usize>,

    /// Wall clock used to name cold buckets
    pub bucket_clock: BucketClock,

    /// Capture root receiving the class directories (defaults to the flat directory itself)
    pub target_root: Option<PathBuf>,
}

impl MigrateOptions {
    /// Hot capacity for a class
    pub fn capacity(&self, class: ArtifactClass) -> usize {
        self.capacities
            .get(&class)
            .copied()
            .unwrap_or_else(|| class.default_hot_capacity())
    }
}

/// One file and where it is going
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    /// File as found in the flat directory
    pub entry: CaptureEntry,

    /// Destination location
    pub to: Location,
}

/// Moves for one class, in execution order (oldest first)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassPlan {
    /// Artifact class
    pub class: ArtifactClass,

    /// Planned moves, oldest file first
    pub moves: Vec<PlannedMove>,
}

impl ClassPlan {
    /// Files headed for the hot directory
    pub fn to_hot(&self) -> usize {
        self.moves.iter().filter(|m| m.to == Location::Hot).count()
    }

    /// Files headed for a cold bucket
    pub fn to_cold(&self) -> usize {
        self.moves.len() - self.to_hot()
    }

    /// Cold destinations with their file counts
    pub fn destinations(&self) -> BTreeMap<BucketKey, usize> {
        let mut destinations = BTreeMap::new();
        for planned in &self.moves {
            if let Location::Cold(bucket) = planned.to {
                *destinations.entry(bucket).or_insert(0) += 1;
            }
        }
        destinations
    }
}

/// Full move plan for one flat directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    /// Flat legacy directory
    pub source: PathBuf,

    /// Capture root receiving the class directories
    pub target: PathBuf,

    /// Per-class plans, in `ArtifactClass::ALL` order
    pub classes: Vec<ClassPlan>,

    /// Files in the flat directory that match no class (left untouched)
    pub unclassified: Vec<PathBuf>,
}

impl MigrationPlan {
    /// Build the plan for `source`
    ///
    /// Within each class the newest `capacity` files go to hot and every older
    /// file goes to the cold bucket of its mtime hour. Ranking uses the same
    /// newest-first order as the archiver, so the migrated tree is exactly what
    /// the archiver would have produced.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Structural`] if `source` is missing or not a directory.
    pub fn build(source: &Path, options: &MigrateOptions) -> Result<Self> {
        let entries = list_classified(source)?;
        let unclassified = unclassified_files(source)?;

        let mut by_class: BTreeMap<ArtifactClass, Vec<CaptureEntry>> = BTreeMap::new();
        for entry in entries {
            by_class.entry(entry.class).or_default().push(entry);
        }

        let classes = ArtifactClass::ALL
            .into_iter()
            .map(|class| {
                let entries = by_class.remove(&class).unwrap_or_default();
                plan_class(class, entries, options)
            })
            .collect();

        Ok(Self {
            source: source.to_path_buf(),
            target: options.target_root.clone().unwrap_or_else(|| source.to_path_buf()),
            classes,
            unclassified,
        })
    }

    /// Plan for one class
    pub fn class(&self, class: ArtifactClass) -> Option<&ClassPlan> {
        self.classes.iter().find(|plan| plan.class == class)
    }

    /// Total planned moves
    pub fn len(&self) -> usize {
        self.classes.iter().map(|plan| plan.moves.len()).sum()
    }

    /// True if nothing is left to migrate
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn plan_class(class: ArtifactClass, entries: Vec<CaptureEntry>, options: &MigrateOptions) -> ClassPlan {
    let window = HotWindow::partition(entries, options.capacity(class));

    // Both halves are newest first; reversing the concatenation gives oldest first.
    let mut moves: Vec<PlannedMove> = window
        .keep
        .into_iter()
        .map(|entry| PlannedMove { entry, to: Location::Hot })
        .chain(window.overflow.into_iter().map(|entry| {
            let bucket = BucketKey::for_time(entry.modified, options.bucket_clock);
            PlannedMove {
                entry,
                to: Location::Cold(bucket),
            }
        }))
        .collect();
    moves.reverse();

    ClassPlan { class, moves }
}

fn unclassified_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let reader = fs::read_dir(dir).map_err(|source| MigrateError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for item in reader.flatten() {
        let path = item.path();
        let is_file = item.file_type().map(|t| t.is_file()).unwrap_or(false);
        let classified = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(caplife_domain::classify_name)
            .is_some();
        if is_file && !classified {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
