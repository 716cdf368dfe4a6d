//! Migration reports

use caplife_domain::{ArtifactClass, Location};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::PathBuf;

/// File counts of one class across the three places it can be
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    /// Still in the flat directory
    pub flat: usize,
    /// In the class's hot directory
    pub hot: usize,
    /// Across all cold buckets
    pub cold: usize,
}

impl Counts {
    /// All files of the class
    pub fn total(&self) -> usize {
        self.flat + self.hot + self.cold
    }
}

/// A file that could not be moved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedMove {
    /// Source path
    pub path: PathBuf,
    /// Intended destination
    #[serde(serialize_with = "display")]
    pub to: Location,
    /// Why it failed
    pub reason: String,
}

/// Per-class outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassReport {
    /// Artifact class
    #[serde(serialize_with = "display")]
    pub class: ArtifactClass,
    /// Counts before the run
    pub before: Counts,
    /// Counts after the run (projected in dry-run)
    pub after: Counts,
    /// Files planned for hot
    pub to_hot: usize,
    /// Files planned for cold
    pub to_cold: usize,
    /// Files actually moved
    pub moved: usize,
    /// Files gone before their move
    pub vanished: usize,
    /// Files that failed to move
    pub failed: usize,
    /// Cold destinations keyed by hour
    pub buckets: BTreeMap<u8, usize>,
}

/// Outcome of a migration run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Flat directory that was migrated
    pub source: PathBuf,
    /// Nothing was touched
    pub dry_run: bool,
    /// Per-class outcomes
    pub classes: Vec<ClassReport>,
    /// Files matching no class, left in place
    pub unclassified: usize,
    /// Every failed move, in the order encountered
    pub failures: Vec<FailedMove>,
}

impl MigrationReport {
    /// Files moved across all classes
    pub fn total_moved(&self) -> usize {
        self.classes.iter().map(|c| c.moved).sum()
    }

    /// Files planned across all classes
    pub fn total_planned(&self) -> usize {
        self.classes.iter().map(|c| c.to_hot + c.to_cold).sum()
    }

    /// Files that failed across all classes
    pub fn total_failed(&self) -> usize {
        self.failures.len()
    }

    /// True if no file failed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Report for one class
    pub fn class(&self, class: ArtifactClass) -> Option<&ClassReport> {
        self.classes.iter().find(|c| c.class == class)
    }
}

fn display<T: Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
