//! Capture unit locations and the lifecycle state machine

use crate::BucketKey;
use std::fmt;

/// Where a capture unit currently lives
///
/// A unit is visible in exactly one location at a time. Transitions only move
/// forward:
///
/// ```text
/// FlatLegacy --> Hot --> Cold(h) --> Deleted
///      \_______________/
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    /// Pre-migration flat directory
    FlatLegacy,

    /// Hot working set at the class root
    Hot,

    /// Cold archive bucket
    Cold(BucketKey),

    /// Purged by retention (terminal)
    Deleted,
}

impl Location {
    /// Whether the lifecycle allows moving from `self` to `to`
    pub fn can_transition_to(&self, to: Location) -> bool {
        matches!(
            (self, to),
            (Location::FlatLegacy, Location::Hot)
                | (Location::FlatLegacy, Location::Cold(_))
                | (Location::Hot, Location::Cold(_))
                | (Location::Cold(_), Location::Deleted)
        )
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::FlatLegacy => f.write_str("flat"),
            Location::Hot => f.write_str("hot"),
            Location::Cold(bucket) => write!(f, "cold/{}", bucket),
            Location::Deleted => f.write_str("deleted"),
        }
    }
}

/// Whether a pass only reports its plan or actually performs it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Compute and report, touch nothing
    #[default]
    DryRun,

    /// Perform the moves
    Execute,
}

impl Mode {
    /// True for [`Mode::DryRun`]
    pub fn is_dry_run(&self) -> bool {
        matches!(self, Mode::DryRun)
    }

    /// Mode from a dry-run flag
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run {
            Mode::DryRun
        } else {
            Mode::Execute
        }
    }
}
