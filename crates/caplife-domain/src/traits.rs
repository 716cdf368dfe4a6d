//! Trait definitions for external interactions
//!
//! These traits define the boundaries between lifecycle logic and infrastructure.
//! The filesystem implementation lives in caplife-store.

use crate::{ArtifactClass, BucketKey, CaptureEntry};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

/// Source of "now" for age computations
///
/// Injected so retention and scheduling can be tested deterministically.
pub trait Clock: Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> SystemTime;
}

/// Clock backed by the operating system
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Manually driven clock for tests and simulations
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<SystemTime>,
}

impl ManualClock {
    /// Create a clock frozen at `now`
    pub fn new(now: SystemTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Jump to an absolute time
    pub fn set(&self, now: SystemTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// How a store failure should be treated by the lifecycle engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Expected directory missing or of the wrong type. Aborts the class's pass.
    Structural,

    /// Per-file failure (permission, lock, disk full). Retried next pass.
    Transient,

    /// Destination name already taken. The file stays where it is.
    Conflict,
}

/// Error types returned by a [`CaptureStore`] classify themselves
pub trait StoreFault: std::error::Error + Send + Sync + 'static {
    /// Classification of this failure
    fn kind(&self) -> FaultKind;
}

/// Result of a single relocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocateOutcome {
    /// File now lives at the given path
    Moved(PathBuf),

    /// Source was already gone (moved by another process)
    Vanished,
}

/// Trait for inspecting and mutating the capture tree
///
/// Implemented by the infrastructure layer (caplife-store). Every method is a
/// blocking call; async callers are expected to offload and time-bound them.
pub trait CaptureStore: Send + Sync + 'static {
    /// Error type for store operations
    type Error: StoreFault;

    /// Fail with a structural error unless the class's hot directory exists
    fn check_class_dir(&self, class: ArtifactClass) -> Result<(), Self::Error>;

    /// List classified files directly in the class's hot directory
    fn list_hot(&self, class: ArtifactClass) -> Result<Vec<CaptureEntry>, Self::Error>;

    /// List classified files in one cold bucket. A missing bucket lists as empty.
    fn list_bucket(&self, class: ArtifactClass, bucket: BucketKey) -> Result<Vec<CaptureEntry>, Self::Error>;

    /// Create the bucket directory if needed and return its path
    fn ensure_bucket(&self, class: ArtifactClass, bucket: BucketKey) -> Result<PathBuf, Self::Error>;

    /// Atomically rename a file into a cold bucket, preserving its mtime
    fn archive(&self, entry: &CaptureEntry, bucket: BucketKey) -> Result<RelocateOutcome, Self::Error>;

    /// Delete one file. Returns `false` if it was already gone.
    fn remove(&self, entry: &CaptureEntry) -> Result<bool, Self::Error>;
}
