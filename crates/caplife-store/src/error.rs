//! Error types for filesystem operations

use caplife_domain::{FaultKind, StoreFault};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while touching the capture tree
#[derive(Error, Debug)]
pub enum StoreError {
    /// Expected directory missing or not a directory
    #[error("Structural error at {}: {reason}", path.display())]
    Structural {
        /// Offending path
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// Per-file I/O failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being operated on
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Destination already holds a file with the same name
    #[error("Destination already exists: {}", .0.display())]
    Conflict(PathBuf),

    /// Source and destination are on different filesystems
    #[error("Cannot rename across filesystems: {}", .0.display())]
    CrossDevice(PathBuf),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn structural(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        StoreError::Structural {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl StoreFault for StoreError {
    fn kind(&self) -> FaultKind {
        match self {
            StoreError::Structural { .. } => FaultKind::Structural,
            StoreError::Conflict(_) => FaultKind::Conflict,
            StoreError::Io { .. } | StoreError::CrossDevice(_) => FaultKind::Transient,
        }
    }
}
