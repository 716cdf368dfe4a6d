//! Error types for migration and cleanup

use caplife_store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a migration or cleanup run as a whole
///
/// Failures of individual files are not errors at this level; they are
/// collected in the run's report.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Source directory missing or not a directory
    #[error("Structural error at {}: {reason}", path.display())]
    Structural {
        /// Offending path
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// I/O failure that prevented building the plan
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Operator did not confirm execution
    #[error("Migration aborted: confirmation refused")]
    Aborted,
}

impl From<StoreError> for MigrateError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Structural { path, reason } => MigrateError::Structural { path, reason },
            StoreError::Io { path, source } => MigrateError::Io { path, source },
            StoreError::Conflict(path) => MigrateError::Structural {
                path,
                reason: "unexpected existing file".into(),
            },
            StoreError::CrossDevice(path) => MigrateError::Structural {
                path,
                reason: "crosses filesystems".into(),
            },
        }
    }
}

/// Result type for migration operations
pub type Result<T> = std::result::Result<T, MigrateError>;
