//! Error types for Janitor operations

use caplife_domain::ArtifactClass;
use thiserror::Error;

/// Errors that can occur during Janitor operations
#[derive(Error, Debug)]
pub enum JanitorError {
    /// Invalid configuration (fatal at startup only)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Expected directory missing or of the wrong type; aborts the class's pass
    #[error("Structural error in {class}: {reason}")]
    Structural {
        /// Affected class
        class: ArtifactClass,
        /// What was wrong
        reason: String,
    },

    /// Non-structural storage failure that prevented a whole pass
    #[error("Storage error in {class}: {reason}")]
    Store {
        /// Affected class
        class: ArtifactClass,
        /// Underlying error
        reason: String,
    },

    /// A filesystem call did not finish within the operation timeout
    #[error("Timed out during {op} for {class}")]
    Timeout {
        /// Affected class
        class: ArtifactClass,
        /// Operation that stalled
        op: &'static str,
    },

    /// Worker error (tokio runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),
}

impl JanitorError {
    /// Whether this failure should be surfaced as an alert
    pub fn is_alert(&self) -> bool {
        matches!(self, JanitorError::Structural { .. } | JanitorError::Store { .. })
    }
}
