//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Janitor error
    #[error(transparent)]
    Janitor(#[from] caplife_janitor::JanitorError),

    /// Migration or cleanup error
    #[error(transparent)]
    Migrate(#[from] caplife_migrate::MigrateError),

    /// Store error
    #[error(transparent)]
    Store(#[from] caplife_store::StoreError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The command ran to completion but some items failed
    #[error("{0}")]
    Incomplete(String),
}
