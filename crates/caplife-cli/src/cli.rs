//! CLI command definitions and argument parsing.

use caplife_domain::ArtifactClass;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Caplife - hot/cold lifecycle management for capture directories.
#[derive(Debug, Parser)]
#[command(name = "caplife")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "CAPLIFE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// Bucket clock options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ClockArg {
    /// UTC hours
    Utc,
    /// Host local hours
    Local,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert a flat legacy capture directory to the hot/cold layout
    Migrate(MigrateArgs),

    /// Delete superseded legacy files from migrated cold buckets
    Cleanup(CleanupArgs),

    /// Run the archiver and retention sweeper until interrupted
    Run(RunArgs),

    /// Show hot and cold occupancy per class
    Status(StatusArgs),
}

/// Arguments for the migrate command.
#[derive(Debug, Parser)]
pub struct MigrateArgs {
    /// Flat directory holding the legacy captures
    pub capture_dir: PathBuf,

    /// Perform the moves (default is a dry run)
    #[arg(long)]
    pub execute: bool,

    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Capture root to migrate into (defaults to the capture directory)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Override a class's hot capacity, e.g. `segments=2` (repeatable)
    #[arg(long = "hot-capacity", value_parser = parse_capacity)]
    pub hot_capacity: Vec<(ArtifactClass, usize)>,

    /// Clock used to name cold buckets
    #[arg(long, value_enum)]
    pub bucket_clock: Option<ClockArg>,
}

/// Arguments for the cleanup command.
#[derive(Debug, Parser)]
pub struct CleanupArgs {
    /// Stream base: a capture root or a directory of capture roots
    pub stream_base: PathBuf,

    /// Report what would be deleted without deleting
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Capture root (overrides the configuration)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Mirror the health report to this JSON file after every pass
    #[arg(long)]
    pub health_file: Option<PathBuf>,

    /// Log moves and deletions without performing them
    #[arg(long)]
    pub dry_run: bool,

    /// Run one archive and sweep cycle, then exit
    #[arg(long)]
    pub once: bool,
}

/// Arguments for the status command.
#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Capture root (overrides the configuration)
    pub root: Option<PathBuf>,

    /// Health file written by `caplife run --health-file`
    #[arg(long)]
    pub health_file: Option<PathBuf>,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}

impl From<ClockArg> for caplife_domain::BucketClock {
    fn from(clock: ClockArg) -> Self {
        match clock {
            ClockArg::Utc => caplife_domain::BucketClock::Utc,
            ClockArg::Local => caplife_domain::BucketClock::Local,
        }
    }
}

/// Parse `class=N`.
fn parse_capacity(s: &str) -> Result<(ArtifactClass, usize), String> {
    let (class, count) = s
        .split_once('=')
        .ok_or_else(|| format!("expected CLASS=N, got '{}'", s))?;
    let class = ArtifactClass::parse(class.trim()).ok_or_else(|| format!("unknown class '{}'", class))?;
    let count: usize = count
        .trim()
        .parse()
        .map_err(|_| format!("invalid capacity '{}'", count))?;
    if count == 0 {
        return Err("capacity must be at least 1".into());
    }
    Ok((class, count))
}
