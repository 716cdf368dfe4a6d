//! Caplife Janitor
//!
//! Background lifecycle service for the hot/cold capture tree.
//!
//! # Overview
//!
//! The Janitor is responsible for:
//! - **Archiving**: moving hot overflow (everything beyond the newest `hot_capacity`
//!   files of a class) into hour-of-day cold buckets
//! - **Retention**: emptying cold buckets whose newest member is older than the
//!   class's `cold_retention`
//! - **Serialization**: never letting the two touch the same class at once
//! - **Metrics and health**: aggregated counts and a readiness signal for whatever
//!   supervises the process
//!
//! # Lifecycle
//!
//! | Class | Hot capacity | Cold retention |
//! |-------|--------------|----------------|
//! | **Segment** | 10 | 24 hours |
//! | **Capture** | 100 | 1 hour |
//! | **Thumbnail** | 100 | 24 hours |
//! | **Metadata** | 100 | 24 hours |
//!
//! Files only move forward: hot -> cold bucket -> deleted. Every move is one
//! atomic rename; the filesystem is the only state, so a restarted janitor simply
//! picks up whatever work is still visible on disk.
//!
//! # Usage
//!
//! ## One-time Pass
//!
//! ```no_run
//! use caplife_janitor::{Janitor, JanitorConfig};
//! use caplife_store::FsStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = JanitorConfig::default();
//! let janitor = Janitor::new(FsStore::new(&config.root), config)?;
//!
//! janitor.archive_all().await;
//! janitor.sweep_all().await;
//! println!("{}", janitor.metrics().summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Background Worker
//!
//! ```no_run
//! use caplife_janitor::{Janitor, JanitorConfig, JanitorWorker};
//! use caplife_store::FsStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = JanitorConfig::default();
//!     let janitor = Janitor::new(FsStore::new(&config.root), config)?;
//!
//!     // Run indefinitely (until Ctrl+C)
//!     JanitorWorker::new(janitor).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! root = "/var/www/stream/capture1"
//! bucket_clock = "local"
//! archive_interval_secs = 10
//! sweep_interval_minutes = 60
//! operation_timeout_ms = 5000
//! dry_run = false
//! collision_policy = "purge_expired"
//!
//! [classes.segments]
//! hot_capacity = 10
//! cold_retention_minutes = 1440
//!
//! [classes.captures]
//! hot_capacity = 100
//! cold_retention_minutes = 60
//! ```

#![warn(missing_docs)]

mod archiver;
mod config;
mod error;
mod health;
mod janitor;
mod metrics;
mod runner;
mod sweeper;
mod worker;

pub use archiver::{ArchiveReport, Archiver};
pub use config::{BucketClockSetting, ClassPolicy, CollisionPolicy, JanitorConfig};
pub use error::JanitorError;
pub use health::{Alert, HealthReport, HealthState};
pub use janitor::{Cycle, Janitor};
pub use metrics::{ClassCounters, JanitorMetrics};
pub use sweeper::{RetentionSweeper, SweepReport};
pub use worker::JanitorWorker;
