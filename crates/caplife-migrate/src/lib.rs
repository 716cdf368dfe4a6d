//! Caplife Migrate
//!
//! One-time conversion of a legacy flat capture directory into the hot/cold
//! layout, plus removal of legacy leftovers from already-migrated buckets.
//!
//! # Migration
//!
//! ```text
//! capture1/segment_1.ts          capture1/segments/14/segment_1.ts   (cold)
//! capture1/segment_2.ts    ==>   capture1/segments/segment_2.ts      (hot)
//! capture1/segment_3.ts          capture1/segments/segment_3.ts      (hot)
//! ```
//!
//! Planning ranks the files still in the flat directory and executes oldest
//! first. A run killed half way leaves the newest files behind, and planning
//! again over them reproduces exactly the remaining moves, so re-running is
//! always safe.
//!
//! # Example
//!
//! ```no_run
//! use caplife_domain::Mode;
//! use caplife_migrate::{MigrateOptions, MigrationPlan, Migrator};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), caplife_migrate::MigrateError> {
//! let plan = MigrationPlan::build(Path::new("capture1"), &MigrateOptions::default())?;
//! let report = Migrator::new(Mode::Execute).apply(&plan, |f| eprintln!("{}", f.reason))?;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod cleanup;
mod error;
mod migrator;
mod plan;
mod report;

pub use cleanup::{legacy_pattern, CleanupReport, DirectoryResult, LegacyCleaner, LegacyPattern};
pub use error::{MigrateError, Result};
pub use migrator::Migrator;
pub use plan::{ClassPlan, MigrateOptions, MigrationPlan, PlannedMove};
pub use report::{ClassReport, Counts, FailedMove, MigrationReport};
