//! Status command implementation.

use crate::cli::StatusArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::{ClassStatus, Formatter};
use caplife_domain::ArtifactClass;
use caplife_janitor::HealthReport;
use caplife_store::{FsStore, StoreError};
use std::fs;
use tracing::debug;

/// Execute the status command.
pub fn execute_status(args: StatusArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    config.validate()?;
    let root = args.root.unwrap_or_else(|| config.janitor.root.clone());
    let store = FsStore::new(&root);

    let mut classes = Vec::new();
    for class in ArtifactClass::ALL {
        match store.occupancy(class) {
            Ok(occupancy) => classes.push(ClassStatus::new(class, &occupancy, config.janitor.policy(class))),
            Err(StoreError::Structural { path, reason }) => {
                debug!(class = %class, path = %path.display(), "Class directory unavailable");
                eprintln!("{}", formatter.warning(&format!("{}: {}", path.display(), reason)));
            }
            Err(e) => return Err(e.into()),
        }
    }
    if classes.is_empty() {
        return Err(CliError::InvalidInput(format!(
            "{} is not a capture root",
            root.display()
        )));
    }

    let health = match &args.health_file {
        Some(path) => Some(read_health(path)?),
        None => None,
    };
    println!("{}", formatter.status(&classes, health.as_ref())?);
    Ok(())
}

fn read_health(path: &std::path::Path) -> Result<HealthReport> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
