//! Migrate command implementation.

use crate::cli::MigrateArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use caplife_domain::{ArtifactClass, Mode};
use caplife_migrate::{MigrateError, MigrateOptions, MigrationPlan, Migrator};
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

/// Execute the migrate command.
pub fn execute_migrate(args: MigrateArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    config.validate()?;
    let options = migrate_options(&args, config);
    let plan = MigrationPlan::build(&args.capture_dir, &options)?;
    info!(
        source = %plan.source.display(),
        target = %plan.target.display(),
        planned = plan.len(),
        unclassified = plan.unclassified.len(),
        execute = args.execute,
        "Migration planned"
    );

    if !args.execute {
        let report = Migrator::new(Mode::DryRun).apply(&plan, |_| {})?;
        println!("{}", formatter.migration_report(&report)?);
        println!(
            "{}",
            formatter.info("Dry run: nothing was moved. Re-run with --execute to apply.")
        );
        return Ok(());
    }

    if plan.is_empty() {
        println!("{}", formatter.success("Nothing left to migrate"));
        return Ok(());
    }

    // Confirm unless --yes is specified
    if !args.yes {
        println!(
            "About to move {} file(s) from {} into {}",
            plan.len(),
            plan.source.display(),
            plan.target.display()
        );
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        if !confirm(&mut stdin.lock(), &mut stdout)? {
            warn!("Migration refused at confirmation");
            println!("{}", formatter.info("Operation cancelled"));
            return Err(MigrateError::Aborted.into());
        }
    }

    let report = Migrator::new(Mode::Execute).apply(&plan, |failure| {
        eprintln!(
            "{}",
            formatter.error(&format!(
                "{} -> {}: {}",
                failure.path.display(),
                failure.to,
                failure.reason
            ))
        );
    })?;
    println!("{}", formatter.migration_report(&report)?);
    info!(
        moved = report.total_moved(),
        failed = report.total_failed(),
        "Migration finished"
    );

    if report.is_success() {
        println!("{}", formatter.success(&format!("Migrated {} file(s)", report.total_moved())));
        Ok(())
    } else {
        Err(CliError::Incomplete(format!(
            "{} file(s) failed to move; re-running is safe",
            report.total_failed()
        )))
    }
}

/// Capacities come from the janitor configuration, then from `--hot-capacity`.
fn migrate_options(args: &MigrateArgs, config: &Config) -> MigrateOptions {
    let mut capacities: std::collections::BTreeMap<ArtifactClass, usize> = ArtifactClass::ALL
        .into_iter()
        .map(|class| (class, config.janitor.policy(class).hot_capacity))
        .collect();
    capacities.extend(args.hot_capacity.iter().copied());

    MigrateOptions {
        capacities,
        bucket_clock: args
            .bucket_clock
            .map(Into::into)
            .unwrap_or_else(|| config.janitor.bucket_clock.into()),
        target_root: args.root.clone(),
    }
}

/// Ask for the literal word "yes".
fn confirm(input: &mut impl BufRead, output: &mut impl Write) -> Result<bool> {
    write!(output, "Type 'yes' to continue: ")?;
    output.flush()?;

    let mut response = String::new();
    input.read_line(&mut response)?;
    Ok(response.trim() == "yes")
}
