//! Cleanup command implementation.

use crate::cli::CleanupArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use caplife_domain::Mode;
use caplife_migrate::LegacyCleaner;
use tracing::info;

/// Execute the cleanup command.
pub fn execute_cleanup(args: CleanupArgs, formatter: &Formatter) -> Result<()> {
    info!(base = %args.stream_base.display(), dry_run = args.dry_run, "Legacy cleanup started");
    let report = LegacyCleaner::new(Mode::from_dry_run(args.dry_run)).run(&args.stream_base)?;
    info!(
        roots = report.roots.len(),
        matched = report.total_matched(),
        removed = report.total_removed(),
        failed_directories = report.failed_directories().count(),
        "Legacy cleanup finished"
    );

    if report.roots.is_empty() {
        println!(
            "{}",
            formatter.warning(&format!("No capture roots under {}", args.stream_base.display()))
        );
        return Ok(());
    }

    println!("{}", formatter.cleanup_report(&report)?);

    let failed = report.failed_directories().count();
    if failed > 0 {
        return Err(CliError::Incomplete(format!("{} directory(ies) could not be cleaned", failed)));
    }

    if report.dry_run {
        println!(
            "{}",
            formatter.info(&format!("Dry run: {} file(s) would be deleted", report.total_matched()))
        );
    } else {
        println!(
            "{}",
            formatter.success(&format!(
                "Deleted {} legacy file(s) across {} capture root(s)",
                report.total_removed(),
                report.roots.len()
            ))
        );
    }
    Ok(())
}
