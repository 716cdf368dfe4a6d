//! Run command implementation.

use crate::cli::RunArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use caplife_janitor::{Janitor, JanitorConfig, JanitorWorker};
use caplife_store::FsStore;

/// Execute the run command.
pub async fn execute_run(args: RunArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let janitor_config = janitor_config(&args, config);
    if !janitor_config.root.is_dir() {
        return Err(CliError::InvalidInput(format!(
            "Capture root {} is not a directory",
            janitor_config.root.display()
        )));
    }

    let store = FsStore::new(&janitor_config.root);
    println!(
        "{}",
        formatter.info(&format!(
            "Managing {}{}",
            janitor_config.root.display(),
            if janitor_config.dry_run { " (dry run)" } else { "" }
        ))
    );

    let janitor = Janitor::new(store, janitor_config)?;
    let mut worker = JanitorWorker::new(janitor);
    if let Some(path) = args.health_file {
        worker = worker.with_health_file(path);
    }

    if args.once {
        let outcome = worker.run_cycles(1).await;
        println!("{}", worker.metrics().summary());
        outcome?;
    } else {
        worker.run().await?;
    }

    println!("{}", formatter.success("Janitor stopped"));
    Ok(())
}

fn janitor_config(args: &RunArgs, config: &Config) -> JanitorConfig {
    let mut janitor = config.janitor.clone();
    if let Some(root) = &args.root {
        janitor.root = root.clone();
    }
    janitor.dry_run |= args.dry_run;
    janitor
}
