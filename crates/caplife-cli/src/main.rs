//! Caplife CLI - hot/cold lifecycle management for capture directories.

use caplife_cli::commands;
use caplife_cli::{logging, Cli, Command, Config, Formatter};
use clap::Parser;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_json);

    let config = Config::load(cli.config.as_deref())?;

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Migrate(args) => commands::execute_migrate(args, &config, &formatter)?,
        Command::Cleanup(args) => commands::execute_cleanup(args, &formatter)?,
        Command::Run(args) => commands::execute_run(args, &config, &formatter).await?,
        Command::Status(args) => commands::execute_status(args, &config, &formatter)?,
    }

    Ok(())
}
