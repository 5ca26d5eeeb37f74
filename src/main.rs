//! pipedb - workflow database CLI
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use pipedb::cli::args::LockAction;
use pipedb::cli::commands::{self, Target};
use pipedb::cli::{Cli, Commands};
use pipedb::config::ConfigManager;
use pipedb::error::PipedbResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run() -> PipedbResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load()?;

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("pipedb=warn"),
        1 => EnvFilter::new("pipedb=info"),
        _ => EnvFilter::new("pipedb=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if config.general.json_logs() {
        subscriber.json().init();
    } else {
        subscriber.without_time().init();
    }

    debug!("Using config {}", config_manager.path().display());
    let target = Target::resolve(&cli, &config);

    match cli.command {
        Commands::Nodes(args) => commands::nodes(args, &target),
        Commands::Chunks(args) => commands::chunks(args, &target),
        Commands::Split(args) => commands::split(args, &target),
        Commands::Lock(args) => match args.action {
            None | Some(LockAction::Status) => commands::lock_status(&target),
        },
        Commands::Unlock => commands::unlock(&target),
        Commands::Config(args) => commands::config(args, &config_manager, &config),
    }
}
