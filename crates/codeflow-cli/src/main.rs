//! codeflow CLI
//!
//! Publishes canonical agent definitions to Claude Code and OpenCode
//! installations.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let Some(command) = cli.command else {
        println!("{} canonical agent sync", "codeflow".green().bold());
        println!();
        println!("Run {} for available commands.", "codeflow --help".cyan());
        return Ok(());
    };

    let mut syncer = commands::build_syncer(cli.project.as_deref(), cli.home.as_deref())?;
    match command {
        Commands::Sync(args) => commands::run_sync(&mut syncer, &args),
        Commands::DryRun(args) => commands::run_dry_run(&mut syncer, &args),
        Commands::Validate { source_format, json } => {
            commands::run_validate(&syncer, source_format, json)
        }
        Commands::Health(args) => commands::run_health(&mut syncer, &args),
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`); `--verbose`
/// forces `debug`.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let fmt_layer = fmt::layer()
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .compact();

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_ok();
    if installed && verbose {
        tracing::debug!("Verbose mode enabled");
    }
}
