//! Sync and dry-run command implementations

use codeflow_core::{CanonicalSyncer, EnhancedSyncError, SyncOptions, SyncResult};
use colored::Colorize;
use serde::Serialize;

use super::print_item_errors;
use crate::cli::RunArgs;
use crate::error::Result;

#[derive(Serialize)]
struct FailedValidation<'a> {
    errors: &'a [EnhancedSyncError],
}

/// Run the sync command
pub fn run_sync(syncer: &mut CanonicalSyncer, args: &RunArgs) -> Result<()> {
    let options = SyncOptions::new(args.target, args.source_format).with_force(args.force);
    run(syncer, options, args.json)
}

/// Run the dry-run command
///
/// Validation and conversion happen exactly as in a real sync; nothing is
/// written.
pub fn run_dry_run(syncer: &mut CanonicalSyncer, args: &RunArgs) -> Result<()> {
    let options = SyncOptions::new(args.target, args.source_format)
        .with_force(args.force)
        .with_dry_run(true);
    run(syncer, options, args.json)
}

fn run(syncer: &mut CanonicalSyncer, options: SyncOptions, json: bool) -> Result<()> {
    if !json {
        let verb = if options.dry_run { "Planning" } else { "Synchronizing" };
        println!(
            "{} {} {} agents from {} sources...",
            "=>".blue().bold(),
            verb,
            options.target,
            options.source_format
        );
    }

    let result = match syncer.sync_from_canonical(options) {
        Ok(result) => result,
        Err(codeflow_core::Error::ValidationFailed { count, errors }) => {
            if json {
                let report = FailedValidation { errors: &errors };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{} Validation failed:", "FAILED".red().bold());
                print_item_errors(&errors);
                println!();
            }
            return Err(codeflow_core::Error::ValidationFailed { count, errors }.into());
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    Ok(())
}

fn print_result(result: &SyncResult) {
    if result.synced.is_empty() {
        println!("{} Nothing to sync.", "OK".green().bold());
    } else {
        if result.dry_run {
            println!("{} Would write {} files:", "DRY RUN".cyan().bold(), result.synced.len());
        } else {
            println!(
                "{} Synced {} files for {} agents:",
                "OK".green().bold(),
                result.synced.len(),
                result.synced_agents().len()
            );
        }
        for file in &result.synced {
            println!("   {} {} ({})", "+".green(), file.to, file.agent.dimmed());
        }
    }

    if !result.skipped.is_empty() {
        println!();
        println!("{} Not written:", "SKIPPED".yellow().bold());
        for item in &result.skipped {
            println!(
                "   {} {} ({}): {}",
                "-".yellow(),
                item.agent.cyan(),
                item.target.dimmed(),
                item.reason
            );
        }
    }

    if !result.errors.is_empty() {
        println!();
        println!("{} Failed validation:", "ERRORS".red().bold());
        print_item_errors(&result.errors);
    }
}
