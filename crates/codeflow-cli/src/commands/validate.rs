//! Validate command implementation

use codeflow_core::{CanonicalSyncer, EnhancedSyncError};
use codeflow_meta::Format;
use colored::Colorize;
use serde::Serialize;

use super::print_item_errors;
use crate::error::{CliError, Result};

#[derive(Serialize)]
struct ValidationReport<'a> {
    valid: Vec<&'a str>,
    errors: &'a [EnhancedSyncError],
    warnings: Vec<Warning<'a>>,
}

#[derive(Serialize)]
struct Warning<'a> {
    agent: &'a str,
    message: &'a str,
}

/// Run the validate command
///
/// Exits with an error when any agent fails validation.
pub fn run_validate(syncer: &CanonicalSyncer, source_format: Format, json: bool) -> Result<()> {
    let outcome = syncer.validate_all(source_format)?;

    if json {
        let report = ValidationReport {
            valid: outcome.valid.iter().map(|v| v.item.name.as_str()).collect(),
            errors: &outcome.errors,
            warnings: outcome
                .warnings
                .iter()
                .map(|(agent, message)| Warning { agent, message })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} Validating {} sources...",
            "=>".blue().bold(),
            source_format
        );
        for valid in &outcome.valid {
            println!("   {} {}", "OK".green(), valid.item.name);
        }
        for (agent, message) in &outcome.warnings {
            println!("   {} {}: {}", "WARN".yellow(), agent.cyan(), message);
        }
        if !outcome.errors.is_empty() {
            println!();
            println!("{} Validation failed:", "FAILED".red().bold());
            print_item_errors(&outcome.errors);
            println!();
        }
    }

    if outcome.is_clean() {
        if !json {
            println!("{} {} agents valid.", "OK".green().bold(), outcome.valid.len());
        }
        Ok(())
    } else {
        Err(CliError::user(format!(
            "{} agents failed validation",
            outcome.failed_agents().len()
        )))
    }
}
