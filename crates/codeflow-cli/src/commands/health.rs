//! Health command implementation

use codeflow_core::{CanonicalSyncer, HealthStatus, SyncOptions};
use colored::Colorize;

use crate::cli::RunArgs;
use crate::error::Result;

/// Run the health command
///
/// Performs a dry run so the tracker has something to report, then prints
/// the summary. A failing dry run is reflected in the summary rather than
/// returned as an error.
pub fn run_health(syncer: &mut CanonicalSyncer, args: &RunArgs) -> Result<()> {
    let options = SyncOptions::new(args.target, args.source_format)
        .with_force(args.force)
        .with_dry_run(true);
    if let Err(e) = syncer.sync_from_canonical(options) {
        tracing::debug!(error = %e, "Dry run failed while collecting health");
    }

    let summary = syncer.sync_health_summary();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let message = match summary.status {
        HealthStatus::Healthy => summary.message.green(),
        HealthStatus::Warning => summary.message.yellow(),
        HealthStatus::Critical => summary.message.red(),
    };
    println!("{}", message.bold());

    let metrics = &summary.metrics;
    println!("   Total agents:   {}", metrics.total_agents);
    println!("   Files synced:   {}", metrics.synced_agents);
    println!("   Failed:         {}", metrics.failed_agents);
    println!("   Average time:   {} ms", metrics.average_sync_time_ms);
    Ok(())
}
