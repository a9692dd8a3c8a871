//! Command implementations for codeflow-cli

pub mod health;
pub mod sync;
pub mod validate;

use std::path::Path;

use codeflow_core::{CanonicalSyncer, EngineConfig, EnhancedSyncError, PathResolver};
use codeflow_fs::NormalizedPath;
use colored::Colorize;

use crate::error::{CliError, Result};

pub use health::run_health;
pub use sync::{run_dry_run, run_sync};
pub use validate::run_validate;

/// Build an engine for the given project and home, falling back to the
/// current directory and the user's home.
pub fn build_syncer(project: Option<&Path>, home: Option<&Path>) -> Result<CanonicalSyncer> {
    let project = match project {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir()?,
    };
    let home = match home {
        Some(path) => path.to_path_buf(),
        None => dirs::home_dir()
            .ok_or_else(|| CliError::user("Could not determine home directory; pass --home"))?,
    };

    let resolver = PathResolver::new(
        NormalizedPath::canonical_or_given(project),
        NormalizedPath::canonical_or_given(home),
    );
    let config = EngineConfig::load(resolver.project_root())?;
    tracing::debug!(
        project = %resolver.project_root(),
        home = %resolver.home_dir(),
        "Resolved directories"
    );
    Ok(CanonicalSyncer::new(resolver, config))
}

pub(crate) fn print_item_errors(errors: &[EnhancedSyncError]) {
    for error in errors {
        println!("   {} {}", "!".red(), error);
        if let Some(suggestion) = &error.suggestion {
            println!("     {}", suggestion.dimmed());
        }
    }
}
