//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use codeflow_core::SyncTarget;
use codeflow_meta::Format;

/// codeflow - Sync canonical agent definitions to every client
#[derive(Parser, Debug)]
#[command(name = "codeflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root (defaults to the current directory)
    #[arg(long, global = true, env = "CODEFLOW_PROJECT")]
    pub project: Option<PathBuf>,

    /// Home directory used for global installations
    #[arg(long, global = true, env = "CODEFLOW_HOME")]
    pub home: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by the commands that run the engine
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    /// Where to publish: project, global or all
    #[arg(short, long, default_value = "project")]
    pub target: SyncTarget,

    /// Manifest source to read: base, claude-code or opencode
    #[arg(short, long, default_value = "base")]
    pub source_format: Format,

    /// Sync the valid agents even when others fail validation
    #[arg(short, long)]
    pub force: bool,

    /// Output as JSON for scripting
    #[arg(long)]
    pub json: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Synchronize canonical agents and commands to client directories
    ///
    /// Examples:
    ///   codeflow sync                    # Project installations from base sources
    ///   codeflow sync -t all --force     # Everywhere, skipping invalid agents
    Sync(RunArgs),

    /// Show what sync would write without writing anything
    DryRun(RunArgs),

    /// Validate every manifest source without writing anything
    Validate {
        /// Manifest source to read: base, claude-code or opencode
        #[arg(short, long, default_value = "base")]
        source_format: Format,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Run a dry sync and report the resulting health
    Health(RunArgs),
}
