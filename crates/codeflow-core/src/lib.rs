//! Canonical synchronization engine for codeflow
//!
//! Takes the canonical agent definitions listed in `AGENT_MANIFEST.json`,
//! validates them, converts them for each client and publishes the results
//! to project or global installations:
//!
//! - [`PathResolver`]: destination paths per item and scope
//! - [`HealthTracker`]: running health telemetry across runs
//! - [`CanonicalSyncer`]: validate, stage, commit, roll back
//!
//! ```no_run
//! use codeflow_core::{CanonicalSyncer, SyncOptions, SyncTarget};
//! use codeflow_meta::Format;
//!
//! let mut syncer = CanonicalSyncer::from_env()?;
//! let result = syncer.sync_from_canonical(SyncOptions::new(SyncTarget::Project, Format::Base))?;
//! println!("synced {} files", result.synced.len());
//! # Ok::<(), codeflow_core::Error>(())
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod health;
pub mod paths;
pub mod sync;

pub use cancel::CancellationToken;
pub use config::{EngineConfig, ManifestConfig};
pub use error::{Error, Result};
pub use health::{HealthMetrics, HealthStatus, HealthSummary, HealthTracker, SyncHealth};
pub use paths::{PathResolver, SyncTarget};
pub use sync::{
    CanonicalSyncer, Collaborators, EnhancedSyncError, SkippedItem, SyncErrorKind, SyncOptions,
    SyncPhase, SyncResult, SyncedFile, ValidatedItem, ValidationOutcome,
};
