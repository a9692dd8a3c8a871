//! Error types for codeflow-core

use crate::sync::EnhancedSyncError;
use std::path::PathBuf;

/// Result type for codeflow-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a sync run
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The manifest could not be located
    #[error("AGENT_MANIFEST.json not found. {cause}")]
    ManifestUnavailable { cause: String },

    /// The manifest was found but could not be parsed
    #[error("Invalid manifest at {path}: {message}")]
    ManifestInvalid { path: PathBuf, message: String },

    /// One or more items failed validation and `force` was not set
    #[error("{count} agents failed validation. Use --force to override.")]
    ValidationFailed {
        count: usize,
        errors: Vec<EnhancedSyncError>,
    },

    /// An entity could not be converted to a target schema
    #[error("Conversion failed for {agent}: {message}")]
    Conversion { agent: String, message: String },

    /// An entity could not be serialized
    #[error("YAML serialization failed for {agent}: {message}")]
    Serialization { agent: String, message: String },

    /// The run was cancelled
    #[error("Sync cancelled during {phase}")]
    Cancelled { phase: String },

    /// Engine configuration could not be loaded
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// Commit journal could not be read or written
    #[error("Commit journal error: {message}")]
    Journal { message: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from codeflow-fs
    #[error(transparent)]
    Fs(#[from] codeflow_fs::Error),

    /// Metadata error from codeflow-meta
    #[error(transparent)]
    Meta(#[from] codeflow_meta::Error),
}

impl Error {
    /// Whether the error came from the validation gate.
    pub fn is_validation_failure(&self) -> bool {
        matches!(self, Self::ValidationFailed { .. })
    }
}
