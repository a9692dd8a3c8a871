//! Error types for codeflow-meta

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Filesystem error: {0}")]
    Fs(#[from] codeflow_fs::Error),

    #[error("Unknown format: {name} (expected base, claude-code or opencode)")]
    UnknownFormat { name: String },

    #[error("{path} does not start with YAML frontmatter")]
    MissingFrontmatter { path: PathBuf },

    #[error("Could not find end of YAML frontmatter in {path}")]
    UnterminatedFrontmatter { path: PathBuf },

    #[error("Invalid frontmatter in {path}: {message}")]
    Frontmatter {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },

    #[error("Cannot convert {agent} to {target}: {message}")]
    Conversion {
        agent: String,
        target: String,
        message: String,
    },

    #[error("YAML serialization failed: {message}")]
    Serialization { message: String },

    #[error("{file} not found in {start} or any of {max_depth} parent directories")]
    ManifestNotFound {
        file: &'static str,
        start: PathBuf,
        max_depth: usize,
    },

    #[error("Invalid manifest at {path}: {message}")]
    ManifestInvalid { path: PathBuf, message: String },
}

impl Error {
    /// Line in the source file the error points at, when known.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Frontmatter { line, .. } => *line,
            Self::MissingFrontmatter { .. } => Some(1),
            _ => None,
        }
    }
}
