//! Sync run results and per-item diagnostics

use codeflow_fs::NormalizedPath;
use codeflow_meta::{CanonicalItem, Entity};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Category of a per-item failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncErrorKind {
    Validation,
    Conversion,
    Serialization,
    Filesystem,
    Parsing,
}

impl SyncErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Conversion => "conversion",
            Self::Serialization => "serialization",
            Self::Filesystem => "filesystem",
            Self::Parsing => "parsing",
        }
    }
}

impl std::fmt::Display for SyncErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A per-item failure with enough context to act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancedSyncError {
    pub agent: String,
    #[serde(rename = "type")]
    pub kind: SyncErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl EnhancedSyncError {
    pub fn new(agent: impl Into<String>, kind: SyncErrorKind, message: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            kind,
            message: message.into(),
            file_path: None,
            line: None,
            suggestion: None,
        }
    }

    pub fn with_file(mut self, path: &NormalizedPath) -> Self {
        self.file_path = Some(path.to_native());
        self
    }

    pub fn with_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub(crate) fn missing_source(
        agent: &str,
        message: String,
        path: Option<&NormalizedPath>,
    ) -> Self {
        let error = Self::new(agent, SyncErrorKind::Filesystem, message)
            .with_suggestion("Check that the source file exists in the canonical source directory");
        match path {
            Some(path) => error.with_file(path),
            None => error,
        }
    }

    pub(crate) fn parse_failure(
        agent: &str,
        path: &NormalizedPath,
        error: &codeflow_meta::Error,
    ) -> Self {
        Self::new(agent, SyncErrorKind::Parsing, error.to_string())
            .with_file(path)
            .with_line(error.line())
            .with_suggestion("Check the YAML frontmatter syntax and required fields")
    }

    pub(crate) fn invalid(agent: &str, path: &NormalizedPath, summary: String) -> Self {
        Self::new(agent, SyncErrorKind::Validation, summary)
            .with_file(path)
            .with_suggestion("Fix the validation errors in the source file before syncing")
    }
}

impl std::fmt::Display for EnhancedSyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.agent, self.message)?;
        if let Some(path) = &self.file_path {
            write!(f, " ({}", path.display())?;
            if let Some(line) = self.line {
                write!(f, ":{}", line)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// One file published (or, in a dry run, that would be published).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncedFile {
    pub from: NormalizedPath,
    pub to: NormalizedPath,
    pub agent: String,
}

/// Something deliberately not written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedItem {
    pub agent: String,
    pub target: String,
    pub reason: String,
}

/// Outcome of one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub synced: Vec<SyncedFile>,
    pub skipped: Vec<SkippedItem>,
    pub errors: Vec<EnhancedSyncError>,
    #[serde(default)]
    pub dry_run: bool,
}

impl SyncResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Distinct item names that had at least one file published.
    pub fn synced_agents(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for file in &self.synced {
            if !names.contains(&file.agent.as_str()) {
                names.push(&file.agent);
            }
        }
        names
    }
}

/// A manifest item that passed validation, with its parsed entity.
#[derive(Debug, Clone)]
pub struct ValidatedItem {
    pub item: CanonicalItem,
    pub source: NormalizedPath,
    pub entity: Entity,
}

/// Result of validating every manifest item.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub valid: Vec<ValidatedItem>,
    pub errors: Vec<EnhancedSyncError>,
    /// Non-blocking warnings, as `(agent, message)`.
    pub warnings: Vec<(String, String)>,
}

impl ValidationOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Names of items that failed, in manifest order.
    pub fn failed_agents(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for error in &self.errors {
            if !names.contains(&error.agent.as_str()) {
                names.push(&error.agent);
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serializes_kind_as_type() {
        let error = EnhancedSyncError::new("x", SyncErrorKind::Filesystem, "missing");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["type"], "filesystem");
        assert!(json.get("line").is_none());
    }

    #[test]
    fn test_display_includes_location() {
        let error = EnhancedSyncError::new("x", SyncErrorKind::Parsing, "bad yaml")
            .with_file(&NormalizedPath::new("/defs/x.md"))
            .with_line(Some(3));
        assert_eq!(error.to_string(), "[parsing] x: bad yaml (/defs/x.md:3)");
    }
}
