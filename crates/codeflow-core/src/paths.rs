//! Destination path resolution
//!
//! Maps an item name and a [`SyncTarget`] scope to the files that must be
//! written for it, and a destination path back to the schema it expects.

use crate::{Error, Result};
use codeflow_fs::{ClientDir, NormalizedPath};
use codeflow_meta::Format;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which installations a sync run writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncTarget {
    /// Relative to the project root.
    #[default]
    Project,
    /// Relative to the user's home directory.
    Global,
    /// Both of the above.
    All,
}

impl SyncTarget {
    pub fn includes_project(&self) -> bool {
        matches!(self, Self::Project | Self::All)
    }

    pub fn includes_global(&self) -> bool {
        matches!(self, Self::Global | Self::All)
    }

    /// Scopes covered, in resolution order.
    pub fn scopes(&self) -> &'static [SyncTarget] {
        match self {
            Self::Project => &[Self::Project],
            Self::Global => &[Self::Global],
            Self::All => &[Self::Project, Self::Global],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Global => "global",
            Self::All => "all",
        }
    }
}

impl std::fmt::Display for SyncTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncTarget {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "project" => Ok(Self::Project),
            "global" => Ok(Self::Global),
            "all" => Ok(Self::All),
            other => Err(format!(
                "unknown sync target '{}' (expected project, global or all)",
                other
            )),
        }
    }
}

/// Resolves destination paths under a project root and a home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    project_root: NormalizedPath,
    home_dir: NormalizedPath,
}

impl PathResolver {
    pub fn new(
        project_root: impl Into<NormalizedPath>,
        home_dir: impl Into<NormalizedPath>,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            home_dir: home_dir.into(),
        }
    }

    /// Resolver rooted at the current directory and the user's home.
    ///
    /// # Errors
    ///
    /// Fails when either directory cannot be determined.
    pub fn from_env() -> Result<Self> {
        let cwd = std::env::current_dir().map_err(|e| codeflow_fs::Error::io(".", e))?;
        let home = dirs::home_dir().ok_or_else(|| Error::Config {
            message: "could not determine the home directory".to_string(),
        })?;
        Ok(Self::new(
            NormalizedPath::canonical_or_given(cwd),
            NormalizedPath::canonical_or_given(home),
        ))
    }

    pub fn project_root(&self) -> &NormalizedPath {
        &self.project_root
    }

    pub fn home_dir(&self) -> &NormalizedPath {
        &self.home_dir
    }

    /// Agent files for `name`: Claude Code then OpenCode, project scope
    /// before global.
    pub fn target_paths(&self, name: &str, target: SyncTarget) -> Vec<NormalizedPath> {
        let file = format!("{}.md", name);
        let mut paths = Vec::with_capacity(4);
        if target.includes_project() {
            paths.push(self.project_dir(ClientDir::ClaudeAgents).join(&file));
            paths.push(self.project_dir(ClientDir::OpenCodeProjectAgents).join(&file));
        }
        if target.includes_global() {
            paths.push(self.global_dir(ClientDir::ClaudeAgents).join(&file));
            paths.push(self.global_dir(ClientDir::OpenCodeGlobalAgents).join(&file));
        }
        paths
    }

    /// Command files named `file_name`, in the same order as agents.
    pub fn command_paths(&self, file_name: &str, target: SyncTarget) -> Vec<NormalizedPath> {
        let mut paths = Vec::with_capacity(4);
        if target.includes_project() {
            paths.push(self.project_dir(ClientDir::ClaudeCommands).join(file_name));
            paths.push(self.project_dir(ClientDir::OpenCodeProjectCommands).join(file_name));
        }
        if target.includes_global() {
            paths.push(self.global_dir(ClientDir::ClaudeCommands).join(file_name));
            paths.push(self.global_dir(ClientDir::OpenCodeGlobalCommands).join(file_name));
        }
        paths
    }

    /// Schema expected at `path`, judged by the client directory that
    /// directly contains it. Unrecognized locations get [`Format::Base`].
    pub fn detect_target_format(path: &NormalizedPath) -> Format {
        let Some(parent) = path.parent() else {
            return Format::Base;
        };
        let parent = parent.as_str();
        let in_dir = |dir: ClientDir| {
            parent == dir.as_str() || parent.ends_with(&format!("/{}", dir.as_str()))
        };

        if in_dir(ClientDir::ClaudeAgents) || in_dir(ClientDir::ClaudeCommands) {
            Format::ClaudeCode
        } else if [
            ClientDir::OpenCodeProjectAgents,
            ClientDir::OpenCodeGlobalAgents,
            ClientDir::OpenCodeProjectCommands,
            ClientDir::OpenCodeGlobalCommands,
        ]
        .into_iter()
        .any(in_dir)
        {
            Format::OpenCode
        } else {
            Format::Base
        }
    }

    fn project_dir(&self, dir: ClientDir) -> NormalizedPath {
        self.project_root.join(dir.as_str())
    }

    fn global_dir(&self, dir: ClientDir) -> NormalizedPath {
        self.home_dir.join(dir.as_str())
    }
}
