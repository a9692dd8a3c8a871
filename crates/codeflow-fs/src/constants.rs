//! Well-known file names and client directory layout.

/// File name of the canonical agent manifest.
pub const MANIFEST_FILE_NAME: &str = "AGENT_MANIFEST.json";

/// Suffix appended to a destination path while its content is staged.
pub const STAGING_SUFFIX: &str = ".tmp";

/// Per-project directory holding codeflow's own state and config.
pub const STATE_DIR: &str = ".codeflow";

/// Destination directories of the supported client front ends.
///
/// Project directories are relative to the working directory, global ones
/// to the user's home directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientDir {
    /// `.claude/agents` (project and global)
    ClaudeAgents,
    /// `.opencode/agent` (project)
    OpenCodeProjectAgents,
    /// `.config/opencode/agent` (global)
    OpenCodeGlobalAgents,
    /// `.claude/commands` (project and global)
    ClaudeCommands,
    /// `.opencode/command` (project)
    OpenCodeProjectCommands,
    /// `.config/opencode/command` (global)
    OpenCodeGlobalCommands,
}

impl ClientDir {
    /// Get the relative directory as a forward-slash string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClaudeAgents => ".claude/agents",
            Self::OpenCodeProjectAgents => ".opencode/agent",
            Self::OpenCodeGlobalAgents => ".config/opencode/agent",
            Self::ClaudeCommands => ".claude/commands",
            Self::OpenCodeProjectCommands => ".opencode/command",
            Self::OpenCodeGlobalCommands => ".config/opencode/command",
        }
    }
}

impl std::fmt::Display for ClientDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
