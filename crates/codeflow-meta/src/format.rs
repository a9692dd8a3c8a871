//! Client schema identifiers

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The schema a definition is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Format {
    /// The canonical superset schema.
    Base,
    /// Claude Code agent schema.
    ClaudeCode,
    /// OpenCode agent schema.
    #[serde(rename = "opencode")]
    OpenCode,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Base, Format::ClaudeCode, Format::OpenCode];

    /// Name used in manifests and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::ClaudeCode => "claude-code",
            Self::OpenCode => "opencode",
        }
    }
}

impl Default for Format {
    fn default() -> Self {
        Self::Base
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "base" => Ok(Self::Base),
            "claude-code" | "claude" => Ok(Self::ClaudeCode),
            "opencode" => Ok(Self::OpenCode),
            _ => Err(Error::UnknownFormat { name: s.to_string() }),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
