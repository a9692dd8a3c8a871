//! Engine configuration
//!
//! Read from `<project>/.codeflow/config.toml` when present:
//!
//! ```toml
//! command_dir = "command"
//! state_dir = ".codeflow"
//!
//! [manifest]
//! max_depth = 10
//! allow_legacy = true
//! ```

use crate::{Error, Result};
use codeflow_fs::{ConfigStore, NormalizedPath, STATE_DIR};
use serde::{Deserialize, Serialize};

/// File name of the engine configuration inside the state directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Manifest discovery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Parent directories searched above the project root.
    pub max_depth: usize,
    /// Also look for the manifest inside the state directory.
    pub allow_legacy: bool,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            allow_legacy: true,
        }
    }
}

/// Settings for a [`CanonicalSyncer`](crate::CanonicalSyncer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory of workflow command files, relative to the project root.
    pub command_dir: String,
    /// Directory for engine state such as the commit journal.
    pub state_dir: String,
    pub manifest: ManifestConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command_dir: "command".to_string(),
            state_dir: STATE_DIR.to_string(),
            manifest: ManifestConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load `<project>/.codeflow/config.toml`, or defaults if it is absent.
    ///
    /// # Errors
    ///
    /// Fails when the file exists but cannot be parsed.
    pub fn load(project_root: &NormalizedPath) -> Result<Self> {
        let path = project_root.join(STATE_DIR).join(CONFIG_FILE_NAME);
        match ConfigStore::new().load_optional::<Self>(&path) {
            Ok(Some(config)) => {
                tracing::debug!(path = %path, "Loaded engine configuration");
                Ok(config)
            }
            Ok(None) => Ok(Self::default()),
            Err(e) => Err(Error::Config { message: e.to_string() }),
        }
    }
}
