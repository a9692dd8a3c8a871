//! The canonical manifest and its discovery
//!
//! `AGENT_MANIFEST.json` lists every canonical item and, per format, the
//! file that holds its source:
//!
//! ```json
//! {
//!   "canonical_agents": [
//!     { "name": "code-reviewer", "sources": { "base": "agents/code-reviewer.md" } }
//!   ]
//! }
//! ```
//!
//! Relative source paths resolve against the directory holding the manifest.

use crate::{Error, Format, Result};
use codeflow_fs::{ConfigStore, MANIFEST_FILE_NAME, NormalizedPath, STATE_DIR};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One logical definition tracked by the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalItem {
    pub name: String,
    /// Format name (`base`, `claude-code`, `opencode`, ...) to source file.
    #[serde(default)]
    pub sources: BTreeMap<String, NormalizedPath>,
}

impl CanonicalItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sources: BTreeMap::new(),
        }
    }

    pub fn with_source(mut self, format: Format, path: impl Into<NormalizedPath>) -> Self {
        self.sources.insert(format.as_str().to_string(), path.into());
        self
    }

    pub fn source_for(&self, format: Format) -> Option<&NormalizedPath> {
        self.sources.get(format.as_str())
    }
}

/// Parsed manifest contents, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentManifest {
    #[serde(default)]
    pub canonical_agents: Vec<CanonicalItem>,
}

impl AgentManifest {
    pub fn new(canonical_agents: Vec<CanonicalItem>) -> Self {
        Self { canonical_agents }
    }

    pub fn len(&self) -> usize {
        self.canonical_agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical_agents.is_empty()
    }

    /// Rewrite relative source paths against `base_dir`.
    fn resolve_sources(&mut self, base_dir: &NormalizedPath) {
        for item in &mut self.canonical_agents {
            for path in item.sources.values_mut() {
                *path = base_dir.resolve(path.as_str());
            }
        }
    }
}

/// Supplies the manifest to the sync engine.
pub trait ManifestLoader {
    /// # Errors
    ///
    /// Fails when no manifest can be found or it does not parse.
    fn load_manifest(&self) -> Result<AgentManifest>;
}

impl ManifestLoader for AgentManifest {
    fn load_manifest(&self) -> Result<AgentManifest> {
        Ok(self.clone())
    }
}

/// Where a manifest was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredManifest {
    pub path: NormalizedPath,
    /// Found under the state directory rather than beside the project.
    pub is_legacy: bool,
    /// Number of parent directories walked from the start directory.
    pub level: usize,
}

/// Finds `AGENT_MANIFEST.json` by walking up from a start directory.
#[derive(Debug, Clone)]
pub struct ManifestDiscovery {
    start: NormalizedPath,
    max_depth: usize,
    allow_legacy: bool,
    store: ConfigStore,
}

impl ManifestDiscovery {
    pub fn new(start: impl Into<NormalizedPath>) -> Self {
        Self {
            start: start.into(),
            max_depth: 10,
            allow_legacy: true,
            store: ConfigStore::new(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_legacy(mut self, allow_legacy: bool) -> Self {
        self.allow_legacy = allow_legacy;
        self
    }

    /// Locate the manifest without reading it.
    pub fn find(&self) -> Result<DiscoveredManifest> {
        let mut current = Some(self.start.clone());
        let mut level = 0;

        while let Some(dir) = current {
            if level > self.max_depth {
                break;
            }

            let candidate = dir.join(MANIFEST_FILE_NAME);
            if candidate.is_file() {
                return Ok(DiscoveredManifest {
                    path: candidate,
                    is_legacy: false,
                    level,
                });
            }

            if self.allow_legacy {
                let legacy = dir.join(STATE_DIR).join(MANIFEST_FILE_NAME);
                if legacy.is_file() {
                    tracing::debug!(path = %legacy, "Using manifest from legacy location");
                    return Ok(DiscoveredManifest {
                        path: legacy,
                        is_legacy: true,
                        level,
                    });
                }
            }

            current = dir.parent();
            level += 1;
        }

        Err(Error::ManifestNotFound {
            file: MANIFEST_FILE_NAME,
            start: self.start.to_native(),
            max_depth: self.max_depth,
        })
    }

    /// Read a manifest file and resolve its sources against its directory.
    pub fn load_from(&self, path: &NormalizedPath) -> Result<AgentManifest> {
        let mut manifest: AgentManifest = self.store.load(path).map_err(|e| match e {
            codeflow_fs::Error::ConfigParse { message, .. } => Error::ManifestInvalid {
                path: path.to_native(),
                message,
            },
            other => Error::Fs(other),
        })?;

        if let Some(dir) = path.parent() {
            manifest.resolve_sources(&dir);
        }
        tracing::debug!(path = %path, items = manifest.len(), "Loaded manifest");
        Ok(manifest)
    }
}

impl ManifestLoader for ManifestDiscovery {
    fn load_manifest(&self) -> Result<AgentManifest> {
        let found = self.find()?;
        self.load_from(&found.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_canonical_agents_is_empty() {
        let manifest: AgentManifest = serde_json::from_str("{}").unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_resolve_sources_keeps_absolute_paths() {
        let mut manifest = AgentManifest::new(vec![
            CanonicalItem::new("a").with_source(Format::Base, "agents/a.md"),
            CanonicalItem::new("b").with_source(Format::Base, "/abs/b.md"),
        ]);
        manifest.resolve_sources(&NormalizedPath::new("/proj"));

        let a = manifest.canonical_agents[0].source_for(Format::Base).unwrap();
        let b = manifest.canonical_agents[1].source_for(Format::Base).unwrap();
        assert_eq!(a.as_str(), "/proj/agents/a.md");
        assert_eq!(b.as_str(), "/abs/b.md");
    }

    #[test]
    fn test_source_for_missing_format() {
        let item = CanonicalItem::new("a").with_source(Format::Base, "a.md");
        assert!(item.source_for(Format::OpenCode).is_none());
    }
}
