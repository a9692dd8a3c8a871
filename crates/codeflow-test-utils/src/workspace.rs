//! [`TestWorkspace`] builder for sync scenarios.

use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary `project/` and `home/` pair with helpers for writing sources
/// and asserting on published files.
///
/// # Example
///
/// ```rust,no_run
/// use codeflow_test_utils::{TestWorkspace, fixtures};
///
/// let ws = TestWorkspace::new();
/// ws.write_agent("agents/reviewer.md", &fixtures::base_agent("reviewer"));
/// ws.write_manifest(&[("reviewer", "agents/reviewer.md")]);
/// ws.assert_project_file_not_exists(".claude/agents/reviewer.md");
/// ```
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    /// Create empty project and home directories.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("project")).unwrap();
        fs::create_dir_all(temp_dir.path().join("home")).unwrap();
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn project(&self) -> PathBuf {
        self.root().join("project")
    }

    pub fn home(&self) -> PathBuf {
        self.root().join("home")
    }

    /// Write `AGENT_MANIFEST.json` at the project root with one base source
    /// per `(name, relative path)` pair.
    pub fn write_manifest(&self, items: &[(&str, &str)]) {
        let agents: Vec<Value> = items
            .iter()
            .map(|(name, source)| json!({ "name": name, "sources": { "base": source } }))
            .collect();
        self.write_manifest_json(&json!({ "canonical_agents": agents }));
    }

    /// Write an arbitrary manifest document.
    pub fn write_manifest_json(&self, manifest: &Value) {
        let content = serde_json::to_string_pretty(manifest).unwrap();
        fs::write(self.project().join("AGENT_MANIFEST.json"), content).unwrap();
    }

    /// Write a file relative to the project root, creating directories.
    pub fn write_agent(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.project().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Write `command/<file_name>` under the project root.
    pub fn write_command(&self, file_name: &str, content: &str) -> PathBuf {
        self.write_agent(&format!("command/{}", file_name), content)
    }

    pub fn read_project_file(&self, relative: &str) -> String {
        let path = self.project().join(relative);
        fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()))
    }

    pub fn read_home_file(&self, relative: &str) -> String {
        let path = self.home().join(relative);
        fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()))
    }

    /// # Panics
    /// Panics if `relative` does not exist under the project root.
    pub fn assert_project_file_exists(&self, relative: &str) {
        let path = self.project().join(relative);
        assert!(path.exists(), "Expected file to exist: {}", path.display());
    }

    /// # Panics
    /// Panics if `relative` exists under the project root.
    pub fn assert_project_file_not_exists(&self, relative: &str) {
        let path = self.project().join(relative);
        assert!(!path.exists(), "Expected file NOT to exist: {}", path.display());
    }

    /// # Panics
    /// Panics if `relative` does not exist under the home directory.
    pub fn assert_home_file_exists(&self, relative: &str) {
        let path = self.home().join(relative);
        assert!(path.exists(), "Expected file to exist: {}", path.display());
    }

    /// Every `*.tmp` file anywhere in the workspace.
    pub fn temp_files(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        collect_temp_files(self.root(), &mut found);
        found
    }

    /// # Panics
    /// Panics if any `*.tmp` file remains in the workspace.
    pub fn assert_no_temp_files(&self) {
        let leftovers = self.temp_files();
        assert!(leftovers.is_empty(), "Leftover temp files: {:?}", leftovers);
    }

    /// Every regular file under `dir` (relative to the workspace root).
    pub fn files_under(&self, dir: &str) -> Vec<PathBuf> {
        let mut found = Vec::new();
        collect_files(&self.root().join(dir), &mut found);
        found.sort();
        found
    }
}

fn collect_files(dir: &Path, found: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, found);
        } else {
            found.push(path);
        }
    }
}

fn collect_temp_files(dir: &Path, found: &mut Vec<PathBuf>) {
    let mut files = Vec::new();
    collect_files(dir, &mut files);
    found.extend(
        files
            .into_iter()
            .filter(|p| p.extension().is_some_and(|ext| ext == "tmp")),
    );
}
