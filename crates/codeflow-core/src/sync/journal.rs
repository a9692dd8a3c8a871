//! Durable record of an in-flight commit
//!
//! Before the first staged file is promoted, the whole commit set is written
//! to `<state_dir>/sync-journal.toml` with every entry `pending`. Each
//! promotion flips its entry to `committed`. A journal that survives a run
//! means the process died mid-commit; [`CommitJournal::roll_forward`]
//! finishes the promotions whose staged files are still intact.

use super::report::SyncedFile;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use codeflow_fs::checksum::compute_checksum;
use codeflow_fs::{NormalizedPath, io};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use uuid::Uuid;

/// File name of the journal inside the state directory.
pub const JOURNAL_FILE_NAME: &str = "sync-journal.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Committed,
}

/// One staged file awaiting promotion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub agent: String,
    pub from: NormalizedPath,
    pub staged: NormalizedPath,
    pub target: NormalizedPath,
    /// Checksum of the staged content, `sha256:<hex>`.
    pub checksum: String,
    pub status: EntryStatus,
}

impl JournalEntry {
    pub fn synced_file(&self) -> SyncedFile {
        SyncedFile {
            from: self.from.clone(),
            to: self.target.clone(),
            agent: self.agent.clone(),
        }
    }
}

/// The commit set of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitJournal {
    version: String,
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub entries: Vec<JournalEntry>,
}

impl CommitJournal {
    pub fn new(entries: Vec<JournalEntry>) -> Self {
        Self {
            version: "1".to_string(),
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            entries,
        }
    }

    pub fn path(state_dir: &NormalizedPath) -> NormalizedPath {
        state_dir.join(JOURNAL_FILE_NAME)
    }

    pub fn pending(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter().filter(|e| e.status == EntryStatus::Pending)
    }

    pub fn mark_committed(&mut self, index: usize) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.status = EntryStatus::Committed;
        }
    }

    /// Load a journal under a shared lock, `None` if there is none.
    pub fn load(path: &NormalizedPath) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let native = path.to_native();
        let file = File::open(&native).map_err(|e| codeflow_fs::Error::io(&native, e))?;
        FileExt::lock_shared(&file)
            .map_err(|_| codeflow_fs::Error::LockFailed { path: native.clone() })?;

        let mut content = String::new();
        (&file)
            .read_to_string(&mut content)
            .map_err(|e| codeflow_fs::Error::io(&native, e))?;

        let journal = toml::from_str(&content).map_err(|e| Error::Journal {
            message: format!("{}: {}", path, e),
        })?;
        Ok(Some(journal))
    }

    pub fn save(&self, path: &NormalizedPath) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| Error::Journal {
            message: e.to_string(),
        })?;
        io::write_atomic(path, content.as_bytes())?;
        Ok(())
    }

    pub fn remove(path: &NormalizedPath) {
        io::remove_quietly(path);
    }

    /// Finish the promotions a crashed run left pending, then delete the
    /// journal. Returns the files that were promoted.
    pub fn roll_forward(path: &NormalizedPath) -> Result<Vec<SyncedFile>> {
        let Some(journal) = Self::load(path)? else {
            return Ok(Vec::new());
        };
        tracing::warn!(
            run_id = %journal.run_id,
            pending = journal.pending().count(),
            "Found interrupted sync journal, rolling forward"
        );

        let mut recovered = Vec::new();
        for entry in journal.pending() {
            if !entry.staged.is_file() {
                tracing::warn!(
                    staged = %entry.staged,
                    "Staged file missing, dropping journal entry"
                );
                continue;
            }
            let content = io::read_bytes(&entry.staged)?;
            if compute_checksum(&content) != entry.checksum {
                tracing::warn!(staged = %entry.staged, "Staged file checksum mismatch, discarding");
                io::remove_quietly(&entry.staged);
                continue;
            }
            io::promote(&entry.staged, &entry.target)?;
            tracing::debug!(path = %entry.target, "Recovered staged file");
            recovered.push(entry.synced_file());
        }

        Self::remove(path);
        Ok(recovered)
    }
}
