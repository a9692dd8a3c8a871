//! Staged writes, commit and rollback
//!
//! Every output is first written in full to `<target>.tmp`. Commit promotes
//! the staged files in staging order under a [`CommitJournal`]; rollback
//! removes every staged path that was ever touched.

use super::journal::{CommitJournal, EntryStatus, JournalEntry};
use super::report::SyncedFile;
use crate::cancel::CancellationToken;
use crate::{Error, Result};
use codeflow_fs::checksum::compute_checksum;
use codeflow_fs::{NormalizedPath, STAGING_SUFFIX, io};

/// A fully written temp file and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub agent: String,
    pub from: NormalizedPath,
    pub staged: NormalizedPath,
    pub target: NormalizedPath,
    pub checksum: String,
}

impl StagedFile {
    fn synced_file(&self) -> SyncedFile {
        SyncedFile {
            from: self.from.clone(),
            to: self.target.clone(),
            agent: self.agent.clone(),
        }
    }
}

/// The temp files of one run.
#[derive(Debug)]
pub struct StagingArea {
    journal_path: NormalizedPath,
    dry_run: bool,
    staged: Vec<StagedFile>,
    /// Every temp path a write was attempted for, including failed ones.
    touched: Vec<NormalizedPath>,
}

impl StagingArea {
    pub fn new(journal_path: NormalizedPath) -> Self {
        Self {
            journal_path,
            dry_run: false,
            staged: Vec::new(),
            touched: Vec::new(),
        }
    }

    /// A staging area that records plans without touching the filesystem.
    pub fn dry_run(journal_path: NormalizedPath) -> Self {
        Self {
            dry_run: true,
            ..Self::new(journal_path)
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn staged(&self) -> &[StagedFile] {
        &self.staged
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Write `content` in full to `<target>.tmp`.
    pub fn stage(
        &mut self,
        agent: &str,
        from: &NormalizedPath,
        target: &NormalizedPath,
        content: &[u8],
    ) -> Result<()> {
        let staged = target.with_suffix(STAGING_SUFFIX);

        if !self.dry_run {
            self.touched.push(staged.clone());
            if let Err(e) = io::write_staged(&staged, content) {
                io::remove_quietly(&staged);
                return Err(e.into());
            }
            tracing::debug!(staged = %staged, "Staged file");
        }

        self.staged.push(StagedFile {
            agent: agent.to_string(),
            from: from.clone(),
            staged,
            target: target.clone(),
            checksum: compute_checksum(content),
        });
        Ok(())
    }

    /// Promote every staged file in staging order.
    ///
    /// On error the caller is expected to [`rollback`](Self::rollback).
    pub fn commit(&mut self, cancellation: &CancellationToken) -> Result<Vec<SyncedFile>> {
        if self.dry_run {
            return Ok(self.staged.iter().map(StagedFile::synced_file).collect());
        }
        if self.staged.is_empty() {
            return Ok(Vec::new());
        }

        let mut journal = CommitJournal::new(
            self.staged
                .iter()
                .map(|s| JournalEntry {
                    agent: s.agent.clone(),
                    from: s.from.clone(),
                    staged: s.staged.clone(),
                    target: s.target.clone(),
                    checksum: s.checksum.clone(),
                    status: EntryStatus::Pending,
                })
                .collect(),
        );
        journal.save(&self.journal_path)?;

        let mut synced = Vec::with_capacity(self.staged.len());
        for (index, file) in self.staged.iter().enumerate() {
            if cancellation.is_cancelled() {
                return Err(Error::Cancelled {
                    phase: "committing".to_string(),
                });
            }
            let how = io::promote(&file.staged, &file.target)?;
            journal.mark_committed(index);
            journal.save(&self.journal_path)?;
            tracing::debug!(path = %file.target, promotion = ?how, "Committed file");
            synced.push(file.synced_file());
        }

        CommitJournal::remove(&self.journal_path);
        Ok(synced)
    }

    /// Remove every touched temp file and the journal. Never fails.
    ///
    /// Returns the number of temp files removed.
    pub fn rollback(&self) -> usize {
        if self.dry_run {
            return 0;
        }
        let removed = self.touched.iter().filter(|path| io::remove_quietly(path)).count();
        CommitJournal::remove(&self.journal_path);
        tracing::info!(removed, "Rolled back staged files");
        removed
    }
}
