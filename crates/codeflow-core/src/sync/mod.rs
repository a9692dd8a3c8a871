//! Canonical synchronization
//!
//! A run moves through `Loading -> Validating -> Staging -> Committing ->
//! Done`. Validation covers the whole manifest before anything is written;
//! staging and commit either publish every staged file or roll back.

mod engine;
mod journal;
mod report;
mod staging;

pub use engine::{CanonicalSyncer, Collaborators, SyncOptions, SyncPhase};
pub use journal::{CommitJournal, EntryStatus, JOURNAL_FILE_NAME, JournalEntry};
pub use report::{
    EnhancedSyncError, SkippedItem, SyncErrorKind, SyncResult, SyncedFile, ValidatedItem,
    ValidationOutcome,
};
pub use staging::{StagedFile, StagingArea};
