//! Shared test utilities for the codeflow workspace.
//!
//! Dev-dependency only, never published.
//!
//! - [`workspace`]: [`TestWorkspace`], a temporary project plus home directory
//! - [`fixtures`]: ready-made agent and command file contents

pub mod fixtures;
pub mod workspace;

pub use workspace::TestWorkspace;
