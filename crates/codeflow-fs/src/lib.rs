//! Filesystem primitives for codeflow
//!
//! Provides forward-slash normalized paths, the well-known client directory
//! layout, and the write primitives the sync engine builds its staging and
//! commit phases on.

pub mod checksum;
pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod path;

pub use config::ConfigStore;
pub use constants::{ClientDir, MANIFEST_FILE_NAME, STAGING_SUFFIX, STATE_DIR};
pub use error::{Error, Result};
pub use io::Promotion;
pub use path::NormalizedPath;
