//! Write primitives: atomic replace, staged writes, promotion and cleanup

use crate::{Error, NormalizedPath, Result};
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::Write;

/// How a staged file reached its final path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    /// Same-filesystem rename; the destination was replaced in one step.
    Renamed,
    /// Rename failed and the content was copied, then the source removed.
    Copied,
}

fn ensure_parent(path: &NormalizedPath) -> Result<()> {
    let native_path = path.to_native();
    if let Some(parent) = native_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    Ok(())
}

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename so readers see either the old or the new
/// content. Acquires an advisory lock on the temp file while writing.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();
    ensure_parent(path)?;

    // Same directory keeps the rename on one filesystem
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name().unwrap_or_default(),
        std::process::id()
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    FileExt::lock_exclusive(&temp_file).map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;
    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;
    FileExt::unlock(&temp_file).map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;

    fs::rename(&temp_path, &native_path).map_err(|e| Error::io(&native_path, e))?;
    Ok(())
}

/// Write the full content of a staged file and flush it to disk.
///
/// Parent directories are created as needed. The file is complete once this
/// returns `Ok`.
pub fn write_staged(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();
    ensure_parent(path)?;

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&native_path)
        .map_err(|e| Error::io(&native_path, e))?;
    file.write_all(content)
        .map_err(|e| Error::io(&native_path, e))?;
    file.sync_all().map_err(|e| Error::io(&native_path, e))?;
    Ok(())
}

/// Move a staged file onto its final path.
///
/// Tries a rename first; if that fails (e.g. across filesystems) falls back
/// to copy followed by removal of the staged file.
pub fn promote(staged: &NormalizedPath, target: &NormalizedPath) -> Result<Promotion> {
    let from = staged.to_native();
    let to = target.to_native();

    match fs::rename(&from, &to) {
        Ok(()) => Ok(Promotion::Renamed),
        Err(rename_err) => {
            tracing::debug!(
                "rename {} -> {} failed ({}), falling back to copy",
                staged,
                target,
                rename_err
            );
            ensure_parent(target)?;
            fs::copy(&from, &to).map_err(|e| Error::io(&to, e))?;
            fs::remove_file(&from).map_err(|e| Error::io(&from, e))?;
            Ok(Promotion::Copied)
        }
    }
}

/// Remove a file, ignoring every error.
///
/// Returns whether a file was actually removed.
pub fn remove_quietly(path: &NormalizedPath) -> bool {
    match fs::remove_file(path.to_native()) {
        Ok(()) => true,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!("ignoring failure to remove {}: {}", path, e);
            }
            false
        }
    }
}

/// Read raw bytes from a file.
pub fn read_bytes(path: &NormalizedPath) -> Result<Vec<u8>> {
    let native_path = path.to_native();
    fs::read(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}
