use assert_fs::prelude::*;
use codeflow_fs::{NormalizedPath, Promotion, io};
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_write_atomic_creates_parent_and_file() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("nested/dir/journal.toml"));

    io::write_atomic(&path, b"version = 1").unwrap();

    assert_eq!(fs::read_to_string(path.to_native()).unwrap(), "version = 1");
}

#[test]
fn test_write_atomic_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("journal.toml");
    fs::write(&file_path, "original").unwrap();

    io::write_atomic(&NormalizedPath::new(&file_path), b"updated").unwrap();

    assert_eq!(fs::read_to_string(&file_path).unwrap(), "updated");
    // No stray temp files left beside the target
    let leftovers: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_write_staged_creates_directories() {
    let temp = assert_fs::TempDir::new().unwrap();
    let staged = NormalizedPath::new(temp.path().join(".claude/agents/reviewer.md.tmp"));

    io::write_staged(&staged, b"---\nname: reviewer\n---\n").unwrap();

    temp.child(".claude/agents/reviewer.md.tmp")
        .assert(predicate::str::contains("name: reviewer"));
}

#[test]
fn test_promote_renames_over_existing_target() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("agent.md").write_str("old").unwrap();
    temp.child("agent.md.tmp").write_str("new").unwrap();

    let staged = NormalizedPath::new(temp.path().join("agent.md.tmp"));
    let target = NormalizedPath::new(temp.path().join("agent.md"));
    let how = io::promote(&staged, &target).unwrap();

    assert_eq!(how, Promotion::Renamed);
    temp.child("agent.md").assert("new");
    temp.child("agent.md.tmp").assert(predicate::path::missing());
}

#[test]
fn test_promote_missing_staged_file_fails() {
    let temp = TempDir::new().unwrap();
    let staged = NormalizedPath::new(temp.path().join("absent.md.tmp"));
    let target = NormalizedPath::new(temp.path().join("absent.md"));

    let err = io::promote(&staged, &target).unwrap_err();
    assert!(err.is_not_found());
    assert!(!target.exists());
}

#[test]
fn test_remove_quietly_reports_removal() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("x.tmp"));
    fs::write(path.to_native(), "x").unwrap();

    assert!(io::remove_quietly(&path));
    assert!(!io::remove_quietly(&path));
}

#[test]
fn test_read_text_nonexistent_file() {
    let path = NormalizedPath::new("/nonexistent/codeflow/file.md");
    assert!(io::read_text(&path).is_err());
}
