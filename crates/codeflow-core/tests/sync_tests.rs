//! Integration tests for CanonicalSyncer

use codeflow_core::sync::{CommitJournal, EntryStatus, JournalEntry};
use codeflow_core::{
    CancellationToken, CanonicalSyncer, EngineConfig, Error, HealthTracker, PathResolver,
    SyncErrorKind, SyncOptions, SyncPhase, SyncTarget,
};
use codeflow_fs::NormalizedPath;
use codeflow_fs::checksum::compute_checksum;
use codeflow_meta::{Entity, EntitySerializer, Format};
use codeflow_test_utils::{TestWorkspace, fixtures};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;
use std::cell::Cell;
use std::collections::BTreeSet;
use std::fs;

fn syncer(ws: &TestWorkspace) -> CanonicalSyncer {
    CanonicalSyncer::new(PathResolver::new(ws.project(), ws.home()), EngineConfig::default())
}

fn workspace_with_agents(names: &[&str]) -> TestWorkspace {
    let ws = TestWorkspace::new();
    let mut items = Vec::new();
    for name in names {
        ws.write_agent(&format!("agents/{}.md", name), &fixtures::base_agent(name));
    }
    let sources: Vec<String> = names.iter().map(|n| format!("agents/{}.md", n)).collect();
    for (name, source) in names.iter().zip(&sources) {
        items.push((*name, source.as_str()));
    }
    ws.write_manifest(&items);
    ws
}

/// Serializes normally until `fail_at` calls have been made.
struct FailingSerializer {
    calls: Cell<usize>,
    fail_at: usize,
}

impl FailingSerializer {
    fn failing_at(fail_at: usize) -> Self {
        Self {
            calls: Cell::new(0),
            fail_at,
        }
    }
}

impl EntitySerializer for FailingSerializer {
    fn serialize(&self, entity: &Entity) -> codeflow_meta::Result<String> {
        let call = self.calls.get() + 1;
        self.calls.set(call);
        if call >= self.fail_at {
            return Err(codeflow_meta::Error::Serialization {
                message: "emitter exploded".to_string(),
            });
        }
        codeflow_meta::YamlSerializer::new().serialize(entity)
    }
}

/// Requests cancellation the first time it is asked to serialize.
struct CancellingSerializer {
    token: CancellationToken,
}

impl EntitySerializer for CancellingSerializer {
    fn serialize(&self, entity: &Entity) -> codeflow_meta::Result<String> {
        self.token.cancel();
        codeflow_meta::YamlSerializer::new().serialize(entity)
    }
}

fn leftover_journal(syncer: &CanonicalSyncer, target: &NormalizedPath, content: &[u8]) {
    let staged = target.with_suffix(".tmp");
    fs::create_dir_all(target.parent().unwrap().to_native()).unwrap();
    fs::write(staged.to_native(), content).unwrap();
    CommitJournal::new(vec![JournalEntry {
        agent: "old".to_string(),
        from: target.clone(),
        staged,
        target: target.clone(),
        checksum: compute_checksum(content),
        status: EntryStatus::Pending,
    }])
    .save(&syncer.journal_path())
    .unwrap();
}

#[test]
fn test_sync_to_project_writes_both_clients() {
    let ws = workspace_with_agents(&["reviewer"]);
    let mut syncer = syncer(&ws);

    let result = syncer.sync_to_project(Format::Base, false).unwrap();

    assert_eq!(result.synced.len(), 2);
    assert!(result.errors.is_empty());
    let claude = ws.read_project_file(".claude/agents/reviewer.md");
    assert!(claude.starts_with("---\nname: reviewer\n"));
    assert!(claude.contains("tools: read\nmodel: sonnet\n"));
    assert!(claude.ends_with("# reviewer\n\nDo the reviewer work.\n"));

    let opencode = ws.read_project_file(".opencode/agent/reviewer.md");
    assert!(opencode.contains("mode: subagent"));
    assert!(opencode.contains("model: opencode/grok-code"));
    assert!(opencode.contains("edit: deny"));

    ws.assert_no_temp_files();
    ws.assert_project_file_not_exists(".codeflow/sync-journal.toml");
    assert_eq!(syncer.phase(), SyncPhase::Done);
}

#[test]
fn test_synced_records_source_target_and_agent() {
    let ws = workspace_with_agents(&["reviewer"]);
    let mut syncer = syncer(&ws);

    let result = syncer.sync_to_project(Format::Base, false).unwrap();

    let source = NormalizedPath::new(ws.project()).join("agents/reviewer.md");
    let project = NormalizedPath::new(ws.project());
    let expected_targets = vec![
        project.join(".claude/agents/reviewer.md"),
        project.join(".opencode/agent/reviewer.md"),
    ];
    let targets: Vec<_> = result.synced.iter().map(|f| f.to.clone()).collect();
    assert_eq!(targets, expected_targets);
    assert!(result.synced.iter().all(|f| f.from == source && f.agent == "reviewer"));
}

#[test]
fn test_sync_to_global_writes_home_paths() {
    let ws = workspace_with_agents(&["reviewer"]);
    let mut syncer = syncer(&ws);

    syncer.sync_to_global(Format::Base, false).unwrap();

    ws.assert_home_file_exists(".claude/agents/reviewer.md");
    ws.assert_home_file_exists(".config/opencode/agent/reviewer.md");
    ws.assert_project_file_not_exists(".claude/agents/reviewer.md");
}

#[test]
fn test_missing_source_fails_validation() {
    let ws = TestWorkspace::new();
    ws.write_manifest(&[("x", "/does/not/exist.md")]);
    let mut syncer = syncer(&ws);

    let err = syncer.sync_to_project(Format::Base, false).unwrap_err();

    assert!(err.to_string().contains("agents failed validation"));
    let Error::ValidationFailed { count, errors } = err else {
        panic!("expected validation failure");
    };
    assert_eq!(count, 1);
    assert_eq!(errors[0].agent, "x");
    assert_eq!(errors[0].kind, SyncErrorKind::Filesystem);
    assert!(errors[0].suggestion.is_some());
}

#[test]
fn test_same_format_copies_bytes_verbatim() {
    let ws = TestWorkspace::new();
    // Odd spacing and key order that a serializer would not reproduce
    let source = "---\nname:   planner\ndescription: Plans the work ahead\nmodel: inherit\n---\n\nPlan carefully.\n";
    ws.write_agent("claude/planner.md", source);
    ws.write_manifest_json(&json!({
        "canonical_agents": [
            { "name": "planner", "sources": { "claude-code": "claude/planner.md" } }
        ]
    }));
    let mut syncer = syncer(&ws);

    syncer.sync_to_project(Format::ClaudeCode, false).unwrap();

    assert_eq!(ws.read_project_file(".claude/agents/planner.md"), source);
}

#[test]
fn test_repeated_sync_is_stable() {
    let ws = workspace_with_agents(&["reviewer", "planner"]);
    let mut syncer = syncer(&ws);

    let first = syncer.sync_to_project(Format::Base, false).unwrap();
    let total_after_first = syncer.sync_health().total_agents;
    let second = syncer.sync_to_project(Format::Base, false).unwrap();

    assert_eq!(first.synced.len(), second.synced.len());
    assert_eq!(syncer.sync_health().total_agents, total_after_first);
}

#[test]
fn test_idempotent_output() {
    let ws = workspace_with_agents(&["reviewer", "planner"]);
    let mut syncer = syncer(&ws);

    let first = syncer.sync_to_project(Format::Base, false).unwrap();
    let snapshot: Vec<(std::path::PathBuf, Vec<u8>)> = ws
        .files_under("project/.claude")
        .into_iter()
        .chain(ws.files_under("project/.opencode"))
        .map(|p| {
            let bytes = fs::read(&p).unwrap();
            (p, bytes)
        })
        .collect();

    let second = syncer.sync_to_project(Format::Base, false).unwrap();

    for (path, bytes) in &snapshot {
        assert_eq!(&fs::read(path).unwrap(), bytes, "{} changed", path.display());
    }
    assert_eq!(first.synced, second.synced);
}

#[test]
fn test_validation_failure_blocks_all_writes() {
    let ws = TestWorkspace::new();
    ws.write_agent("agents/good.md", &fixtures::base_agent("good"));
    ws.write_agent("agents/bad.md", &fixtures::invalid_base_agent("bad"));
    ws.write_agent("agents/broken.md", &fixtures::malformed_agent("broken"));
    ws.write_manifest(&[
        ("good", "agents/good.md"),
        ("bad", "agents/bad.md"),
        ("broken", "agents/broken.md"),
    ]);
    let mut syncer = syncer(&ws);

    let err = syncer.sync_to_project(Format::Base, false).unwrap_err();

    let Error::ValidationFailed { count, errors } = err else {
        panic!("expected validation failure");
    };
    assert_eq!(count, 2);
    let failed: Vec<(&str, SyncErrorKind)> =
        errors.iter().map(|e| (e.agent.as_str(), e.kind)).collect();
    assert_eq!(
        failed,
        vec![("bad", SyncErrorKind::Validation), ("broken", SyncErrorKind::Parsing)]
    );

    ws.assert_project_file_not_exists(".claude");
    ws.assert_project_file_not_exists(".opencode");
    ws.assert_no_temp_files();
    assert_eq!(syncer.phase(), SyncPhase::Aborted);

    let health = syncer.sync_health();
    assert_eq!(health.failed_agents, 1);
    assert!(health.last_error.unwrap().contains("2 agents failed validation"));
}

#[test]
fn test_force_syncs_valid_items_and_reports_the_rest() {
    let ws = TestWorkspace::new();
    ws.write_agent("agents/good.md", &fixtures::base_agent("good"));
    ws.write_agent("agents/bad.md", &fixtures::invalid_base_agent("bad"));
    ws.write_manifest(&[
        ("good", "agents/good.md"),
        ("bad", "agents/bad.md"),
        ("gone", "agents/gone.md"),
    ]);
    let mut syncer = syncer(&ws);

    let result = syncer.sync_to_project(Format::Base, true).unwrap();

    let synced: BTreeSet<&str> = result.synced.iter().map(|f| f.agent.as_str()).collect();
    let failed: BTreeSet<&str> = result.errors.iter().map(|e| e.agent.as_str()).collect();
    assert_eq!(synced, BTreeSet::from(["good"]));
    assert_eq!(failed, BTreeSet::from(["bad", "gone"]));
    assert!(synced.is_disjoint(&failed));

    let skipped: Vec<(&str, &str, &str)> = result
        .skipped
        .iter()
        .map(|s| (s.agent.as_str(), s.target.as_str(), s.reason.as_str()))
        .collect();
    assert_eq!(
        skipped,
        vec![("bad", "project", "failed validation"), ("gone", "project", "failed validation")]
    );

    ws.assert_project_file_exists(".claude/agents/good.md");
    ws.assert_project_file_not_exists(".claude/agents/bad.md");

    let health = syncer.sync_health();
    assert_eq!(health.total_agents, 3);
    assert_eq!(health.synced_agents, 2);
    assert_eq!(health.failed_agents, 2);
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(5)]
fn test_serializer_failure_rolls_back_everything(#[case] agents: usize) {
    let names: Vec<String> = (0..agents).map(|i| format!("agent-{}", i)).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let ws = workspace_with_agents(&refs);
    // Two converted files per agent; fail on the very last one
    let mut syncer = syncer(&ws).with_serializer(FailingSerializer::failing_at(agents * 2));

    let err = syncer.sync_to_project(Format::Base, false).unwrap_err();

    assert!(matches!(err, Error::Serialization { .. }));
    assert!(err.to_string().starts_with("YAML serialization failed for agent-"));
    ws.assert_no_temp_files();
    assert!(ws.files_under("project/.claude").is_empty());
    assert!(ws.files_under("project/.opencode").is_empty());
    ws.assert_project_file_not_exists(".codeflow/sync-journal.toml");
}

#[test]
fn test_commit_failure_keeps_earlier_files_and_cleans_up() {
    let ws = workspace_with_agents(&["a", "b"]);
    // A non-empty directory where the last file would land
    ws.write_agent(".opencode/agent/b.md/keep", "occupied");
    let mut syncer = syncer(&ws);

    let err = syncer.sync_to_project(Format::Base, false).unwrap_err();

    assert!(matches!(err, Error::Fs(_)));
    assert_eq!(syncer.phase(), SyncPhase::Aborted);
    ws.assert_no_temp_files();
    assert!(!syncer.journal_path().exists());
    ws.assert_project_file_exists(".claude/agents/a.md");
    ws.assert_project_file_exists(".opencode/agent/a.md");
    ws.assert_project_file_exists(".claude/agents/b.md");

    let health = syncer.sync_health();
    assert_eq!(health.failed_agents, 1);
    assert_eq!(health.last_error, Some(err.to_string()));
}

#[test]
fn test_cancellation_during_staging() {
    let ws = workspace_with_agents(&["reviewer"]);
    let token = CancellationToken::new();
    let mut syncer = syncer(&ws).with_serializer(CancellingSerializer {
        token: token.clone(),
    });

    let err = syncer
        .sync_from_canonical(
            SyncOptions::new(SyncTarget::Project, Format::Base).with_cancellation(token),
        )
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled { ref phase } if phase == "staging"));
    ws.assert_no_temp_files();
    assert!(ws.files_under("project/.claude").is_empty());
    assert!(ws.files_under("project/.opencode").is_empty());
    assert!(!syncer.journal_path().exists());
}

#[test]
fn test_dry_run_reports_without_writing() {
    let ws = workspace_with_agents(&["reviewer"]);
    ws.write_command("plan.md", &fixtures::command("plan"));
    let mut syncer = syncer(&ws);

    let result = syncer.dry_run(SyncTarget::All, Format::Base).unwrap();

    assert!(result.dry_run);
    assert_eq!(result.synced.len(), 8);
    ws.assert_project_file_not_exists(".claude");
    ws.assert_project_file_not_exists(".opencode");
    ws.assert_project_file_not_exists(".codeflow");
    assert!(ws.files_under("home").is_empty());

    let real = syncer.sync_from_canonical(SyncOptions::new(SyncTarget::All, Format::Base)).unwrap();
    assert_eq!(real.synced, result.synced);
}

#[test]
fn test_dry_run_applies_validation_gate() {
    let ws = TestWorkspace::new();
    ws.write_agent("agents/bad.md", &fixtures::invalid_base_agent("bad"));
    ws.write_manifest(&[("bad", "agents/bad.md")]);
    let mut syncer = syncer(&ws);

    let err = syncer.dry_run(SyncTarget::Project, Format::Base).unwrap_err();
    assert!(err.is_validation_failure());
}

#[test]
fn test_command_files_are_copied_verbatim() {
    let ws = workspace_with_agents(&["reviewer"]);
    let plan = fixtures::command("plan");
    ws.write_command("plan.md", &plan);
    ws.write_command("notes.txt", "not a command");
    let mut syncer = syncer(&ws);

    let result = syncer.sync_to_project(Format::Base, false).unwrap();

    assert_eq!(ws.read_project_file(".claude/commands/plan.md"), plan);
    assert_eq!(ws.read_project_file(".opencode/command/plan.md"), plan);
    ws.assert_project_file_not_exists(".claude/commands/notes.txt");
    let commands: Vec<_> = result.synced.iter().filter(|f| f.agent == "plan").collect();
    assert_eq!(commands.len(), 2);
    assert!(commands[0].from.as_str().ends_with("command/plan.md"));
}

#[test]
fn test_custom_command_dir_from_config() {
    let ws = workspace_with_agents(&["reviewer"]);
    ws.write_agent("workflows/ship.md", &fixtures::command("ship"));
    let config = EngineConfig {
        command_dir: "workflows".to_string(),
        ..EngineConfig::default()
    };
    let mut syncer = CanonicalSyncer::new(PathResolver::new(ws.project(), ws.home()), config);

    syncer.sync_to_project(Format::Base, false).unwrap();

    ws.assert_project_file_exists(".claude/commands/ship.md");
}

#[test]
fn test_missing_manifest_is_fatal_and_counted() {
    let ws = TestWorkspace::new();
    let config = EngineConfig {
        manifest: codeflow_core::ManifestConfig {
            max_depth: 0,
            allow_legacy: true,
        },
        ..EngineConfig::default()
    };
    let mut syncer = CanonicalSyncer::new(PathResolver::new(ws.project(), ws.home()), config);

    let err = syncer.sync_to_project(Format::Base, false).unwrap_err();

    assert!(matches!(err, Error::ManifestUnavailable { .. }));
    assert!(err.to_string().starts_with("AGENT_MANIFEST.json not found. "));
    assert_eq!(syncer.sync_health().failed_agents, 1);
}

#[test]
fn test_in_memory_manifest_loader() {
    let ws = TestWorkspace::new();
    let source = ws.write_agent("defs/helper.md", &fixtures::base_agent("helper"));
    let manifest = codeflow_meta::AgentManifest::new(vec![
        codeflow_meta::CanonicalItem::new("helper").with_source(Format::Base, source),
    ]);
    let mut syncer = syncer(&ws).with_loader(manifest);

    let result = syncer.sync_to_project(Format::Base, false).unwrap();

    assert_eq!(result.synced.len(), 2);
}

#[test]
fn test_cancellation_before_validation() {
    let ws = workspace_with_agents(&["reviewer"]);
    let mut syncer = syncer(&ws);
    let token = CancellationToken::new();
    token.cancel();

    let err = syncer
        .sync_from_canonical(
            SyncOptions::new(SyncTarget::Project, Format::Base).with_cancellation(token),
        )
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled { ref phase } if phase == "validating"));
    ws.assert_project_file_not_exists(".claude");
    ws.assert_no_temp_files();
}

#[test]
fn test_validate_all_does_not_touch_health() {
    let ws = TestWorkspace::new();
    ws.write_agent("agents/good.md", &fixtures::base_agent("good"));
    ws.write_agent("agents/bad.md", &fixtures::invalid_base_agent("bad"));
    ws.write_manifest(&[("good", "agents/good.md"), ("bad", "agents/bad.md")]);
    let syncer = syncer(&ws);

    let outcome = syncer.validate_all(Format::Base).unwrap();

    assert_eq!(outcome.valid.len(), 1);
    assert_eq!(outcome.failed_agents(), vec!["bad"]);
    assert_eq!(syncer.sync_health().total_agents, 0);
}

#[test]
fn test_shared_health_tracker() {
    let ws = workspace_with_agents(&["reviewer"]);
    let tracker = HealthTracker::new();
    let mut syncer = syncer(&ws).with_health(tracker.clone());

    syncer.sync_to_project(Format::Base, false).unwrap();

    let health = tracker.snapshot();
    assert_eq!(health.total_agents, 1);
    assert_eq!(health.synced_agents, 2);
    assert!(health.average_sync_time > 0.0);
    assert_eq!(syncer.sync_health_summary().message, "Healthy: 0.0% sync failure rate");
}

#[test]
fn test_interrupted_commit_is_rolled_forward() {
    let ws = workspace_with_agents(&["reviewer"]);
    let project = NormalizedPath::new(ws.project());
    let target = project.join(".claude/agents/leftover.md");
    let staged = target.with_suffix(".tmp");
    fs::create_dir_all(target.parent().unwrap().to_native()).unwrap();
    fs::write(staged.to_native(), b"recovered content").unwrap();

    let journal = CommitJournal::new(vec![JournalEntry {
        agent: "leftover".to_string(),
        from: project.join("agents/leftover.md"),
        staged: staged.clone(),
        target: target.clone(),
        checksum: compute_checksum(b"recovered content"),
        status: EntryStatus::Pending,
    }]);
    let syncer = syncer(&ws);
    journal.save(&syncer.journal_path()).unwrap();

    let recovered = syncer.recover().unwrap();

    assert_eq!(recovered.len(), 1);
    assert_eq!(recovered[0].to, target);
    assert_eq!(fs::read_to_string(target.to_native()).unwrap(), "recovered content");
    assert!(!staged.exists());
    assert!(!syncer.journal_path().exists());
}

#[test]
fn test_sync_recovers_leftover_journal() {
    let ws = workspace_with_agents(&["reviewer"]);
    let target = NormalizedPath::new(ws.project()).join(".opencode/agent/old.md");
    let mut syncer = syncer(&ws);
    leftover_journal(&syncer, &target, b"old");

    syncer.sync_to_project(Format::Base, false).unwrap();

    assert!(target.exists());
    assert!(!syncer.journal_path().exists());
    ws.assert_no_temp_files();
}

#[test]
fn test_failed_validation_leaves_leftover_journal_alone() {
    let ws = TestWorkspace::new();
    ws.write_agent("agents/bad.md", &fixtures::invalid_base_agent("bad"));
    ws.write_manifest(&[("bad", "agents/bad.md")]);
    let target = NormalizedPath::new(ws.project()).join(".opencode/agent/old.md");
    let mut syncer = syncer(&ws);
    leftover_journal(&syncer, &target, b"old");

    let err = syncer.sync_to_project(Format::Base, false).unwrap_err();

    assert!(matches!(err, Error::ValidationFailed { count: 1, .. }));
    assert!(!target.exists());
    assert!(target.with_suffix(".tmp").exists());
    assert!(syncer.journal_path().exists());
}
