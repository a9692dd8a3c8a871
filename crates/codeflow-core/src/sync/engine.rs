//! CanonicalSyncer implementation
//!
//! Loads the manifest, validates every item, stages converted output for
//! every destination and commits the batch. Any failure after staging has
//! started rolls back every temp file before the error is returned.

use std::fs;
use std::time::Instant;

use codeflow_fs::{NormalizedPath, io};
use codeflow_meta::{
    AgentManifest, EntityParser, EntitySerializer, EntityValidator, Format, FormatConverter,
    FrontmatterParser, ManifestDiscovery, ManifestLoader, SchemaConverter, SchemaValidator,
    YamlSerializer,
};

use super::journal::{CommitJournal, JOURNAL_FILE_NAME};
use super::report::{
    EnhancedSyncError, SkippedItem, SyncResult, SyncedFile, ValidatedItem, ValidationOutcome,
};
use super::staging::StagingArea;
use crate::cancel::CancellationToken;
use crate::config::EngineConfig;
use crate::health::{HealthSummary, HealthTracker, SyncHealth};
use crate::paths::{PathResolver, SyncTarget};
use crate::{Error, Result};

const FAILED_VALIDATION: &str = "failed validation";

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
    #[default]
    Idle,
    Loading,
    Validating,
    Staging,
    Committing,
    Done,
    Aborted,
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Validating => "validating",
            Self::Staging => "staging",
            Self::Committing => "committing",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Options for one sync run
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub target: SyncTarget,
    /// Which manifest source to read for every item.
    pub source_format: Format,
    /// Report what would be written without writing anything.
    pub dry_run: bool,
    /// Sync the valid items even when others failed validation.
    pub force: bool,
    pub cancellation: CancellationToken,
}

impl SyncOptions {
    pub fn new(target: SyncTarget, source_format: Format) -> Self {
        Self {
            target,
            source_format,
            ..Default::default()
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }
}

/// The pluggable parts of the engine.
pub struct Collaborators {
    pub loader: Box<dyn ManifestLoader>,
    pub parser: Box<dyn EntityParser>,
    pub validator: Box<dyn EntityValidator>,
    pub converter: Box<dyn FormatConverter>,
    pub serializer: Box<dyn EntitySerializer>,
}

impl Collaborators {
    /// Default implementations, discovering the manifest from `project_root`.
    pub fn standard(project_root: &NormalizedPath, config: &EngineConfig) -> Self {
        Self {
            loader: Box::new(
                ManifestDiscovery::new(project_root.clone())
                    .with_max_depth(config.manifest.max_depth)
                    .with_legacy(config.manifest.allow_legacy),
            ),
            parser: Box::new(FrontmatterParser::new()),
            validator: Box::new(SchemaValidator::new()),
            converter: Box::new(SchemaConverter::new()),
            serializer: Box::new(YamlSerializer::new()),
        }
    }
}

/// Synchronizes canonical definitions out to every client installation.
///
/// One engine must not run syncs concurrently; `sync_from_canonical` takes
/// `&mut self` for that reason. Health is kept in a [`HealthTracker`] that
/// can be shared with observers.
pub struct CanonicalSyncer {
    resolver: PathResolver,
    config: EngineConfig,
    collaborators: Collaborators,
    health: HealthTracker,
    phase: SyncPhase,
}

impl CanonicalSyncer {
    pub fn new(resolver: PathResolver, config: EngineConfig) -> Self {
        let collaborators = Collaborators::standard(resolver.project_root(), &config);
        Self {
            resolver,
            config,
            collaborators,
            health: HealthTracker::new(),
            phase: SyncPhase::Idle,
        }
    }

    /// Engine for the current directory and home, with the project's config.
    ///
    /// # Errors
    ///
    /// Fails when the directories cannot be determined or the config file
    /// does not parse.
    pub fn from_env() -> Result<Self> {
        let resolver = PathResolver::from_env()?;
        let config = EngineConfig::load(resolver.project_root())?;
        Ok(Self::new(resolver, config))
    }

    pub fn with_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    pub fn with_loader(mut self, loader: impl ManifestLoader + 'static) -> Self {
        self.collaborators.loader = Box::new(loader);
        self
    }

    pub fn with_serializer(mut self, serializer: impl EntitySerializer + 'static) -> Self {
        self.collaborators.serializer = Box::new(serializer);
        self
    }

    pub fn with_health(mut self, health: HealthTracker) -> Self {
        self.health = health;
        self
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Phase the last (or current) run reached.
    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn journal_path(&self) -> NormalizedPath {
        self.resolver
            .project_root()
            .resolve(&self.config.state_dir)
            .join(JOURNAL_FILE_NAME)
    }

    fn command_dir(&self) -> NormalizedPath {
        self.resolver.project_root().resolve(&self.config.command_dir)
    }

    /// Run a full sync.
    ///
    /// # Errors
    ///
    /// Fails when the manifest cannot be loaded, when validation fails and
    /// `force` is not set, on conversion, serialization or I/O failure while
    /// staging or committing, and on cancellation. Health is updated on
    /// every path.
    ///
    /// A journal left by an interrupted commit is rolled forward after the
    /// validation gate and before staging, so a run that fails to load or
    /// validate leaves it in place. Dry runs never recover it.
    pub fn sync_from_canonical(&mut self, options: SyncOptions) -> Result<SyncResult> {
        let started = Instant::now();
        tracing::info!(
            sync_target = %options.target,
            source_format = %options.source_format,
            dry_run = options.dry_run,
            force = options.force,
            "Starting canonical sync"
        );

        match self.run(&options) {
            Ok(result) => {
                self.set_phase(SyncPhase::Done);
                let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                self.health
                    .record_success(result.synced.len(), result.errors.len(), elapsed_ms);
                tracing::info!(
                    synced = result.synced.len(),
                    skipped = result.skipped.len(),
                    errors = result.errors.len(),
                    elapsed_ms,
                    "Sync finished"
                );
                Ok(result)
            }
            Err(e) => {
                self.set_phase(SyncPhase::Aborted);
                self.health.record_failure(e.to_string());
                tracing::info!(error = %e, "Sync aborted");
                Err(e)
            }
        }
    }

    /// Sync into the project installations.
    pub fn sync_to_project(&mut self, source_format: Format, force: bool) -> Result<SyncResult> {
        self.sync_from_canonical(
            SyncOptions::new(SyncTarget::Project, source_format).with_force(force),
        )
    }

    /// Sync into the user's global installations.
    pub fn sync_to_global(&mut self, source_format: Format, force: bool) -> Result<SyncResult> {
        self.sync_from_canonical(
            SyncOptions::new(SyncTarget::Global, source_format).with_force(force),
        )
    }

    /// Report what a sync would write, without writing.
    pub fn dry_run(&mut self, target: SyncTarget, source_format: Format) -> Result<SyncResult> {
        self.sync_from_canonical(SyncOptions::new(target, source_format).with_dry_run(true))
    }

    /// Load and validate the manifest without writing anything or
    /// touching health.
    pub fn validate_all(&self, source_format: Format) -> Result<ValidationOutcome> {
        let manifest = self.load_manifest()?;
        self.validate_items(&manifest, source_format, &CancellationToken::new())
    }

    /// Finish the commit of a run that died mid-commit.
    pub fn recover(&self) -> Result<Vec<SyncedFile>> {
        CommitJournal::roll_forward(&self.journal_path())
    }

    pub fn sync_health(&self) -> SyncHealth {
        self.health.snapshot()
    }

    pub fn sync_health_summary(&self) -> HealthSummary {
        self.health.summary()
    }

    fn set_phase(&mut self, phase: SyncPhase) {
        tracing::debug!(%phase, "Sync phase");
        self.phase = phase;
    }

    fn run(&mut self, options: &SyncOptions) -> Result<SyncResult> {
        self.set_phase(SyncPhase::Loading);
        let manifest = self.load_manifest()?;
        self.health.set_total_agents(manifest.len());

        self.set_phase(SyncPhase::Validating);
        let outcome = self.validate_items(&manifest, options.source_format, &options.cancellation)?;
        if !outcome.is_clean() {
            if !options.force {
                return Err(Error::ValidationFailed {
                    count: outcome.errors.len(),
                    errors: outcome.errors,
                });
            }
            tracing::warn!(
                failed = outcome.errors.len(),
                "Proceeding with valid agents only (--force)"
            );
        }

        let mut skipped = Vec::new();
        for agent in outcome.failed_agents() {
            for scope in options.target.scopes() {
                skipped.push(SkippedItem {
                    agent: agent.to_string(),
                    target: scope.to_string(),
                    reason: FAILED_VALIDATION.to_string(),
                });
            }
        }

        // A journal left by an interrupted run is only rolled forward once
        // this run is cleared to write.
        if options.dry_run {
            if self.journal_path().exists() {
                tracing::warn!("Interrupted sync journal present; dry run does not recover it");
            }
        } else {
            let recovered = self.recover()?;
            if !recovered.is_empty() {
                tracing::warn!(files = recovered.len(), "Recovered files from interrupted sync");
            }
        }

        self.set_phase(SyncPhase::Staging);
        let mut area = if options.dry_run {
            StagingArea::dry_run(self.journal_path())
        } else {
            StagingArea::new(self.journal_path())
        };

        let synced = match self.stage_and_commit(&mut area, &outcome.valid, options, &mut skipped) {
            Ok(synced) => synced,
            Err(e) => {
                area.rollback();
                return Err(e);
            }
        };

        Ok(SyncResult {
            synced,
            skipped,
            errors: outcome.errors,
            dry_run: options.dry_run,
        })
    }

    fn load_manifest(&self) -> Result<AgentManifest> {
        self.collaborators.loader.load_manifest().map_err(|e| match e {
            codeflow_meta::Error::ManifestInvalid { path, message } => {
                Error::ManifestInvalid { path, message }
            }
            other => Error::ManifestUnavailable {
                cause: other.to_string(),
            },
        })
    }

    fn validate_items(
        &self,
        manifest: &AgentManifest,
        source_format: Format,
        cancellation: &CancellationToken,
    ) -> Result<ValidationOutcome> {
        let mut outcome = ValidationOutcome::default();

        for item in &manifest.canonical_agents {
            if cancellation.is_cancelled() {
                return Err(Error::Cancelled {
                    phase: SyncPhase::Validating.to_string(),
                });
            }

            let Some(source) = item.source_for(source_format) else {
                outcome.errors.push(EnhancedSyncError::missing_source(
                    &item.name,
                    format!("No {} source listed for {}", source_format, item.name),
                    None,
                ));
                continue;
            };
            if !source.is_file() {
                outcome.errors.push(EnhancedSyncError::missing_source(
                    &item.name,
                    format!("Source file not found: {}", source),
                    Some(source),
                ));
                continue;
            }

            let entity = match self.collaborators.parser.parse(source, source_format) {
                Ok(entity) => entity,
                Err(e) => {
                    outcome
                        .errors
                        .push(EnhancedSyncError::parse_failure(&item.name, source, &e));
                    continue;
                }
            };

            let report = self.collaborators.validator.validate(&entity);
            for warning in &report.warnings {
                tracing::debug!(agent = %item.name, "{}", warning.message);
                outcome.warnings.push((item.name.clone(), warning.message.clone()));
            }
            if !report.is_valid() {
                outcome
                    .errors
                    .push(EnhancedSyncError::invalid(&item.name, source, report.error_summary()));
                continue;
            }

            outcome.valid.push(ValidatedItem {
                item: item.clone(),
                source: source.clone(),
                entity,
            });
        }

        tracing::info!(
            valid = outcome.valid.len(),
            failed = outcome.errors.len(),
            "Validated manifest"
        );
        Ok(outcome)
    }

    fn stage_and_commit(
        &mut self,
        area: &mut StagingArea,
        valid: &[ValidatedItem],
        options: &SyncOptions,
        skipped: &mut Vec<SkippedItem>,
    ) -> Result<Vec<SyncedFile>> {
        for validated in valid {
            self.stage_item(area, validated, options)?;
        }
        self.stage_commands(area, options, skipped)?;
        tracing::info!(staged = area.len(), "Staged files");

        self.set_phase(SyncPhase::Committing);
        area.commit(&options.cancellation)
    }

    fn stage_item(
        &self,
        area: &mut StagingArea,
        validated: &ValidatedItem,
        options: &SyncOptions,
    ) -> Result<()> {
        let name = &validated.item.name;

        for target in self.resolver.target_paths(name, options.target) {
            check_cancelled(&options.cancellation, SyncPhase::Staging)?;

            let target_format = PathResolver::detect_target_format(&target);
            let content = if target_format == options.source_format {
                io::read_bytes(&validated.source)?
            } else {
                let converted = self
                    .collaborators
                    .converter
                    .convert(&validated.entity, target_format)
                    .map_err(|e| Error::Conversion {
                        agent: name.clone(),
                        message: e.to_string(),
                    })?;
                let text = self
                    .collaborators
                    .serializer
                    .serialize(&converted)
                    .map_err(|e| Error::Serialization {
                        agent: name.clone(),
                        message: match e {
                            codeflow_meta::Error::Serialization { message } => message,
                            other => other.to_string(),
                        },
                    })?;
                text.into_bytes()
            };

            area.stage(name, &validated.source, &target, &content)?;
        }
        Ok(())
    }

    /// Stage workflow command files verbatim. A file that cannot be staged
    /// is reported as skipped rather than failing the run.
    fn stage_commands(
        &self,
        area: &mut StagingArea,
        options: &SyncOptions,
        skipped: &mut Vec<SkippedItem>,
    ) -> Result<()> {
        let dir = self.command_dir();
        if !dir.is_dir() {
            return Ok(());
        }

        for command in list_markdown_files(&dir) {
            let Some(file_name) = command.file_name().map(str::to_string) else {
                continue;
            };
            let stem = command.file_stem().unwrap_or(file_name.as_str()).to_string();

            let content = match io::read_bytes(&command) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(
                        command = %command,
                        error = %e,
                        "Skipping unreadable command file"
                    );
                    skipped.push(SkippedItem {
                        agent: stem,
                        target: options.target.to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            for target in self.resolver.command_paths(&file_name, options.target) {
                check_cancelled(&options.cancellation, SyncPhase::Staging)?;
                if let Err(e) = area.stage(&stem, &command, &target, &content) {
                    tracing::warn!(path = %target, error = %e, "Failed to stage command file");
                    skipped.push(SkippedItem {
                        agent: stem.clone(),
                        target: target.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn check_cancelled(cancellation: &CancellationToken, phase: SyncPhase) -> Result<()> {
    if cancellation.is_cancelled() {
        return Err(Error::Cancelled {
            phase: phase.to_string(),
        });
    }
    Ok(())
}

/// `*.md` files directly inside `dir`, sorted by name.
fn list_markdown_files(dir: &NormalizedPath) -> Vec<NormalizedPath> {
    let entries = match fs::read_dir(dir.to_native()) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir, error = %e, "Cannot list command directory");
            return Vec::new();
        }
    };

    let mut files: Vec<NormalizedPath> = entries
        .flatten()
        .map(|entry| NormalizedPath::new(entry.path()))
        .filter(|path| path.is_file() && path.extension() == Some("md"))
        .collect();
    files.sort();
    files
}
