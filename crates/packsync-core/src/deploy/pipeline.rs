//! End-to-end deployment sequence.
//!
//! Stages run strictly in order. Only a missing or unusable manifest, a
//! held or unreadable state record, and a content reconciliation failure
//! end the run with an error; every other failure is logged, recorded as
//! degraded, and the run continues.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use super::drain::drain;
use super::properties::update_motd;
use super::report::{ContentSummary, DeployReport, Stage, StageOutcome, StageRecord};
use crate::config::DeployConfig;
use crate::context::DeployContext;
use crate::error::DeployError;
use crate::fs::{mirror, purge};
use crate::git::RefreshOutcome;
use crate::manifest::{Manifest, load_pack_manifest, resolve_manifest};
use crate::reconcile::{Reconciler, RemovalPolicy};
use crate::state::{StateLock, StateStore};

/// Paths and knobs for one deployment, resolved from the configuration.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub branch: String,
    pub service_name: String,
    pub shutdown_notice: Duration,
    pub removal_policy: RemovalPolicy,
    pub source_root: PathBuf,
    pub server_root: PathBuf,
    pub manifest_path: PathBuf,
    pub state_path: PathBuf,
    pub content_dir: PathBuf,
    pub managed_folders: Vec<String>,
    /// `None` skips the metadata stage.
    pub properties_path: Option<PathBuf>,
}

impl PipelineOptions {
    pub fn from_config(config: &DeployConfig) -> Self {
        Self {
            branch: config.git.branch.clone(),
            service_name: config.docker.container_name.clone(),
            shutdown_notice: config.shutdown_notice(),
            removal_policy: config.deploy.removal_policy,
            source_root: config.paths.source_repository.clone(),
            server_root: config.paths.server_root.clone(),
            manifest_path: config.manifest_path(),
            state_path: config.state_path(),
            content_dir: config.content_dir(),
            managed_folders: config.managed_folders(),
            properties_path: config
                .minecraft
                .set_motd
                .then(|| config.properties_path()),
        }
    }
}

pub struct Pipeline<'a> {
    context: &'a DeployContext,
    options: PipelineOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(context: &'a DeployContext, options: PipelineOptions) -> Self {
        Self { context, options }
    }

    /// Run every stage once.
    pub fn run(&self) -> Result<DeployReport, DeployError> {
        let started_at = Utc::now();
        let mut stages = Vec::new();
        info!("Beginning modpack update");

        let _lock = StateLock::acquire(&self.options.state_path)?;

        stages.push(record(Stage::FetchSource, self.fetch_source()));

        let (manifest, store, prior) = self.validate_preconditions()?;
        stages.push(record(Stage::ValidatePreconditions, StageOutcome::Ok));
        let name = manifest.metadata.name.clone();
        let version = manifest.metadata.version.clone();

        stages.push(record(
            Stage::NotifyStart,
            self.notify(&format!("Deploying modpack {} {}", name, version)),
        ));

        stages.push(record(Stage::DrainService, self.drain_service()));

        self.sync_managed(&mut stages);

        let reconciler = Reconciler::new(
            self.context.fetcher.as_ref(),
            &store,
            self.options.content_dir.clone(),
            self.options.removal_policy,
        );
        let content = match reconciler.reconcile(&manifest, prior) {
            Ok(report) => {
                let summary = ContentSummary::from(&report);
                info!(
                    added = summary.added,
                    replaced = summary.replaced,
                    removed = summary.removed,
                    bytes = summary.bytes_downloaded,
                    "Content reconciled"
                );
                summary
            }
            Err(err) => {
                // `{:#}` rendering without giving up ownership of `err`
                let reason = anyhow::Chain::new(&err)
                    .map(|cause| cause.to_string())
                    .collect::<Vec<_>>()
                    .join(": ");
                error!(
                    error = %reason,
                    service = %self.options.service_name,
                    "Content reconciliation failed, service left stopped"
                );
                // Best effort; the content error is what gets reported.
                self.notify(&format!(
                    "Modpack {} {} deployment failed: {}",
                    name, version, reason
                ));
                return Err(DeployError::Content(err));
            }
        };
        stages.push(record(Stage::ReconcileContent, StageOutcome::Ok));

        stages.push(record(
            Stage::UpdateServiceMetadata,
            self.update_metadata(&manifest),
        ));

        stages.push(record(Stage::StartService, self.start_service()));

        stages.push(record(
            Stage::NotifyComplete,
            self.notify(&format!("Modpack {} {} deployed", name, version)),
        ));

        let report = DeployReport {
            pack_name: name,
            pack_version: version,
            stages,
            content,
            started_at,
            finished_at: Utc::now(),
        };
        info!("Finished modpack update");
        Ok(report)
    }

    fn fetch_source(&self) -> StageOutcome {
        match self.context.source.refresh(&self.options.branch) {
            Ok(RefreshOutcome::UpToDate) => {
                info!(branch = %self.options.branch, "Source repository already up to date");
                StageOutcome::Ok
            }
            Ok(RefreshOutcome::Updated { commit }) => {
                info!(branch = %self.options.branch, commit = %commit, "Updated the source repository");
                StageOutcome::Ok
            }
            Err(err) => {
                let reason = format!("{:#}", anyhow::Error::new(err));
                error!(
                    branch = %self.options.branch,
                    error = %reason,
                    "Failed to update the source repository, deploying the manifest already on disk"
                );
                StageOutcome::Degraded(reason)
            }
        }
    }

    /// Everything that can fail before the service is touched.
    fn validate_preconditions(
        &self,
    ) -> Result<(Manifest, StateStore, Option<crate::state::InstalledState>), DeployError> {
        let manifest_path = &self.options.manifest_path;
        if !manifest_path.is_file() {
            error!(path = %manifest_path.display(), "Manifest not found");
            return Err(DeployError::MissingManifest {
                path: manifest_path.clone(),
            });
        }

        let pack = load_pack_manifest(manifest_path).map_err(|err| {
            let reason = format!("{:#}", err);
            error!(path = %manifest_path.display(), error = %reason, "Failed to load manifest");
            DeployError::Manifest {
                path: manifest_path.clone(),
                reason,
            }
        })?;
        info!(pack = %pack.name, version = %pack.version, files = pack.files.len(), "Loaded manifest");

        let store = StateStore::new(self.options.state_path.clone());
        let prior = store.load()?;
        if prior.is_none() {
            warn!(
                path = %store.path().display(),
                "Installed state not found, every mod will be downloaded"
            );
        }

        let manifest = resolve_manifest(&pack, self.context.resolver.as_ref())?;
        manifest.validate()?;

        Ok((manifest, store, prior))
    }

    fn drain_service(&self) -> StageOutcome {
        match drain(
            self.context.runtime.as_ref(),
            &self.options.service_name,
            self.options.shutdown_notice,
            self.context.sleeper.as_ref(),
        ) {
            Ok(()) => StageOutcome::Ok,
            Err(err) => {
                let reason = format!("{:#}", anyhow::Error::new(err));
                error!(
                    service = %self.options.service_name,
                    error = %reason,
                    "Failed to stop service"
                );
                StageOutcome::Degraded(reason)
            }
        }
    }

    /// Purge then mirror every managed folder. Failures stay local to their folder.
    fn sync_managed(&self, stages: &mut Vec<StageRecord>) {
        for folder in &self.options.managed_folders {
            let dest = self.options.server_root.join(folder);
            let outcome = match purge(&dest) {
                Ok(true) => {
                    info!("Deleted \"{}\"", dest.display());
                    StageOutcome::Ok
                }
                Ok(false) => {
                    debug!(path = %dest.display(), "Nothing to delete");
                    StageOutcome::Ok
                }
                Err(err) => {
                    let reason = format!("{:#}", err);
                    error!(path = %dest.display(), error = %reason, "Failed to delete managed folder");
                    StageOutcome::Degraded(reason)
                }
            };
            stages.push(folder_record(Stage::PurgeManaged, folder, outcome));
        }

        for folder in &self.options.managed_folders {
            let source = self.options.source_root.join(folder);
            let dest = self.options.server_root.join(folder);
            let outcome = if !source.is_dir() {
                warn!(path = %source.display(), "Managed folder absent from source, skipping");
                StageOutcome::Skipped
            } else {
                match mirror(&source, &dest) {
                    Ok(stats) => {
                        info!(
                            files = stats.files_copied,
                            skipped = stats.entries_skipped,
                            "Copied \"{}\" to \"{}\"",
                            source.display(),
                            dest.display()
                        );
                        StageOutcome::Ok
                    }
                    Err(err) => {
                        let reason = format!("{:#}", err);
                        error!(source = %source.display(), error = %reason, "Failed to copy managed folder");
                        StageOutcome::Degraded(reason)
                    }
                }
            };
            stages.push(folder_record(Stage::CopyManaged, folder, outcome));
        }
    }

    fn update_metadata(&self, manifest: &Manifest) -> StageOutcome {
        let Some(path) = &self.options.properties_path else {
            debug!("Motd update disabled");
            return StageOutcome::Skipped;
        };
        match update_motd(path, &manifest.metadata) {
            Ok(_) => StageOutcome::Ok,
            Err(err) => {
                let reason = format!("{:#}", err);
                error!(path = %path.display(), error = %reason, "Failed to update server properties");
                StageOutcome::Degraded(reason)
            }
        }
    }

    fn start_service(&self) -> StageOutcome {
        info!(service = %self.options.service_name, "Starting service");
        match self.context.runtime.start(&self.options.service_name) {
            Ok(()) => StageOutcome::Ok,
            Err(err) => {
                let reason = format!("{:#}", anyhow::Error::new(err));
                error!(
                    service = %self.options.service_name,
                    error = %reason,
                    "Failed to start service"
                );
                StageOutcome::Degraded(reason)
            }
        }
    }

    fn notify(&self, message: &str) -> StageOutcome {
        let Some(notifier) = &self.context.notifier else {
            return StageOutcome::Skipped;
        };
        match notifier.post(message) {
            Ok(()) => StageOutcome::Ok,
            Err(err) => {
                let reason = format!("{:#}", anyhow::Error::new(err));
                warn!(message, error = %reason, "Failed to send notification");
                StageOutcome::Degraded(reason)
            }
        }
    }
}

fn record(stage: Stage, outcome: StageOutcome) -> StageRecord {
    StageRecord {
        stage,
        target: None,
        outcome,
    }
}

fn folder_record(stage: Stage, folder: &str, outcome: StageOutcome) -> StageRecord {
    StageRecord {
        stage,
        target: Some(folder.to_string()),
        outcome,
    }
}
