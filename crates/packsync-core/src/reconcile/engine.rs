//! Apply a reconcile plan to the content directory.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{error, info, warn};

use super::plan::{ReconcilePlan, RemovalPolicy, plan_with};
use crate::error::ReconcileError;
use crate::fetch::{ContentFetcher, is_plain_file_name};
use crate::manifest::{ContentItem, Manifest};
use crate::state::{InstalledState, StateStore};

/// Outcome of a successful reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcileReport {
    pub plan: ReconcilePlan,
    /// State as persisted at the end of the pass.
    pub state: InstalledState,
    pub bytes_downloaded: u64,
}

/// Brings the content directory into agreement with a manifest.
pub struct Reconciler<'a> {
    fetcher: &'a dyn ContentFetcher,
    store: &'a StateStore,
    install_dir: PathBuf,
    policy: RemovalPolicy,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        fetcher: &'a dyn ContentFetcher,
        store: &'a StateStore,
        install_dir: PathBuf,
        policy: RemovalPolicy,
    ) -> Self {
        Self {
            fetcher,
            store,
            install_dir,
            policy,
        }
    }

    /// Run one pass.
    ///
    /// Deletions run first, then downloads one at a time in manifest order.
    /// The state record is written only after every download succeeded;
    /// on failure the durable record is untouched and the next run retries.
    pub fn reconcile(
        &self,
        manifest: &Manifest,
        prior: Option<InstalledState>,
    ) -> Result<ReconcileReport, ReconcileError> {
        manifest.validate()?;

        if !self.install_dir.is_dir() {
            fs::create_dir_all(&self.install_dir).map_err(|source| ReconcileError::CreateDir {
                path: self.install_dir.clone(),
                source,
            })?;
        }

        if prior.is_none() {
            info!("No installed state recorded, treating as first install");
        }
        let plan = plan_with(manifest, prior.as_ref(), self.policy, |item| {
            self.is_intact(item)
        });
        info!(
            additions = plan.additions.len(),
            replacements = plan.replacements.len(),
            removals = plan.removals.len(),
            policy = self.policy.as_str(),
            "Planned content changes"
        );

        let mut state = prior.unwrap_or_default();

        for old in &plan.replacements {
            self.delete(old)?;
            state.remove(old.mod_id);
            info!(mod_id = old.mod_id, file = %old.file_name, "Deleted superseded file");
        }

        for old in &plan.removals {
            self.delete(old)?;
            state.remove(old.mod_id);
            info!(mod_id = old.mod_id, name = %old.display_name, "Removed mod");
        }

        let total = plan.additions.len();
        if total > 0 {
            info!("Beginning download of {} mods", total);
        }
        let mut bytes_downloaded = 0;
        for (index, item) in plan.additions.iter().enumerate() {
            let dest = self.install_dir.join(&item.file_name);
            info!("Downloading ({}/{}) \"{}\"", index + 1, total, dest.display());

            match self.fetcher.fetch(item, &self.install_dir) {
                Ok(bytes) => {
                    bytes_downloaded += bytes;
                    state.record(item.clone());
                }
                Err(source) => {
                    error!(
                        mod_id = item.mod_id,
                        file_id = item.file_id,
                        url = %item.download_url,
                        error = %source,
                        "Download failed"
                    );
                    if source.leaves_partial() {
                        self.discard_partial(item);
                    }
                    return Err(ReconcileError::Fetch {
                        mod_id: item.mod_id,
                        name: item.display_name.clone(),
                        source,
                        installed: Box::new(state),
                    });
                }
            }
        }
        if total > 0 {
            info!("Finished download of {} mods", total);
        }

        self.store.save(&state)?;

        Ok(ReconcileReport {
            plan,
            state,
            bytes_downloaded,
        })
    }

    /// Delete an installed item's file. A missing file counts as deleted.
    fn delete(&self, item: &ContentItem) -> Result<(), ReconcileError> {
        let path = self.install_dir.join(&item.file_name);
        if !is_plain_file_name(&item.file_name) {
            return Err(ReconcileError::Remove {
                mod_id: item.mod_id,
                path,
                source: std::io::Error::new(
                    ErrorKind::InvalidInput,
                    "recorded file name escapes the content directory",
                ),
            });
        }

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!(mod_id = item.mod_id, path = %path.display(), "File already absent");
                Ok(())
            }
            Err(source) => Err(ReconcileError::Remove {
                mod_id: item.mod_id,
                path,
                source,
            }),
        }
    }

    fn discard_partial(&self, item: &ContentItem) {
        if !is_plain_file_name(&item.file_name) {
            return;
        }
        let path = self.install_dir.join(&item.file_name);
        match fs::remove_file(&path) {
            Ok(()) => warn!(path = %path.display(), "Discarded partial download"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!(path = %path.display(), error = %err, "Failed to discard partial download"),
        }
    }

    fn is_intact(&self, item: &ContentItem) -> bool {
        if !is_plain_file_name(&item.file_name) {
            return false;
        }
        let path = self.install_dir.join(&item.file_name);
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() && meta.len() == item.file_length => true,
            Ok(meta) => {
                warn!(
                    mod_id = item.mod_id,
                    path = %path.display(),
                    expected = item.file_length,
                    actual = meta.len(),
                    "Installed file damaged, scheduling re-download"
                );
                false
            }
            Err(_) => {
                warn!(mod_id = item.mod_id, path = %path.display(), "Installed file missing, scheduling re-download");
                false
            }
        }
    }
}
