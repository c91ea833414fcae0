//! Fast-forward the modpack source checkout from its remote.

use std::path::{Path, PathBuf};

use git2::{
    AutotagOption, Cred, CredentialType, FetchOptions, RemoteCallbacks, Repository,
    build::CheckoutBuilder,
};
use tracing::{debug, info};

use super::{RefreshOutcome, SourceControl};
use crate::error::ToolError;

pub const DEFAULT_REMOTE: &str = "origin";

/// Pulls a branch into a local clone using libgit2 (fast-forward only).
///
/// The checkout is owned by the deployer: local edits to tracked files
/// are overwritten.
#[derive(Debug, Clone)]
pub struct GitSourceControl {
    repo_path: PathBuf,
    remote: String,
}

impl GitSourceControl {
    pub fn new(repo_path: PathBuf) -> Self {
        Self {
            repo_path,
            remote: DEFAULT_REMOTE.to_string(),
        }
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    fn fetch_options<'cb>() -> FetchOptions<'cb> {
        let mut callbacks = RemoteCallbacks::new();
        let mut attempts = 0;
        callbacks.credentials(move |url, username, allowed| {
            // libgit2 retries the callback until it stops handing out credentials
            attempts += 1;
            if attempts > 3 {
                return Err(git2::Error::from_str("authentication failed"));
            }
            if allowed.contains(CredentialType::SSH_KEY) {
                return Cred::ssh_key_from_agent(username.unwrap_or("git"));
            }
            if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
                let config = git2::Config::open_default()?;
                return Cred::credential_helper(&config, url, username);
            }
            Cred::default()
        });

        let mut options = FetchOptions::new();
        options.remote_callbacks(callbacks);
        options.download_tags(AutotagOption::None);
        options
    }
}

impl SourceControl for GitSourceControl {
    fn refresh(&self, branch: &str) -> Result<RefreshOutcome, ToolError> {
        let repo = Repository::open(&self.repo_path)?;

        let mut remote = repo.find_remote(&self.remote)?;
        debug!(remote = %self.remote, branch, "Fetching source repository");
        remote.fetch(&[branch], Some(&mut Self::fetch_options()), None)?;

        let fetch_head = repo.find_reference("FETCH_HEAD")?;
        let incoming = repo.reference_to_annotated_commit(&fetch_head)?;
        let (analysis, _) = repo.merge_analysis(&[&incoming])?;

        if analysis.is_up_to_date() {
            return Ok(RefreshOutcome::UpToDate);
        }
        if !(analysis.is_fast_forward() || analysis.is_unborn()) {
            return Err(ToolError::NotFastForward {
                branch: branch.to_string(),
            });
        }

        let refname = format!("refs/heads/{branch}");
        let message = format!("packsync: fast-forward {branch}");
        match repo.find_reference(&refname) {
            Ok(mut reference) => {
                reference.set_target(incoming.id(), &message)?;
            }
            Err(_) => {
                repo.reference(&refname, incoming.id(), true, &message)?;
            }
        }
        repo.set_head(&refname)?;
        repo.checkout_head(Some(CheckoutBuilder::default().force()))?;

        let commit = incoming.id().to_string();
        info!(branch, commit = %commit, "Fast-forwarded source repository");
        Ok(RefreshOutcome::Updated { commit })
    }
}
