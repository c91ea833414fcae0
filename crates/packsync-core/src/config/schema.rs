//! Configuration schema for the deployment TOML file.
//!
//! Only `[paths]` and `[docker]` are required; every other section falls
//! back to the defaults below.

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::fetch::{DEFAULT_API_BASE, DEFAULT_TIMEOUT_SECS, is_plain_file_name};
use crate::git::DEFAULT_REMOTE;
use crate::reconcile::RemovalPolicy;
use crate::service::{DEFAULT_ADMIN_COMMAND, DEFAULT_DOCKER_BINARY};

/// Directories under the server root that are always replaced from the source.
pub const MANAGED_FOLDERS: [&str; 3] = ["config", "defaultconfigs", "kubejs"];

/// Environment fallback for `[curseforge] api_key`.
pub const API_KEY_ENV: &str = "CURSEFORGE_API_KEY";

/// Root of the deployment configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    pub paths: PathsConfig,

    #[serde(default)]
    pub git: GitConfig,

    pub docker: DockerConfig,

    #[serde(default)]
    pub deploy: DeploySettings,

    #[serde(default)]
    pub minecraft: MinecraftConfig,

    #[serde(default)]
    pub curseforge: CurseForgeConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Local clone of the modpack repository.
    pub source_repository: PathBuf,

    /// Root directory of the game server.
    pub server_root: PathBuf,

    /// Manifest file, relative to `source_repository`.
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,

    /// Installed-state record, relative to `server_root`.
    #[serde(default = "default_state_file")]
    pub state_file: String,
}

fn default_manifest_file() -> String {
    "manifest.json".to_string()
}

fn default_state_file() -> String {
    "installed-manifest.json".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default = "default_remote")]
    pub remote: String,
    #[serde(default = "default_branch")]
    pub branch: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            branch: default_branch(),
        }
    }
}

fn default_remote() -> String {
    DEFAULT_REMOTE.to_string()
}

fn default_branch() -> String {
    "master".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockerConfig {
    pub container_name: String,

    #[serde(default = "default_docker_binary")]
    pub binary: String,

    /// Console client inside the container, e.g. `rcon-cli`.
    #[serde(default = "default_admin_command")]
    pub admin_command: String,
}

fn default_docker_binary() -> String {
    DEFAULT_DOCKER_BINARY.to_string()
}

fn default_admin_command() -> String {
    DEFAULT_ADMIN_COMMAND.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploySettings {
    /// Length of the in-game shutdown countdown.
    #[serde(default = "default_shutdown_notice_secs")]
    pub shutdown_notice_secs: u64,

    #[serde(default)]
    pub removal_policy: RemovalPolicy,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            shutdown_notice_secs: default_shutdown_notice_secs(),
            removal_policy: RemovalPolicy::default(),
        }
    }
}

fn default_shutdown_notice_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinecraftConfig {
    /// Write the pack name and version into the server motd.
    #[serde(default = "default_true")]
    pub set_motd: bool,

    #[serde(default = "default_properties_file")]
    pub properties_file: String,

    /// Directory holding downloaded content, relative to `server_root`.
    #[serde(default = "default_content_folder")]
    pub content_folder: String,

    /// Managed in addition to [`MANAGED_FOLDERS`].
    #[serde(default)]
    pub extra_folders: Vec<String>,
}

impl Default for MinecraftConfig {
    fn default() -> Self {
        Self {
            set_motd: true,
            properties_file: default_properties_file(),
            content_folder: default_content_folder(),
            extra_folders: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_properties_file() -> String {
    "server.properties".to_string()
}

fn default_content_folder() -> String {
    "mods".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurseForgeConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for CurseForgeConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: None,
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Chat webhook; notifications are disabled when absent.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

impl DeployConfig {
    /// Directories replaced from the source on every deployment, in order.
    ///
    /// Never contains the content folder.
    pub fn managed_folders(&self) -> Vec<String> {
        let content_folder = self.minecraft.content_folder.trim();
        let mut folders: Vec<String> = Vec::new();
        let candidates = MANAGED_FOLDERS
            .iter()
            .map(|s| s.trim())
            .chain(self.minecraft.extra_folders.iter().map(|s| s.trim()));
        for folder in candidates {
            if folder.is_empty()
                || folder == content_folder
                || folders.iter().any(|f| f == folder)
            {
                continue;
            }
            folders.push(folder.to_string());
        }
        folders
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.paths.source_repository.join(&self.paths.manifest_file)
    }

    pub fn state_path(&self) -> PathBuf {
        self.paths.server_root.join(&self.paths.state_file)
    }

    pub fn content_dir(&self) -> PathBuf {
        self.paths.server_root.join(&self.minecraft.content_folder)
    }

    pub fn properties_path(&self) -> PathBuf {
        self.paths.server_root.join(&self.minecraft.properties_file)
    }

    pub fn shutdown_notice(&self) -> Duration {
        Duration::from_secs(self.deploy.shutdown_notice_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.network.timeout_secs)
    }

    /// API key from the file, falling back to `CURSEFORGE_API_KEY`.
    pub fn api_key(&self) -> Option<String> {
        self.curseforge
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                std::env::var(API_KEY_ENV)
                    .ok()
                    .filter(|key| !key.trim().is_empty())
            })
    }

    pub fn webhook_url(&self) -> anyhow::Result<Option<Url>> {
        self.notify
            .webhook_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .map(|url| Url::parse(url).with_context(|| format!("Invalid webhook URL: '{}'", url)))
            .transpose()
    }

    pub fn api_base(&self) -> anyhow::Result<Url> {
        Url::parse(&self.curseforge.api_base)
            .with_context(|| format!("Invalid CurseForge API base: '{}'", self.curseforge.api_base))
    }

    /// Check semantic constraints serde cannot express.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.paths.source_repository.as_os_str().is_empty() {
            bail!("paths.source_repository must not be empty");
        }
        if self.paths.server_root.as_os_str().is_empty() {
            bail!("paths.server_root must not be empty");
        }
        if self.docker.container_name.trim().is_empty() {
            bail!("docker.container_name must not be empty");
        }
        if self.docker.binary.trim().is_empty() {
            bail!("docker.binary must not be empty");
        }
        if self.git.remote.trim().is_empty() {
            bail!("git.remote must not be empty");
        }
        if self.git.branch.trim().is_empty() {
            bail!("git.branch must not be empty");
        }
        if self.network.timeout_secs == 0 {
            bail!("network.timeout_secs must be greater than zero");
        }

        ensure_relative_path(&self.paths.manifest_file)
            .context("Invalid paths.manifest_file")?;
        ensure_relative_path(&self.paths.state_file).context("Invalid paths.state_file")?;
        ensure_relative_path(&self.minecraft.properties_file)
            .context("Invalid minecraft.properties_file")?;
        ensure_folder_name(&self.minecraft.content_folder)
            .context("Invalid minecraft.content_folder")?;
        for folder in &self.minecraft.extra_folders {
            ensure_folder_name(folder)
                .with_context(|| format!("Invalid managed folder: '{}'", folder))?;
        }

        self.api_base()?;
        self.webhook_url()?;
        Ok(())
    }
}

/// A direct child of the server root: one normal component, no `.`,
/// separators or trailing slash, so aliases of the same folder cannot slip
/// past the content-folder and duplicate checks.
fn ensure_folder_name(value: &str) -> anyhow::Result<()> {
    ensure_relative_path(value)?;
    if !is_plain_file_name(value.trim()) {
        bail!("Folder must be a single plain name: '{}'", value);
    }
    Ok(())
}

fn ensure_relative_path(value: &str) -> anyhow::Result<()> {
    if value.trim().is_empty() {
        bail!("Path must not be empty");
    }
    let path = Path::new(value);
    if path.is_absolute() || path.has_root() {
        bail!("Absolute paths not allowed: '{}'", value);
    }
    for component in path.components() {
        if let Component::ParentDir = component {
            bail!("Path traversal not allowed: '{}'", value);
        }
    }
    Ok(())
}
