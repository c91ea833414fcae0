//! Deployment context for dependency injection.
//!
//! Bundles every external capability the pipeline talks to. The CLI builds
//! one from the configuration; tests assemble one from fakes.

use tracing::warn;

use crate::config::DeployConfig;
use crate::deploy::{Sleeper, ThreadSleeper};
use crate::fetch::{ContentFetcher, ContentResolver, CurseForgeResolver, HttpClient, HttpFetcher};
use crate::git::{GitSourceControl, SourceControl};
use crate::notify::{Notifier, WebhookNotifier};
use crate::service::{DockerRuntime, ServiceRuntime};

pub struct DeployContext {
    pub source: Box<dyn SourceControl>,
    pub runtime: Box<dyn ServiceRuntime>,
    pub resolver: Box<dyn ContentResolver>,
    pub fetcher: Box<dyn ContentFetcher>,
    /// `None` disables notifications.
    pub notifier: Option<Box<dyn Notifier>>,
    pub sleeper: Box<dyn Sleeper>,
}

impl std::fmt::Debug for DeployContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployContext")
            .field("notifier", &self.notifier.is_some())
            .finish_non_exhaustive()
    }
}

impl DeployContext {
    /// Context with notifications disabled and a real-time sleeper.
    pub fn new(
        source: Box<dyn SourceControl>,
        runtime: Box<dyn ServiceRuntime>,
        resolver: Box<dyn ContentResolver>,
        fetcher: Box<dyn ContentFetcher>,
    ) -> Self {
        Self {
            source,
            runtime,
            resolver,
            fetcher,
            notifier: None,
            sleeper: Box::new(ThreadSleeper),
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_sleeper(mut self, sleeper: Box<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Production wiring: git, docker, CurseForge and an optional webhook.
    pub fn from_config(config: &DeployConfig) -> anyhow::Result<Self> {
        let http = HttpClient::new(config.timeout())?;

        let api_key = config.api_key().unwrap_or_else(|| {
            warn!(
                "No CurseForge API key configured; set [curseforge] api_key or {}",
                crate::config::API_KEY_ENV
            );
            String::new()
        });

        let mut context = Self::new(
            Box::new(
                GitSourceControl::new(config.paths.source_repository.clone())
                    .with_remote(config.git.remote.clone()),
            ),
            Box::new(DockerRuntime::new(
                config.docker.binary.clone(),
                config.docker.admin_command.clone(),
            )),
            Box::new(CurseForgeResolver::new(
                http.clone(),
                config.api_base()?,
                api_key,
            )),
            Box::new(HttpFetcher::new(http.clone())),
        );

        if let Some(url) = config.webhook_url()? {
            context = context.with_notifier(Box::new(WebhookNotifier::new(http, url)));
        }

        Ok(context)
    }
}
