//! Packsync Core Library
//!
//! Deploys a modpack onto a running game server: refreshes the pack
//! source, drains and stops the server, syncs managed folders, reconciles
//! downloaded content against the manifest, and starts the server again.

pub mod config;
pub mod context;
pub mod deploy;
pub mod error;
pub mod fetch;
pub mod fs;
pub mod git;
pub mod manifest;
pub mod notify;
pub mod reconcile;
pub mod service;
pub mod state;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{DeployConfig, load_config, parse_config_str};

    // Pipeline
    pub use crate::context::DeployContext;
    pub use crate::deploy::{
        DeployReport, Pipeline, PipelineOptions, Sleeper, Stage, StageOutcome, ThreadSleeper,
    };

    // Errors
    pub use crate::error::{DeployError, FetchError, ReconcileError, StateError, ToolError};

    // Capabilities
    pub use crate::fetch::{ContentFetcher, ContentResolver};
    pub use crate::git::{RefreshOutcome, SourceControl};
    pub use crate::notify::Notifier;
    pub use crate::service::ServiceRuntime;

    // Model
    pub use crate::manifest::{ContentItem, FileRef, Manifest, PackManifest, PackMetadata};
    pub use crate::reconcile::{ReconcilePlan, Reconciler, RemovalPolicy};
    pub use crate::state::{InstalledState, StateStore};
}
