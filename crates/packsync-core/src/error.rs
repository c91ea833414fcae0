//! Error taxonomy for deployment runs.
//!
//! Only [`DeployError`] is fatal to a run. Everything else is either
//! absorbed by the pipeline (logged, stage marked degraded) or wrapped
//! into a `DeployError` when it happens inside the content stage.

use std::path::PathBuf;

use crate::manifest::ModId;

/// Failure while downloading or resolving a single content item.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection, TLS or timeout failure before any output was written.
    #[error("transport error for {url}: {reason}")]
    Transport { url: String, reason: String },

    /// The body stream failed after the output file was created.
    #[error("download of {url} interrupted: {reason}")]
    Interrupted {
        url: String,
        path: PathBuf,
        reason: String,
    },

    /// Non-success HTTP status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// The response body could not be decoded.
    #[error("invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    /// Transferred byte count differs from the declared length.
    #[error("size mismatch for {}: expected {expected} bytes, received {actual}", path.display())]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// Local write failure.
    #[error("failed to write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// True if the failure may have left a partially written file behind.
    pub fn leaves_partial(&self) -> bool {
        matches!(
            self,
            Self::Interrupted { .. } | Self::SizeMismatch { .. } | Self::Io { .. }
        )
    }
}

/// Failure of an external collaborator: git, the container runtime, the
/// admin console or the webhook.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("failed to launch `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("git operation failed")]
    Git(#[from] git2::Error),

    #[error("cannot fast-forward {branch}: local history diverged from origin")]
    NotFastForward { branch: String },

    #[error("webhook post failed")]
    Webhook(#[from] FetchError),
}

/// Installed-state persistence failure.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to access installed state at {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse installed state at {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize installed state")]
    Serialize(#[source] serde_json::Error),

    #[error("installed state {} is locked by another deployment", path.display())]
    Locked { path: PathBuf },
}

/// Failure inside a reconciliation pass.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("manifest lists mod {0} more than once")]
    DuplicateIdentity(ModId),

    #[error("failed to create content directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove {} (mod {mod_id})", path.display())]
    Remove {
        mod_id: ModId,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A download failed. `installed` is the working state at the point of
    /// failure; the durable record was left untouched.
    #[error("failed to install {name} (mod {mod_id})")]
    Fetch {
        mod_id: ModId,
        name: String,
        #[source]
        source: FetchError,
        installed: Box<crate::state::InstalledState>,
    },

    #[error(transparent)]
    Persist(#[from] StateError),
}

/// Fatal pipeline failure. The process exits nonzero on any of these.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("manifest not found at {}", path.display())]
    MissingManifest { path: PathBuf },

    #[error("failed to load manifest {}: {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },

    #[error("failed to resolve mod {mod_id} file {file_id}")]
    Resolve {
        mod_id: ModId,
        file_id: crate::manifest::FileId,
        #[source]
        source: FetchError,
    },

    #[error(transparent)]
    State(#[from] StateError),

    #[error("content reconciliation failed")]
    Content(#[from] ReconcileError),
}
