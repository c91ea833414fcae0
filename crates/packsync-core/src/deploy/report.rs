//! Per-run record of what each pipeline stage did.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::reconcile::ReconcileReport;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    FetchSource,
    ValidatePreconditions,
    NotifyStart,
    DrainService,
    PurgeManaged,
    CopyManaged,
    ReconcileContent,
    UpdateServiceMetadata,
    StartService,
    NotifyComplete,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FetchSource => "fetch-source",
            Self::ValidatePreconditions => "validate-preconditions",
            Self::NotifyStart => "notify-start",
            Self::DrainService => "drain-service",
            Self::PurgeManaged => "purge-managed",
            Self::CopyManaged => "copy-managed",
            Self::ReconcileContent => "reconcile-content",
            Self::UpdateServiceMetadata => "update-service-metadata",
            Self::StartService => "start-service",
            Self::NotifyComplete => "notify-complete",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Ok,
    /// The stage failed but the run continued.
    Degraded(String),
    Skipped,
}

impl StageOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }
}

impl fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("ok"),
            Self::Degraded(reason) => write!(f, "degraded: {}", reason),
            Self::Skipped => f.write_str("skipped"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRecord {
    pub stage: Stage,
    /// Managed folder name for the per-folder stages.
    pub target: Option<String>,
    pub outcome: StageOutcome,
}

/// Counts from the content stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentSummary {
    pub added: usize,
    pub replaced: usize,
    pub removed: usize,
    pub bytes_downloaded: u64,
    pub installed: usize,
}

impl From<&ReconcileReport> for ContentSummary {
    fn from(report: &ReconcileReport) -> Self {
        Self {
            added: report.plan.additions.len(),
            replaced: report.plan.replacements.len(),
            removed: report.plan.removals.len(),
            bytes_downloaded: report.bytes_downloaded,
            installed: report.state.len(),
        }
    }
}

/// Result of a completed deployment.
#[derive(Debug, Clone)]
pub struct DeployReport {
    pub pack_name: String,
    pub pack_version: String,
    pub stages: Vec<StageRecord>,
    pub content: ContentSummary,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl DeployReport {
    /// First recorded outcome for `stage`.
    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|record| record.stage == stage)
            .map(|record| &record.outcome)
    }

    pub fn degraded(&self) -> impl Iterator<Item = &StageRecord> {
        self.stages.iter().filter(|record| record.outcome.is_degraded())
    }

    pub fn is_clean(&self) -> bool {
        self.degraded().next().is_none()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
