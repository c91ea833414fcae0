//! Deployment pipeline: drain, sync, reconcile, restart.

pub mod drain;
pub mod pipeline;
pub mod properties;
pub mod report;

pub use drain::{Sleeper, ThreadSleeper, drain};
pub use pipeline::{Pipeline, PipelineOptions};
pub use properties::{motd_for, update_motd};
pub use report::{ContentSummary, DeployReport, Stage, StageOutcome, StageRecord};
