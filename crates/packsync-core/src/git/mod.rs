//! Source repository refresh.
//!
//! The modpack repository checkout is brought up to date before every
//! deployment. Only fast-forwards are applied.

mod source;

pub use source::{DEFAULT_REMOTE, GitSourceControl};

use crate::error::ToolError;

/// Result of a successful refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    UpToDate,
    Updated { commit: String },
}

/// Brings a local checkout up to date with its upstream branch.
pub trait SourceControl {
    fn refresh(&self, branch: &str) -> Result<RefreshOutcome, ToolError>;
}
