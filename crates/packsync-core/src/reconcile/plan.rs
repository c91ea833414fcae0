//! Diff between the installed state and a manifest.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::manifest::{ContentItem, Manifest, ModId};
use crate::state::InstalledState;

/// When to remove installed mods that the manifest no longer lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemovalPolicy {
    /// Remove exactly `installed - manifest`.
    #[default]
    Exact,
    /// Remove only when more mods are installed than the manifest lists.
    /// Misses swaps that keep the count equal.
    CountHeuristic,
}

impl RemovalPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            RemovalPolicy::Exact => "exact",
            RemovalPolicy::CountHeuristic => "count-heuristic",
        }
    }
}

/// Work needed to bring the content directory in line with a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Installed items whose mod is gone from the manifest.
    pub removals: Vec<ContentItem>,
    /// Installed items superseded by a different file revision.
    /// These are the *old* items; their files get deleted.
    pub replacements: Vec<ContentItem>,
    /// Manifest items to download, in manifest order.
    pub additions: Vec<ContentItem>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.replacements.is_empty() && self.additions.is_empty()
    }
}

/// Compute the plan assuming every recorded file is intact on disk.
pub fn plan(
    manifest: &Manifest,
    prior: Option<&InstalledState>,
    policy: RemovalPolicy,
) -> ReconcilePlan {
    plan_with(manifest, prior, policy, |_| true)
}

/// Compute the plan, re-adding unchanged items for which `is_intact`
/// returns false.
pub fn plan_with(
    manifest: &Manifest,
    prior: Option<&InstalledState>,
    policy: RemovalPolicy,
    is_intact: impl Fn(&ContentItem) -> bool,
) -> ReconcilePlan {
    let Some(prior) = prior else {
        return ReconcilePlan {
            additions: manifest.items.clone(),
            ..ReconcilePlan::default()
        };
    };

    let mut result = ReconcilePlan::default();
    for item in &manifest.items {
        match prior.get(item.mod_id) {
            None => result.additions.push(item.clone()),
            Some(installed) if installed.file_id != item.file_id => {
                result.replacements.push(installed.clone());
                result.additions.push(item.clone());
            }
            Some(installed) => {
                if !is_intact(installed) {
                    result.additions.push(item.clone());
                }
            }
        }
    }

    let remove = match policy {
        RemovalPolicy::Exact => true,
        RemovalPolicy::CountHeuristic => prior.len() > manifest.len(),
    };
    if remove {
        let declared: HashSet<ModId> = manifest.items.iter().map(|i| i.mod_id).collect();
        result.removals = prior
            .mods
            .values()
            .filter(|installed| !declared.contains(&installed.mod_id))
            .cloned()
            .collect();
    }

    result
}
