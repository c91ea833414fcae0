//! Installed-state record.
//!
//! Tracks which file revision of each mod is materialized in the content
//! directory. This is the only record that outlives a single deployment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::manifest::{ContentItem, FileId, ModId};

/// Installed mods keyed by mod id.
///
/// On disk: `{"mods": {"<modId>": {modId, displayName, ...}}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledState {
    #[serde(default)]
    pub mods: BTreeMap<ModId, ContentItem>,
}

impl InstalledState {
    /// Create a new empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a set of items, keyed by their identity.
    pub fn from_items(items: impl IntoIterator<Item = ContentItem>) -> Self {
        Self {
            mods: items.into_iter().map(|item| (item.mod_id, item)).collect(),
        }
    }

    /// Add or replace the entry for an item's identity
    pub fn record(&mut self, item: ContentItem) {
        self.mods.insert(item.mod_id, item);
    }

    pub fn get(&self, mod_id: ModId) -> Option<&ContentItem> {
        self.mods.get(&mod_id)
    }

    /// Remove an entry
    pub fn remove(&mut self, mod_id: ModId) -> Option<ContentItem> {
        self.mods.remove(&mod_id)
    }

    /// Installed file revision for a mod, if any.
    pub fn file_id(&self, mod_id: ModId) -> Option<FileId> {
        self.mods.get(&mod_id).map(|item| item.file_id)
    }

    pub fn contains(&self, mod_id: ModId) -> bool {
        self.mods.contains_key(&mod_id)
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }
}
