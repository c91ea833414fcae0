//! Modpack manifest types.
//!
//! [`PackManifest`] mirrors the exported modpack `manifest.json` and only
//! references files by id. [`Manifest`] is the resolved form the
//! reconciler works on, with every entry expanded into a [`ContentItem`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Stable identity of a mod across versions (the content source project id).
pub type ModId = u32;

/// Opaque file revision id assigned by the content source. Not ordered.
pub type FileId = u32;

/// Manifest as exported by the modpack authoring tool.
///
/// Unknown fields are ignored so newer exports keep parsing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackManifest {
    pub minecraft: MinecraftTarget,

    #[serde(rename = "manifestType", default)]
    pub manifest_type: String,

    #[serde(rename = "manifestVersion", default)]
    pub manifest_version: u32,

    pub name: String,

    pub version: String,

    #[serde(default)]
    pub author: String,

    #[serde(rename = "projectID", default)]
    pub project_id: u32,

    #[serde(default)]
    pub files: Vec<FileRef>,
}

/// Target platform descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MinecraftTarget {
    pub version: String,

    #[serde(rename = "modLoaders", default)]
    pub mod_loaders: Vec<ModLoader>,
}

impl MinecraftTarget {
    /// The loader flagged as primary, falling back to the first one listed.
    pub fn primary_loader(&self) -> Option<&ModLoader> {
        self.mod_loaders
            .iter()
            .find(|loader| loader.primary)
            .or_else(|| self.mod_loaders.first())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModLoader {
    pub id: String,

    #[serde(default)]
    pub primary: bool,
}

/// Reference to one file of one mod, as listed in `files[]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FileRef {
    #[serde(rename = "projectID")]
    pub project_id: ModId,

    #[serde(rename = "fileID")]
    pub file_id: FileId,

    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

/// A fully described content item.
///
/// Serialized with the field names used by the installed-state record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub mod_id: ModId,
    pub display_name: String,
    pub file_name: String,
    pub download_url: String,
    pub file_length: u64,
    pub file_id: FileId,
}

/// Bundle metadata carried alongside the resolved items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackMetadata {
    pub name: String,
    pub version: String,
    pub author: String,
    pub minecraft_version: String,
    pub loader: Option<String>,
}

/// Resolved manifest: the declared target set for one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub metadata: PackMetadata,
    pub items: Vec<ContentItem>,
}

impl Manifest {
    pub fn new(metadata: PackMetadata, items: Vec<ContentItem>) -> Self {
        Self { metadata, items }
    }

    /// Reject manifests that list the same mod twice.
    pub fn validate(&self) -> Result<(), crate::error::ReconcileError> {
        let mut seen = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if !seen.insert(item.mod_id) {
                return Err(crate::error::ReconcileError::DuplicateIdentity(item.mod_id));
            }
        }
        Ok(())
    }

    pub fn get(&self, mod_id: ModId) -> Option<&ContentItem> {
        self.items.iter().find(|item| item.mod_id == mod_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<&PackManifest> for PackMetadata {
    fn from(pack: &PackManifest) -> Self {
        Self {
            name: pack.name.clone(),
            version: pack.version.clone(),
            author: pack.author.clone(),
            minecraft_version: pack.minecraft.version.clone(),
            loader: pack.minecraft.primary_loader().map(|l| l.id.clone()),
        }
    }
}
