//! Loading and resolving modpack manifests.

use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};

use super::types::{ContentItem, Manifest, PackManifest, PackMetadata};
use crate::error::DeployError;
use crate::fetch::ContentResolver;

/// Read and parse a `manifest.json` from disk.
pub fn load_pack_manifest(path: &Path) -> anyhow::Result<PackManifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
    parse_pack_manifest(&content)
        .with_context(|| format!("Failed to parse manifest: {}", path.display()))
}

/// Parse manifest JSON content.
pub fn parse_pack_manifest(content: &str) -> anyhow::Result<PackManifest> {
    let manifest: PackManifest = serde_json::from_str(content)?;
    if manifest.name.trim().is_empty() {
        anyhow::bail!("Manifest has an empty name");
    }
    Ok(manifest)
}

/// Expand every file reference into a full [`ContentItem`], in manifest order.
pub fn resolve_manifest(
    pack: &PackManifest,
    resolver: &dyn ContentResolver,
) -> Result<Manifest, DeployError> {
    let total = pack.files.len();
    info!(total, pack = %pack.name, "Resolving modpack files");

    let mut items: Vec<ContentItem> = Vec::with_capacity(total);
    for (index, file) in pack.files.iter().enumerate() {
        let item = resolver
            .resolve(file)
            .map_err(|source| DeployError::Resolve {
                mod_id: file.project_id,
                file_id: file.file_id,
                source,
            })?;
        debug!(
            mod_id = item.mod_id,
            file_id = item.file_id,
            file = %item.file_name,
            "Resolved ({}/{})",
            index + 1,
            total
        );
        items.push(item);
    }

    Ok(Manifest::new(PackMetadata::from(pack), items))
}
