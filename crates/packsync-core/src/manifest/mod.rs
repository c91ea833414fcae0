//! Modpack manifest model and loading.

pub mod store;
pub mod types;

pub use store::{load_pack_manifest, parse_pack_manifest, resolve_manifest};
pub use types::{
    ContentItem, FileId, FileRef, Manifest, MinecraftTarget, ModId, ModLoader, PackManifest,
    PackMetadata,
};
