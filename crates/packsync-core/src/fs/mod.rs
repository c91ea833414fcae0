//! Filesystem primitives shared across features.

pub mod tree_sync;

pub use tree_sync::{MirrorStats, mirror, purge};
