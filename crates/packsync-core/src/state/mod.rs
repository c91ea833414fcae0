//! Installed-state record and persistence.
//!
//! Represents what is currently materialized in the content directory.

pub mod lock;
pub mod store;
pub mod types;

pub use lock::StateLock;
pub use store::StateStore;
pub use types::InstalledState;
