//! Content download and resolution.
//!
//! - [`ContentFetcher`]: download one content item into a directory,
//!   verifying the received byte count.
//! - [`ContentResolver`]: expand a manifest file reference into a full
//!   [`ContentItem`](crate::manifest::ContentItem).

mod client;
mod curseforge;
mod http;

#[cfg(test)]
pub(crate) mod test_server;

use std::path::Path;

pub use client::{DEFAULT_TIMEOUT_SECS, HttpClient};
pub use curseforge::{CurseForgeResolver, DEFAULT_API_BASE};
pub use http::HttpFetcher;

use crate::error::FetchError;
use crate::manifest::{ContentItem, FileRef};

/// Downloads a single content item.
pub trait ContentFetcher {
    /// Write the item to `dest_dir/<file_name>`.
    ///
    /// Returns the number of bytes written. Fails with
    /// [`FetchError::SizeMismatch`] if that differs from `file_length`.
    /// A partially written file may remain on failure.
    fn fetch(&self, item: &ContentItem, dest_dir: &Path) -> Result<u64, FetchError>;
}

/// Resolves manifest file references against the content source.
pub trait ContentResolver {
    fn resolve(&self, file: &FileRef) -> Result<ContentItem, FetchError>;
}

/// True if `name` is a single path component with no traversal.
pub fn is_plain_file_name(name: &str) -> bool {
    let path = Path::new(name);
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && path.file_name().is_some_and(|n| n == name)
}

pub(crate) fn transport_error(url: &str, err: &reqwest::Error) -> FetchError {
    FetchError::Transport {
        url: url.to_string(),
        reason: describe(err),
    }
}

pub(crate) fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("timed out ({err})")
    } else {
        err.to_string()
    }
}
