//! Installed-state persistence.
//!
//! The record is a single pretty-printed JSON file. Saves go through a
//! temporary sibling file and a rename so a crash never leaves a torn record.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::InstalledState;
use crate::error::StateError;

/// Reads and writes the installed-state file.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record.
    ///
    /// Returns `None` when no record exists yet (first install).
    pub fn load(&self) -> Result<Option<InstalledState>, StateError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&self.path).map_err(|source| StateError::Io {
            path: self.path.clone(),
            source,
        })?;
        let state = serde_json::from_slice(&bytes).map_err(|source| StateError::Parse {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(state))
    }

    /// Save the record atomically (tmp + rename).
    pub fn save(&self, state: &InstalledState) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }

        // Serialize first so a bad record never touches the disk
        let mut bytes = serde_json::to_vec_pretty(state).map_err(StateError::Serialize)?;
        bytes.push(b'\n');

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, bytes).map_err(io_err(&tmp_path))?;

        // Remove target first on Windows for replace semantics
        if cfg!(windows) && self.path.exists() {
            fs::remove_file(&self.path).map_err(io_err(&self.path))?;
        }
        fs::rename(&tmp_path, &self.path).map_err(io_err(&tmp_path))?;

        debug!(path = %self.path.display(), mods = state.len(), "Saved installed state");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StateError + use<> {
    let path = path.to_path_buf();
    move |source| StateError::Io { path, source }
}
