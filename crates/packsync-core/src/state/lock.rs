//! Exclusive lock over the installed-state record.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::StateError;

/// Held for the duration of a deployment; the lock file is removed on drop.
#[derive(Debug)]
pub struct StateLock {
    path: PathBuf,
}

impl StateLock {
    /// Take the lock for `state_path` by creating `<state_path>.lock`.
    ///
    /// A lock left by a process that is no longer running is removed and
    /// taken over. Fails with [`StateError::Locked`] if another run holds it.
    pub fn acquire(state_path: &Path) -> Result<Self, StateError> {
        let path = lock_path(state_path);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| StateError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut file = match create_lock_file(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                if !reclaim_stale(&path) {
                    return Err(StateError::Locked { path });
                }
                match create_lock_file(&path) {
                    Ok(file) => file,
                    Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                        return Err(StateError::Locked { path });
                    }
                    Err(source) => return Err(StateError::Io { path, source }),
                }
            }
            Err(source) => return Err(StateError::Io { path, source }),
        };
        if let Err(err) = writeln!(file, "{}", std::process::id()) {
            warn!(path = %path.display(), error = %err, "Failed to record lock owner");
        }

        debug!(path = %path.display(), "Acquired state lock");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %err, "Failed to release state lock");
        }
    }
}

fn create_lock_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}

/// Remove the lock at `path` if its recorded owner is no longer running.
///
/// A lock without a readable pid, or owned by this process, is left alone.
fn reclaim_stale(path: &Path) -> bool {
    let Some(pid) = read_owner(path) else {
        return false;
    };
    if pid == std::process::id() || is_process_alive(pid) {
        return false;
    }

    match fs::remove_file(path) {
        Ok(()) => {
            warn!(path = %path.display(), pid, "Removed stale state lock");
            true
        }
        Err(err) if err.kind() == ErrorKind::NotFound => true,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Failed to remove stale state lock");
            false
        }
    }
}

fn read_owner(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Conservative liveness check: unknown platforms report every pid as alive.
fn is_process_alive(pid: u32) -> bool {
    #[cfg(target_os = "linux")]
    {
        Path::new(&format!("/proc/{}", pid)).exists()
    }
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("ps")
            .args(["-p", &pid.to_string()])
            .output()
            .map(|o| o.status.success())
            .unwrap_or(true)
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        let _ = pid;
        true
    }
}

fn lock_path(state_path: &Path) -> PathBuf {
    let mut name = state_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    state_path.with_file_name(name)
}
