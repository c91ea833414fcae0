//! Fakes for the deployment capabilities.
//!
//! Every fake appends to a shared [`EventLog`] so tests can assert on the
//! order in which the pipeline touched the outside world.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use packsync_core::deploy::Sleeper;
use packsync_core::error::{FetchError, ToolError};
use packsync_core::fetch::{ContentFetcher, ContentResolver};
use packsync_core::git::{RefreshOutcome, SourceControl};
use packsync_core::manifest::{ContentItem, FileId, FileRef, Manifest, ModId, PackMetadata};
use packsync_core::notify::Notifier;
use packsync_core::service::ServiceRuntime;

pub type EventLog = Rc<RefCell<Vec<String>>>;

pub fn event_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.borrow().clone()
}

pub fn item(mod_id: ModId, file_id: FileId, file_name: &str, file_length: u64) -> ContentItem {
    ContentItem {
        mod_id,
        display_name: format!("Mod {mod_id}"),
        file_name: file_name.to_string(),
        download_url: format!("https://cdn.example.invalid/{file_id}/{file_name}"),
        file_length,
        file_id,
    }
}

pub fn metadata() -> PackMetadata {
    PackMetadata {
        name: "Friends Pack".to_string(),
        version: "1.0.0".to_string(),
        author: "ops".to_string(),
        minecraft_version: "1.20.1".to_string(),
        loader: Some("forge-47.2.0".to_string()),
    }
}

pub fn manifest(items: Vec<ContentItem>) -> Manifest {
    Manifest::new(metadata(), items)
}

/// Writes `file_length` bytes for each item, or fails as configured.
#[derive(Default)]
pub struct FakeFetcher {
    /// Deliver one byte less than declared.
    pub truncate: HashSet<ModId>,
    /// Fail before writing anything.
    pub unreachable: HashSet<ModId>,
    pub fetched: RefCell<Vec<(ModId, FileId)>>,
}

impl FakeFetcher {
    pub fn fetched(&self) -> Vec<(ModId, FileId)> {
        self.fetched.borrow().clone()
    }
}

impl ContentFetcher for FakeFetcher {
    fn fetch(&self, item: &ContentItem, dest_dir: &Path) -> Result<u64, FetchError> {
        self.fetched.borrow_mut().push((item.mod_id, item.file_id));

        if self.unreachable.contains(&item.mod_id) {
            return Err(FetchError::Transport {
                url: item.download_url.clone(),
                reason: "connection refused".to_string(),
            });
        }

        let length = if self.truncate.contains(&item.mod_id) {
            item.file_length.saturating_sub(1)
        } else {
            item.file_length
        };
        let path = dest_dir.join(&item.file_name);
        fs::write(&path, vec![b'x'; length as usize]).map_err(|source| FetchError::Io {
            path: path.clone(),
            source,
        })?;

        if length != item.file_length {
            return Err(FetchError::SizeMismatch {
                path,
                expected: item.file_length,
                actual: length,
            });
        }
        Ok(length)
    }
}

/// Shares a [`FakeFetcher`] between the test and a boxed context.
#[derive(Clone, Default)]
pub struct SharedFetcher(pub Rc<FakeFetcher>);

impl ContentFetcher for SharedFetcher {
    fn fetch(&self, item: &ContentItem, dest_dir: &Path) -> Result<u64, FetchError> {
        self.0.fetch(item, dest_dir)
    }
}

/// Answers from a fixed table keyed by `(projectID, fileID)`.
#[derive(Default)]
pub struct FakeResolver {
    items: HashMap<(ModId, FileId), ContentItem>,
}

impl FakeResolver {
    pub fn new(items: impl IntoIterator<Item = ContentItem>) -> Self {
        Self {
            items: items
                .into_iter()
                .map(|item| ((item.mod_id, item.file_id), item))
                .collect(),
        }
    }
}

impl ContentResolver for FakeResolver {
    fn resolve(&self, file: &FileRef) -> Result<ContentItem, FetchError> {
        self.items
            .get(&(file.project_id, file.file_id))
            .cloned()
            .ok_or_else(|| FetchError::HttpStatus {
                url: format!("https://api.example.invalid/v1/mods/{}/files/{}", file.project_id, file.file_id),
                status: 404,
            })
    }
}

fn tool_failure(command: &str) -> ToolError {
    ToolError::Failed {
        command: command.to_string(),
        status: "exit status: 1".to_string(),
        stderr: "simulated failure".to_string(),
    }
}

pub struct FakeSource {
    pub log: EventLog,
    pub fail: bool,
}

impl SourceControl for FakeSource {
    fn refresh(&self, branch: &str) -> Result<RefreshOutcome, ToolError> {
        self.log.borrow_mut().push(format!("refresh {branch}"));
        if self.fail {
            return Err(tool_failure("git fetch"));
        }
        Ok(RefreshOutcome::UpToDate)
    }
}

pub struct FakeRuntime {
    pub log: EventLog,
    pub fail_start: bool,
}

impl ServiceRuntime for FakeRuntime {
    fn stop(&self, name: &str) -> Result<(), ToolError> {
        self.log.borrow_mut().push(format!("stop {name}"));
        Ok(())
    }

    fn start(&self, name: &str) -> Result<(), ToolError> {
        self.log.borrow_mut().push(format!("start {name}"));
        if self.fail_start {
            return Err(tool_failure("docker start"));
        }
        Ok(())
    }

    fn exec_admin_command(&self, _name: &str, command: &str) -> Result<(), ToolError> {
        self.log.borrow_mut().push(format!("exec {command}"));
        Ok(())
    }
}

pub struct FakeNotifier {
    pub log: EventLog,
    pub fail: bool,
}

impl Notifier for FakeNotifier {
    fn post(&self, message: &str) -> Result<(), ToolError> {
        self.log.borrow_mut().push(format!("notify {message}"));
        if self.fail {
            return Err(tool_failure("webhook"));
        }
        Ok(())
    }
}

/// Records each wait instead of blocking.
pub struct InstantSleeper {
    pub log: EventLog,
}

impl Sleeper for InstantSleeper {
    fn sleep(&self, duration: Duration) {
        self.log
            .borrow_mut()
            .push(format!("sleep {}", duration.as_secs()));
    }
}
