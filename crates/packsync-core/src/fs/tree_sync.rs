//! Directory tree mirroring and purging.
//!
//! `mirror` only ever adds or overwrites; stale destination files are
//! removed by a preceding `purge`. Symlinks to files are copied as the file
//! they point at; links to directories, dangling links and special files are
//! skipped with a warning.

use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::warn;

/// Counts of what a mirror pass touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorStats {
    pub dirs_created: usize,
    pub files_copied: usize,
    pub entries_skipped: usize,
}

/// Copy the tree under `source` onto `dest`.
///
/// Missing directories are created, existing files are overwritten,
/// files present only in `dest` are left alone.
pub fn mirror(source: &Path, dest: &Path) -> anyhow::Result<MirrorStats> {
    let meta = fs::metadata(source)
        .with_context(|| format!("Failed to stat source directory: {}", source.display()))?;
    if !meta.is_dir() {
        anyhow::bail!("Source path is not a directory: {}", source.display());
    }

    let mut stats = MirrorStats::default();
    ensure_dir(dest, &mut stats)?;
    mirror_dir(source, dest, &mut stats)?;
    Ok(stats)
}

fn mirror_dir(src: &Path, dst: &Path, stats: &mut MirrorStats) -> anyhow::Result<()> {
    for entry in
        fs::read_dir(src).with_context(|| format!("Failed to read dir: {}", src.display()))?
    {
        let entry =
            entry.with_context(|| format!("Failed to read dir entry: {}", src.display()))?;
        let ty = entry
            .file_type()
            .with_context(|| format!("Failed to stat dir entry: {}", entry.path().display()))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());

        if ty.is_dir() {
            ensure_dir(&to, stats)?;
            mirror_dir(&from, &to, stats)?;
        } else if ty.is_file() || (ty.is_symlink() && points_to_file(&from)) {
            fs::copy(&from, &to).with_context(|| {
                format!(
                    "Failed to copy file from {} to {}",
                    from.display(),
                    to.display()
                )
            })?;
            stats.files_copied += 1;
        } else {
            warn!(path = %from.display(), "Skipping entry that is not a regular file or directory");
            stats.entries_skipped += 1;
        }
    }
    Ok(())
}

fn points_to_file(link: &Path) -> bool {
    fs::metadata(link).is_ok_and(|meta| meta.is_file())
}

fn ensure_dir(path: &Path, stats: &mut MirrorStats) -> anyhow::Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    stats.dirs_created += 1;
    Ok(())
}

/// Delete `path` and everything below it.
///
/// Returns `false` if there was nothing to delete.
pub fn purge(path: &Path) -> anyhow::Result<bool> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to read metadata: {}", path.display()));
        }
    };

    if metadata.is_dir() {
        fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
    } else {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove file: {}", path.display()))?;
    }
    Ok(true)
}
