//! Directory traversal into a sorted file list.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{PackError, Result};

/// One file to be archived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute path of the file on disk
    pub source_path: PathBuf,
    /// Path relative to the scan root, `/`-separated on every platform
    pub archive_name: String,
    /// Size in bytes when the tree was scanned
    pub size: u64,
}

/// Files under one root, sorted by archive name.
///
/// Names are unique except when lossy conversion maps two non-UTF-8 file
/// names onto the same string; such entries stay adjacent, ordered by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileList {
    entries: Vec<FileEntry>,
}

impl FileList {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of the sizes observed at scan time.
    pub fn total_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a FileList {
    type Item = &'a FileEntry;
    type IntoIter = std::slice::Iter<'a, FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Recursively list every file under `root`.
///
/// Symlinks to directories are not descended into. Symlinks to regular files
/// are listed and resolved when they are read, so a dangling link shows up
/// later as a failed entry. Links to anything else (FIFOs, devices, sockets)
/// are skipped. Subdirectories that cannot be read are logged and skipped.
///
/// # Errors
///
/// Returns [`PackError::InvalidSource`] if `root` is missing or not a directory.
pub fn collect(root: &Path) -> Result<FileList> {
    if !root.is_dir() {
        return Err(PackError::InvalidSource {
            path: root.to_path_buf(),
        });
    }
    let root = std::path::absolute(root).map_err(|_| PackError::InvalidSource {
        path: root.to_path_buf(),
    })?;

    let mut entries = Vec::new();
    for item in WalkDir::new(&root).follow_links(false) {
        let item = match item {
            Ok(item) => item,
            Err(err) => {
                warn!("skipping unreadable path: {err}");
                continue;
            }
        };
        let Some(size) = file_size(&item) else {
            continue;
        };
        let Some(archive_name) = archive_name(&root, item.path()) else {
            continue;
        };
        entries.push(FileEntry {
            source_path: item.into_path(),
            archive_name,
            size,
        });
    }

    entries.sort_by(|a, b| {
        a.archive_name
            .cmp(&b.archive_name)
            .then_with(|| a.source_path.cmp(&b.source_path))
    });
    debug!("collected {} files under {}", entries.len(), root.display());
    Ok(FileList { entries })
}

/// Size of a walk item that should be archived, or `None` for directories
/// and special files.
fn file_size(item: &DirEntry) -> Option<u64> {
    let file_type = item.file_type();
    if file_type.is_file() {
        return Some(item.metadata().map(|m| m.len()).unwrap_or(0));
    }
    if file_type.is_symlink() {
        return match std::fs::metadata(item.path()) {
            Ok(target) if target.is_file() => Some(target.len()),
            Ok(_) => {
                debug!("skipping {}: not a regular file", item.path().display());
                None
            }
            // Dangling link: keep it so the failure is reported per entry
            Err(_) => Some(0),
        };
    }
    None
}

/// `path` relative to `root`, joined with `/`.
pub fn archive_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}
