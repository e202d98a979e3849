//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use tempfile::TempDir;

/// Create a temporary directory holding `files` (relative path, content).
pub fn tree(files: &[(&str, &[u8])]) -> TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    for (name, content) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, content).expect("write test file");
    }
    dir
}

/// Every entry of the archive at `path`, in central directory order.
pub fn read_zip(path: &Path) -> Vec<(String, Vec<u8>)> {
    let file = File::open(path).expect("open archive");
    let mut archive = zip::ZipArchive::new(file).expect("valid zip archive");
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).expect("read entry");
            let mut data = Vec::new();
            entry.read_to_end(&mut data).expect("inflate entry");
            (entry.name().to_string(), data)
        })
        .collect()
}

pub fn zip_names(path: &Path) -> Vec<String> {
    read_zip(path).into_iter().map(|(name, _)| name).collect()
}
