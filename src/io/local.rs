use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::zip::{DosDateTime, EntryOptions};

/// A source file opened for archiving, with the metadata its ZIP entry records
pub struct LocalFileReader {
    file: File,
    options: EntryOptions,
}

impl LocalFileReader {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let metadata = file.metadata()?;
        let modified = metadata
            .modified()
            .map(DosDateTime::from_system_time)
            .unwrap_or(DosDateTime::EPOCH);
        let options = EntryOptions {
            modified,
            external_attrs: external_attrs(&metadata),
            size_hint: metadata.len(),
        };
        Ok(Self { file, options })
    }

    pub fn options(&self) -> &EntryOptions {
        &self.options
    }
}

impl Read for LocalFileReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

/// Unix mode bits live in the high half of the external attributes
#[cfg(unix)]
fn external_attrs(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    (metadata.permissions().mode() & 0xFFFF) << 16
}

#[cfg(not(unix))]
fn external_attrs(metadata: &std::fs::Metadata) -> u32 {
    // MS-DOS read-only attribute
    if metadata.permissions().readonly() { 0x01 } else { 0 }
}
