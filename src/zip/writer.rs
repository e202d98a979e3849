//! Streaming ZIP writer.
//!
//! Entries are appended one at a time: a Local File Header with placeholder
//! CRC and sizes, the deflated data, then a seek back to patch the header.
//! The Central Directory and EOCD are written by [`ZipWriter::finish`].
//!
//! ## Failure isolation
//!
//! If anything goes wrong while an entry is being appended (the source cannot
//! be read, the output rejects a write), the writer seeks back to where that
//! entry began. The next entry overwrites the abandoned bytes and the entry
//! never reaches the Central Directory, so the archive stays valid. Because a
//! failed entry may have written past the final end of the archive, callers
//! must truncate the output to the length returned by `finish`.

use flate2::write::DeflateEncoder;
use flate2::{Compression, CrcReader};
use std::io::{self, Read, Seek, SeekFrom, Write};
use thiserror::Error;
use tracing::trace;

use super::structures::*;

/// Per-entry metadata supplied by the caller.
#[derive(Debug, Clone, Copy)]
pub struct EntryOptions {
    pub modified: DosDateTime,
    pub external_attrs: u32,
    /// Expected uncompressed size, used to decide up front whether the local
    /// header needs ZIP64 size fields.
    pub size_hint: u64,
}

impl Default for EntryOptions {
    fn default() -> Self {
        Self {
            modified: DosDateTime::EPOCH,
            external_attrs: 0,
            size_hint: 0,
        }
    }
}

/// Sizes of a successfully appended entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendedEntry {
    pub uncompressed_size: u64,
    pub compressed_size: u64,
    pub crc32: u32,
}

/// Why an entry could not be appended.
#[derive(Debug, Error)]
pub enum AppendError {
    /// The entry was skipped and the archive is exactly as it was before.
    #[error("{0}")]
    Entry(#[source] io::Error),
    /// The entry failed and the output could not be rewound; the archive can
    /// no longer be completed.
    #[error("cannot rewind archive after a failed entry: {0}")]
    Corrupt(#[source] io::Error),
}

/// ZIP archive writer over any seekable sink.
pub struct ZipWriter<W: Write + Seek> {
    /// The output sink, positioned at `offset` between entries
    inner: W,
    /// Entries that made it into the archive, in write order
    entries: Vec<ZipFileEntry>,
    /// Logical end of the archive data written so far
    offset: u64,
    method: CompressionMethod,
    level: Compression,
}

impl<W: Write + Seek> ZipWriter<W> {
    /// Create a writer that starts at the sink's current position.
    pub fn new(mut inner: W, method: CompressionMethod, level: u32) -> io::Result<Self> {
        let offset = inner.stream_position()?;
        Ok(Self {
            inner,
            entries: Vec::new(),
            offset,
            method,
            level: Compression::new(level),
        })
    }

    /// Append one entry named `name`, streaming its content from `source`.
    pub fn add_entry<R: Read>(
        &mut self,
        name: &str,
        source: R,
        options: &EntryOptions,
    ) -> Result<AppendedEntry, AppendError> {
        let start = self.offset;
        match self.write_entry(name, source, options, start) {
            Ok(entry) => {
                self.offset = start + entry.local_header_len() + entry.compressed_size;
                let appended = AppendedEntry {
                    uncompressed_size: entry.uncompressed_size,
                    compressed_size: entry.compressed_size,
                    crc32: entry.crc32,
                };
                self.entries.push(entry);
                Ok(appended)
            }
            Err(err) => {
                trace!("rewinding archive to {start} after failed entry {name}");
                self.inner
                    .seek(SeekFrom::Start(start))
                    .map_err(AppendError::Corrupt)?;
                Err(AppendError::Entry(err))
            }
        }
    }

    fn write_entry<R: Read>(
        &mut self,
        name: &str,
        source: R,
        options: &EntryOptions,
        start: u64,
    ) -> io::Result<ZipFileEntry> {
        // Deflate can expand incompressible input slightly; leave headroom
        let zip64 = options.size_hint.saturating_add(options.size_hint / 20) >= ZIP64_LIMIT;

        let mut entry = ZipFileEntry {
            file_name: name.to_string(),
            compression_method: self.method,
            compressed_size: 0,
            uncompressed_size: 0,
            crc32: 0,
            lfh_offset: start,
            modified: options.modified,
            external_attrs: options.external_attrs,
            zip64_local: zip64,
        };
        entry.write_local_header(&mut self.inner)?;

        let mut reader = CrcReader::new(source);
        match self.method {
            CompressionMethod::Deflate => {
                let mut encoder = DeflateEncoder::new(&mut self.inner, self.level);
                io::copy(&mut reader, &mut encoder)?;
                encoder.try_finish()?;
                entry.uncompressed_size = encoder.total_in();
                entry.compressed_size = encoder.total_out();
            }
            CompressionMethod::Stored => {
                let copied = io::copy(&mut reader, &mut self.inner)?;
                entry.uncompressed_size = copied;
                entry.compressed_size = copied;
            }
        }
        entry.crc32 = reader.crc().sum();

        if !zip64
            && (entry.compressed_size >= ZIP64_LIMIT || entry.uncompressed_size >= ZIP64_LIMIT)
        {
            return Err(io::Error::other(
                "file grew past 4 GiB after it was scanned",
            ));
        }

        // Patch the placeholders in the local header
        let end = start + entry.local_header_len() + entry.compressed_size;
        self.inner.seek(SeekFrom::Start(start + LFH_CRC_OFFSET))?;
        entry.write_crc_and_sizes(&mut self.inner)?;
        if zip64 {
            self.inner
                .seek(SeekFrom::Start(start + entry.local_zip64_sizes_offset()))?;
            entry.write_local_zip64_sizes(&mut self.inner)?;
        }
        self.inner.seek(SeekFrom::Start(end))?;

        Ok(entry)
    }

    /// Write the Central Directory and EOCD records and flush the sink.
    ///
    /// Returns the sink and the archive's final length; anything past that
    /// length is left over from failed entries and must be discarded.
    pub fn finish(mut self) -> io::Result<(W, u64)> {
        let cd_offset = self.offset;
        self.inner.seek(SeekFrom::Start(cd_offset))?;
        for entry in &self.entries {
            entry.write_central_header(&mut self.inner)?;
        }
        let cd_end = self.inner.stream_position()?;
        let cd_size = cd_end - cd_offset;
        let total = self.entries.len() as u64;

        if total >= ZIP64_ENTRY_LIMIT || cd_size >= ZIP64_LIMIT || cd_offset >= ZIP64_LIMIT {
            Zip64EOCD::new(total, cd_size, cd_offset).write_to(&mut self.inner)?;
            Zip64EOCDLocator::new(cd_end).write_to(&mut self.inner)?;
        }
        EndOfCentralDirectory::new(total, cd_size, cd_offset).write_to(&mut self.inner)?;

        let end = self.inner.stream_position()?;
        self.inner.flush()?;
        Ok((self.inner, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    /// Yields some bytes, then fails.
    struct FailingReader {
        sent: bool,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::other("disk on fire"));
            }
            self.sent = true;
            let chunk = [0x5Au8; 4096];
            let n = chunk.len().min(buf.len());
            buf[..n].copy_from_slice(&chunk[..n]);
            Ok(n)
        }
    }

    fn finish_into_bytes(writer: ZipWriter<Cursor<Vec<u8>>>) -> Vec<u8> {
        let (cursor, len) = writer.finish().unwrap();
        let mut bytes = cursor.into_inner();
        bytes.truncate(len as usize);
        bytes
    }

    fn read_back(bytes: Vec<u8>) -> Vec<(String, Vec<u8>)> {
        let mut archive = ::zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut data = Vec::new();
                file.read_to_end(&mut data).unwrap();
                (file.name().to_string(), data)
            })
            .collect()
    }

    #[test]
    fn test_empty_archive_is_bare_eocd() {
        let writer = ZipWriter::new(Cursor::new(Vec::new()), CompressionMethod::Deflate, 1).unwrap();
        let bytes = finish_into_bytes(writer);
        assert_eq!(bytes.len(), EndOfCentralDirectory::SIZE);
        assert_eq!(&bytes[0..4], EndOfCentralDirectory::SIGNATURE);
        assert!(read_back(bytes).is_empty());
    }

    #[test]
    fn test_entries_round_trip() {
        let mut writer =
            ZipWriter::new(Cursor::new(Vec::new()), CompressionMethod::Deflate, 1).unwrap();
        let body = b"hello hello hello hello".repeat(100);
        let appended = writer
            .add_entry("a.txt", &body[..], &EntryOptions::default())
            .unwrap();
        assert_eq!(appended.uncompressed_size, body.len() as u64);
        assert!(appended.compressed_size < appended.uncompressed_size);
        writer
            .add_entry("sub/b.txt", &b"bye"[..], &EntryOptions::default())
            .unwrap();
        writer
            .add_entry("empty", io::empty(), &EntryOptions::default())
            .unwrap();

        let entries = read_back(finish_into_bytes(writer));
        assert_eq!(
            entries,
            vec![
                ("a.txt".to_string(), body),
                ("sub/b.txt".to_string(), b"bye".to_vec()),
                ("empty".to_string(), Vec::new()),
            ]
        );
    }

    #[test]
    fn test_failed_entry_leaves_no_trace() {
        let mut writer =
            ZipWriter::new(Cursor::new(Vec::new()), CompressionMethod::Deflate, 1).unwrap();
        writer
            .add_entry("first", &b"one"[..], &EntryOptions::default())
            .unwrap();
        let err = writer
            .add_entry("broken", FailingReader { sent: false }, &EntryOptions::default())
            .unwrap_err();
        assert!(matches!(err, AppendError::Entry(_)));
        assert_eq!(err.to_string(), "disk on fire");
        writer
            .add_entry("second", &b"two"[..], &EntryOptions::default())
            .unwrap();

        let entries = read_back(finish_into_bytes(writer));
        assert_eq!(
            entries,
            vec![
                ("first".to_string(), b"one".to_vec()),
                ("second".to_string(), b"two".to_vec()),
            ]
        );
    }

    #[test]
    fn test_zip64_local_header_when_hint_is_large() {
        let mut writer =
            ZipWriter::new(Cursor::new(Vec::new()), CompressionMethod::Deflate, 1).unwrap();
        let options = EntryOptions {
            size_hint: ZIP64_LIMIT,
            ..EntryOptions::default()
        };
        writer.add_entry("huge", &b"small after all"[..], &options).unwrap();

        let bytes = finish_into_bytes(writer);
        assert_eq!(&bytes[18..26], &[0xFF; 8]);
        assert_eq!(read_back(bytes), vec![("huge".to_string(), b"small after all".to_vec())]);
    }

    #[test]
    fn test_stored_method_copies_verbatim() {
        let mut writer =
            ZipWriter::new(Cursor::new(Vec::new()), CompressionMethod::Stored, 0).unwrap();
        let appended = writer
            .add_entry("raw", &b"abc"[..], &EntryOptions::default())
            .unwrap();
        assert_eq!(appended.compressed_size, 3);
        assert_eq!(read_back(finish_into_bytes(writer)), vec![("raw".to_string(), b"abc".to_vec())]);
    }
}
