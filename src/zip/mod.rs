//! ZIP archive writing.
//!
//! This module produces standard ZIP archives from a sequence of streamed
//! entries, including ZIP64 extensions for large archives.
//!
//! ## Architecture
//!
//! - [`structures`]: ZIP format records (local/central headers, EOCD, ZIP64) and their serialization
//! - [`writer`]: Streaming writer that appends entries and emits the Central Directory
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! The writer streams entry data straight into the output and keeps only the
//! per-entry metadata in memory until the Central Directory is written.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for files > 4GB and archives with more than 65535 entries
//! - STORED (no compression) and DEFLATE compression methods
//! - UTF-8 entry names
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No reading or extraction

mod structures;
mod writer;

pub use structures::*;
pub use writer::{AppendError, AppendedEntry, EntryOptions, ZipWriter};
