//! # zipper
//!
//! Pack a directory tree into a single deflate-compressed ZIP archive.
//!
//! The library is the archival pipeline: it walks a source directory into a
//! deterministic file list, streams every file into the archive one at a
//! time, and folds the per-file outcomes into a run report. A file that
//! cannot be read never aborts the run; it is recorded and skipped, and the
//! archive is still produced from the rest.
//!
//! ## Features
//!
//! - Sorted, `/`-separated entry names, so archives are reproducible across runs and platforms
//! - Fixed compression policy: DEFLATE at the fastest level
//! - Per-entry failure isolation with rollback of partially written entries
//! - ZIP64 extensions for large files and archives with many entries
//! - Progress events through the [`Progress`] trait, so any front end can render them
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use zipper::{NoProgress, collect, write_archive};
//!
//! fn main() -> anyhow::Result<()> {
//!     let files = collect(Path::new("photos"))?;
//!     println!("{} files, {} bytes", files.len(), files.total_bytes());
//!
//!     let report = write_archive(Path::new("photos.zip"), &files, NoProgress)?;
//!     for failure in &report.failures {
//!         println!("{}: {}", failure.archive_name, failure.message);
//!     }
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod progress;
pub mod report;
pub mod ui;
pub mod zip;

pub use crate::archive::{RunOutcome, pack, write_archive};
pub use crate::cli::Cli;
pub use crate::error::PackError;
pub use crate::io::{FileEntry, FileList, collect};
pub use crate::progress::{NoProgress, Progress, Stage};
pub use crate::report::{
    EntryOutcome, EntryResult, FailedEntry, RunAccumulator, RunReport, RunStatus,
};
