//! The archival pipeline: collect, compress, report.
//!
//! [`write_archive`] turns a [`FileList`] into a ZIP file, isolating failures
//! per entry. [`pack`] runs the whole flow from a source directory, including
//! the empty-source short circuit.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use zipper::{NoProgress, RunOutcome, pack};
//!
//! match pack(Path::new("photos"), Path::new("photos.zip"), NoProgress)? {
//!     RunOutcome::Completed(report) => {
//!         println!("{} of {} files added", report.succeeded, report.total_files);
//!     }
//!     RunOutcome::EmptySource { root } => println!("nothing to pack in {}", root.display()),
//! }
//! # Ok::<(), zipper::PackError>(())
//! ```

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::{COMPRESSION_LEVEL, COMPRESSION_METHOD};
use crate::error::{PackError, Result};
use crate::io::{FileEntry, FileList, LocalFileReader, collect};
use crate::progress::{Progress, Stage};
use crate::report::{EntryOutcome, EntryResult, RunAccumulator, RunReport};
use crate::zip::{AppendError, ZipWriter};

/// Output buffer size; entries are streamed through it
const WRITE_BUFFER_SIZE: usize = 256 * 1024;

/// Result of a pipeline run that did not hit a fatal error.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// An archive was written; some entries may have failed.
    Completed(RunReport),
    /// The source tree holds no files. No archive was created.
    EmptySource { root: PathBuf },
}

/// Archive every file under `root` into `output`.
///
/// # Errors
///
/// [`PackError::InvalidSource`] if `root` is not a directory,
/// [`PackError::ArchiveOpen`] / [`PackError::ArchiveWrite`] if the output
/// cannot be created or completed. Failures of individual files are reported
/// in the [`RunReport`] instead.
pub fn pack<P: Progress>(root: &Path, output: &Path, mut progress: P) -> Result<RunOutcome> {
    progress.stage(Stage::Scanning);
    let files = collect(root)?;
    if files.is_empty() {
        debug!("no files found under {}", root.display());
        progress.stage(Stage::Reported);
        return Ok(RunOutcome::EmptySource {
            root: root.to_path_buf(),
        });
    }

    progress.scanned(&files);
    progress.stage(Stage::Previewed);

    let report = write_archive(output, &files, &mut progress)?;
    progress.stage(Stage::Reported);
    Ok(RunOutcome::Completed(report))
}

/// Write `files` into a new archive at `output`, truncating any existing file.
///
/// Entries are processed strictly in list order. An entry that cannot be read
/// or appended is recorded as a failure and the run continues; so is an entry
/// whose archive name was already used by an earlier one. Only problems with
/// the output archive itself abort the run, in which case the partial file is
/// removed.
pub fn write_archive<P: Progress>(
    output: &Path,
    files: &FileList,
    mut progress: P,
) -> Result<RunReport> {
    let file = File::create(output).map_err(|source| PackError::ArchiveOpen {
        path: output.to_path_buf(),
        source,
    })?;
    let mut writer = match ZipWriter::new(
        BufWriter::with_capacity(WRITE_BUFFER_SIZE, file),
        COMPRESSION_METHOD,
        COMPRESSION_LEVEL,
    ) {
        Ok(writer) => writer,
        Err(source) => {
            discard(output);
            return Err(PackError::ArchiveOpen {
                path: output.to_path_buf(),
                source,
            });
        }
    };
    let output_identity = fs::canonicalize(output).ok();

    progress.stage(Stage::Compressing);
    let mut accumulator = RunAccumulator::new(output);
    let mut claimed: HashMap<&str, &Path> = HashMap::with_capacity(files.len());
    let started = Instant::now();

    for (index, entry) in files.iter().enumerate() {
        progress.entry_started(index, entry);
        debug!("adding {}", entry.archive_name);

        let result = if let Some(first) = claimed.get(entry.archive_name.as_str()) {
            EntryResult::failure(
                &entry.archive_name,
                format!("name collides with {}", first.display()),
            )
        } else {
            claimed.insert(&entry.archive_name, &entry.source_path);
            match append_entry(&mut writer, entry, output_identity.as_deref()) {
                Ok(result) => result,
                Err(source) => return Err(abort(output, source)),
            }
        };
        if let EntryOutcome::Failure { message } = &result.outcome {
            warn!("failed to add {}: {}", entry.archive_name, message);
        }

        accumulator.record(&result);
        progress.entry_finished(index, &result);
    }

    progress.stage(Stage::Finalizing);
    if let Err(source) = close(writer) {
        return Err(abort(output, source));
    }
    let elapsed = started.elapsed();

    let output_size = fs::metadata(output)
        .map(|m| m.len())
        .map_err(|source| PackError::ArchiveWrite {
            path: output.to_path_buf(),
            source,
        })?;
    let report = accumulator.finalize(elapsed, output_size);

    info!(
        "wrote {} ({} of {} entries, {} bytes) in {:.2}s",
        output.display(),
        report.succeeded,
        report.total_files,
        report.output_size_bytes,
        report.elapsed_seconds()
    );
    Ok(report)
}

/// Add one file. `Err` means the archive itself is no longer usable.
fn append_entry<W: Write + Seek>(
    writer: &mut ZipWriter<W>,
    entry: &FileEntry,
    output_identity: Option<&Path>,
) -> io::Result<EntryResult> {
    let name = &entry.archive_name;
    if is_output_archive(entry, output_identity) {
        return Ok(EntryResult::failure(
            name,
            "refusing to add the output archive to itself",
        ));
    }

    let reader = match LocalFileReader::open(&entry.source_path) {
        Ok(reader) => reader,
        Err(err) => return Ok(EntryResult::failure(name, err.to_string())),
    };
    let options = *reader.options();

    match writer.add_entry(name, reader, &options) {
        Ok(appended) => Ok(EntryResult::success(
            name,
            appended.uncompressed_size,
            appended.compressed_size,
        )),
        Err(AppendError::Entry(err)) => Ok(EntryResult::failure(name, err.to_string())),
        Err(AppendError::Corrupt(err)) => Err(err),
    }
}

fn is_output_archive(entry: &FileEntry, output_identity: Option<&Path>) -> bool {
    let Some(output) = output_identity else {
        return false;
    };
    // Cheap name check first; only canonicalize likely matches
    if entry.source_path.file_name() != output.file_name() {
        return false;
    }
    fs::canonicalize(&entry.source_path).is_ok_and(|p| p == output)
}

/// Write the central directory, flush, and trim bytes left by failed entries.
fn close(writer: ZipWriter<BufWriter<File>>) -> io::Result<()> {
    let (buffered, len) = writer.finish()?;
    let file = buffered.into_inner().map_err(|e| e.into_error())?;
    file.set_len(len)?;
    file.sync_all()
}

fn abort(output: &Path, source: io::Error) -> PackError {
    discard(output);
    PackError::ArchiveWrite {
        path: output.to_path_buf(),
        source,
    }
}

fn discard(output: &Path) {
    if let Err(err) = fs::remove_file(output) {
        warn!("could not remove incomplete archive {}: {err}", output.display());
    }
}
