//! Per-entry results and the end-of-run report.
//!
//! [`RunAccumulator`] is the only thing that mutates run statistics. It folds
//! [`EntryResult`]s in arrival order and is finalized exactly once, after the
//! archive has been closed, with the elapsed time and the archive size.

use std::path::PathBuf;
use std::time::Duration;

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    Success {
        /// Bytes read from the source file
        bytes_read: u64,
        /// Compressed bytes stored in the archive
        bytes_written: u64,
    },
    Failure { message: String },
}

/// Outcome of archiving a single [`FileEntry`](crate::io::FileEntry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryResult {
    pub archive_name: String,
    pub outcome: EntryOutcome,
}

impl EntryResult {
    pub fn success(archive_name: impl Into<String>, bytes_read: u64, bytes_written: u64) -> Self {
        Self {
            archive_name: archive_name.into(),
            outcome: EntryOutcome::Success {
                bytes_read,
                bytes_written,
            },
        }
    }

    pub fn failure(archive_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            archive_name: archive_name.into(),
            outcome: EntryOutcome::Failure {
                message: message.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, EntryOutcome::Success { .. })
    }
}

/// A file that could not be added, with the underlying error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedEntry {
    pub archive_name: String,
    pub message: String,
}

/// Overall verdict of a run that produced an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every entry was added
    Complete,
    /// The archive was written but some entries failed
    Partial,
}

/// Aggregate statistics of one archiving run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub output_path: PathBuf,
    pub total_files: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Failures in the order they occurred
    pub failures: Vec<FailedEntry>,
    /// Uncompressed bytes of the successful entries
    pub bytes_read: u64,
    /// Compressed bytes of the successful entries
    pub bytes_written: u64,
    /// Wall-clock time from the first entry to archive close
    pub elapsed: Duration,
    /// Size of the finished archive on disk
    pub output_size_bytes: u64,
}

impl RunReport {
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    pub fn status(&self) -> RunStatus {
        if self.is_success() {
            RunStatus::Complete
        } else {
            RunStatus::Partial
        }
    }

    /// Archive bytes produced per second; zero for an instantaneous run.
    pub fn throughput_bytes_per_sec(&self) -> f64 {
        let secs = self.elapsed_seconds();
        if secs > 0.0 {
            self.output_size_bytes as f64 / secs
        } else {
            0.0
        }
    }

    /// Compressed size as a fraction of the input size, if anything was read.
    pub fn compression_ratio(&self) -> Option<f64> {
        (self.bytes_read > 0).then(|| self.bytes_written as f64 / self.bytes_read as f64)
    }
}

/// Running counters for a run in progress.
#[derive(Debug, Clone)]
pub struct RunAccumulator {
    report: RunReport,
}

impl RunAccumulator {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            report: RunReport {
                output_path: output_path.into(),
                total_files: 0,
                succeeded: 0,
                failed: 0,
                failures: Vec::new(),
                bytes_read: 0,
                bytes_written: 0,
                elapsed: Duration::ZERO,
                output_size_bytes: 0,
            },
        }
    }

    pub fn record(&mut self, result: &EntryResult) {
        let report = &mut self.report;
        report.total_files += 1;
        match &result.outcome {
            EntryOutcome::Success {
                bytes_read,
                bytes_written,
            } => {
                report.succeeded += 1;
                report.bytes_read += bytes_read;
                report.bytes_written += bytes_written;
            }
            EntryOutcome::Failure { message } => {
                report.failed += 1;
                report.failures.push(FailedEntry {
                    archive_name: result.archive_name.clone(),
                    message: message.clone(),
                });
            }
        }
        debug_assert_eq!(report.succeeded + report.failed, report.total_files);
    }

    /// The partial report so far; timing and output size are still zero.
    pub fn snapshot(&self) -> &RunReport {
        &self.report
    }

    /// Stop the clock and record the archive size.
    pub fn finalize(mut self, elapsed: Duration, output_size_bytes: u64) -> RunReport {
        self.report.elapsed = elapsed;
        self.report.output_size_bytes = output_size_bytes;
        self.report
    }
}

impl Extend<EntryResult> for RunAccumulator {
    fn extend<I: IntoIterator<Item = EntryResult>>(&mut self, iter: I) {
        for result in iter {
            self.record(&result);
        }
    }
}
