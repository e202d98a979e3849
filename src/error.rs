//! Pipeline-fatal error conditions.
//!
//! Only three things stop a run: a bad source directory, an output archive that
//! cannot be created, and an output archive that cannot be finalized. A single
//! unreadable file is never an error at this level; it is recorded as an
//! [`EntryOutcome::Failure`](crate::report::EntryOutcome::Failure) and the run
//! moves on.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort the whole pipeline.
#[derive(Debug, Error)]
pub enum PackError {
    /// The source root does not exist or is not a directory.
    #[error("source directory not found: {}", path.display())]
    InvalidSource { path: PathBuf },

    /// The output archive could not be created or truncated.
    #[error("cannot create archive {}: {source}", path.display())]
    ArchiveOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The archive was opened but could not be brought to a consistent state
    /// (central directory write, flush, or rollback of a failed entry).
    #[error("cannot finalize archive {}: {source}", path.display())]
    ArchiveWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T, E = PackError> = std::result::Result<T, E>;
