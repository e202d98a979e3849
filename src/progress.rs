//! Events flowing from the pipeline to whoever renders it.

use crate::io::{FileEntry, FileList};
use crate::report::EntryResult;

/// Pipeline stages, in order.
///
/// A run that fails validation goes straight from `Scanning` to an error; a
/// run over an empty tree stops after `Scanning` without reaching `Previewed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Idle,
    Scanning,
    Previewed,
    Compressing,
    Finalizing,
    Reported,
}

/// Observer for a packing run. All methods default to doing nothing.
pub trait Progress {
    fn stage(&mut self, _stage: Stage) {}

    /// The source tree has been collected and is about to be archived.
    fn scanned(&mut self, _files: &FileList) {}

    fn entry_started(&mut self, _index: usize, _entry: &FileEntry) {}

    fn entry_finished(&mut self, _index: usize, _result: &EntryResult) {}
}

/// Discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {}

impl<P: Progress + ?Sized> Progress for &mut P {
    fn stage(&mut self, stage: Stage) {
        (**self).stage(stage)
    }

    fn scanned(&mut self, files: &FileList) {
        (**self).scanned(files)
    }

    fn entry_started(&mut self, index: usize, entry: &FileEntry) {
        (**self).entry_started(index, entry)
    }

    fn entry_finished(&mut self, index: usize, result: &EntryResult) {
        (**self).entry_finished(index, result)
    }
}
