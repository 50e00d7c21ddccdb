use log::trace;
use std::fmt;
use std::io::{self, Read};
use std::sync::MutexGuard;
use zipfs_archive::{ArchiveHandle, EntryReader};

/// A read stream over one file that holds the file-system lock.
///
/// Every other operation on the same file system blocks until the stream is
/// dropped or [`close`](EntryStream::close)d. Because it owns a lock guard,
/// the stream cannot be sent to another thread.
///
/// The lock is not re-entrant. Calling any operation of the same file system
/// on the thread that holds the stream deadlocks forever. That includes
/// [`LinkInfo::hash`](crate::LinkInfo::hash) on any of its link infos and a
/// `write_file` fed from this stream. Close the stream first, or copy its
/// content out before touching the file system again.
pub struct EntryStream<'a> {
    reader: EntryReader,
    name: String,
    _guard: MutexGuard<'a, ArchiveHandle>,
}

impl<'a> EntryStream<'a> {
    pub(crate) fn new(
        guard: MutexGuard<'a, ArchiveHandle>,
        reader: EntryReader,
        name: &str,
    ) -> Self {
        Self {
            reader,
            name: name.to_string(),
            _guard: guard,
        }
    }

    /// Name of the entry being read.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Close the stream and release the file-system lock.
    pub fn close(self) {}
}

impl Read for EntryStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl Drop for EntryStream<'_> {
    fn drop(&mut self) {
        trace!("close_direct_stream({:?})", self.name);
    }
}

impl fmt::Debug for EntryStream<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryStream")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
