use crate::filesystem::{lock_handle, map_archive_error};
use crate::hash::{hash_reader, FileHash, HashAlgorithm};
use crate::operations::LinkInfo;
use crate::{Error, Result};
use chrono::NaiveDateTime;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use zipfs_archive::{ArchiveEntry, ArchiveHandle};

/// Metadata for one entry of a zip file system.
///
/// A `ZipLinkInfo` is a snapshot taken under the file-system lock. It keeps
/// only a weak reference to its file system, used to read the content when
/// [`LinkInfo::hash`] is first called; the hash is then memoized.
#[derive(Debug, Clone)]
pub struct ZipLinkInfo {
    owner: Weak<Mutex<ArchiveHandle>>,
    full_name: String,
    is_directory: bool,
    modified: Option<NaiveDateTime>,
    length: u64,
    algorithm: HashAlgorithm,
    hash: OnceLock<FileHash>,
}

impl ZipLinkInfo {
    pub(crate) fn from_entry(
        owner: &Arc<Mutex<ArchiveHandle>>,
        entry: &ArchiveEntry,
        algorithm: HashAlgorithm,
    ) -> Self {
        Self {
            owner: Arc::downgrade(owner),
            full_name: entry.name.clone(),
            is_directory: entry.is_dir,
            modified: entry.modified,
            length: entry.size,
            algorithm,
            hash: OnceLock::new(),
        }
    }

    /// A directory implied by deeper entry names but without its own marker.
    pub(crate) fn implicit_directory(
        owner: &Arc<Mutex<ArchiveHandle>>,
        name: &str,
        algorithm: HashAlgorithm,
    ) -> Self {
        Self {
            owner: Arc::downgrade(owner),
            full_name: name.to_string(),
            is_directory: true,
            modified: None,
            length: 0,
            algorithm,
            hash: OnceLock::new(),
        }
    }

    /// Whether the hash has already been computed.
    pub fn is_hash_cached(&self) -> bool {
        self.hash.get().is_some()
    }

    fn compute_hash(&self) -> Result<FileHash> {
        let owner = self.owner.upgrade().ok_or(Error::Closed)?;
        let mut handle = lock_handle(&owner);
        let mut reader = handle
            .open_entry(&self.full_name)
            .map_err(map_archive_error)?;
        Ok(hash_reader(self.algorithm, &mut reader)?)
    }
}

impl LinkInfo for ZipLinkInfo {
    fn full_name(&self) -> &str {
        &self.full_name
    }

    fn exists(&self) -> bool {
        true
    }

    fn is_directory(&self) -> bool {
        self.is_directory
    }

    fn is_hidden(&self) -> bool {
        false
    }

    fn is_read_only(&self) -> bool {
        false
    }

    // Zip entries carry a single timestamp.
    fn creation_time(&self) -> Option<NaiveDateTime> {
        self.modified
    }

    fn last_write_time(&self) -> Option<NaiveDateTime> {
        self.modified
    }

    fn length(&self) -> u64 {
        self.length
    }

    fn content_path(&self) -> &str {
        &self.full_name
    }

    fn hash(&self) -> Result<&FileHash> {
        if let Some(hash) = self.hash.get() {
            return Ok(hash);
        }
        let computed = self.compute_hash()?;
        Ok(self.hash.get_or_init(|| computed))
    }
}
