use crate::hash::HashAlgorithm;
use zipfs_archive::ArchiveOptions;

/// Configuration for opening a zip file system.
#[derive(Debug, Clone)]
pub struct ZipFsConfig {
    /// Create an empty container when the path does not exist.
    pub create_if_missing: bool,
    /// Flush every rewritten container to disk before it replaces the old one.
    pub sync_on_commit: bool,
    /// Digest used for [`LinkInfo::hash`](crate::LinkInfo::hash).
    pub hash_algorithm: HashAlgorithm,
}

impl Default for ZipFsConfig {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_on_commit: true,
            hash_algorithm: HashAlgorithm::Md5,
        }
    }
}

impl ZipFsConfig {
    pub(crate) fn archive_options(&self) -> ArchiveOptions {
        ArchiveOptions {
            create_if_missing: self.create_if_missing,
            sync_on_commit: self.sync_on_commit,
        }
    }
}
