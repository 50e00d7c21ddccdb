//! The operation contract a file-system backend implements.

use crate::hash::FileHash;
use crate::Result;
use chrono::NaiveDateTime;
use std::io::{Read, Write};

/// Requested access for a direct stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileAccess {
    Read,
    Write,
    ReadWrite,
}

/// Options for [`FileSystemOperations::list_directory`].
#[derive(Debug, Clone)]
pub struct ListingOptions {
    /// Include every descendant instead of only immediate children.
    ///
    /// Immediate listings also report subdirectories that exist only as a
    /// prefix of deeper entries. Those have no timestamp and no content.
    pub recursive: bool,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self { recursive: true }
    }
}

/// Metadata patch accepted by [`FileSystemOperations::update_metadata`].
#[derive(Debug, Clone, Default)]
pub struct LinkMetadata {
    pub creation_time: Option<NaiveDateTime>,
    pub last_write_time: Option<NaiveDateTime>,
    pub is_hidden: Option<bool>,
    pub is_read_only: Option<bool>,
}

/// Metadata describing one file or directory.
pub trait LinkInfo {
    /// Full name of the link inside the file system.
    fn full_name(&self) -> &str;

    /// Whether the link exists.
    fn exists(&self) -> bool;

    fn is_directory(&self) -> bool;

    fn is_hidden(&self) -> bool;

    fn is_read_only(&self) -> bool;

    fn creation_time(&self) -> Option<NaiveDateTime>;

    fn last_write_time(&self) -> Option<NaiveDateTime>;

    /// Content length in bytes (0 for directories).
    fn length(&self) -> u64;

    /// Path used to read the link's content.
    fn content_path(&self) -> &str;

    /// Content hash, computed on first access.
    fn hash(&self) -> Result<&FileHash>;
}

/// Operations a file-system backend exposes to the generic file-system layer.
///
/// Paths are full names using `/` as separator. Lookups that find nothing
/// return `Ok(None)`; operations that need existing content fail with
/// [`Error::NotFound`](crate::Error::NotFound).
pub trait FileSystemOperations {
    type Link: LinkInfo;

    /// Stream returned by [`open_direct_stream`](Self::open_direct_stream).
    type DirectStream<'a>: Read
    where
        Self: 'a;

    fn get_link_info(&self, path: &str) -> Result<Option<Self::Link>>;

    /// Copy the content of a file into `destination`.
    fn read_file(&self, path: &str, destination: &mut dyn Write) -> Result<()>;

    /// Create or replace a file with everything `content` yields.
    fn write_file(&self, path: &str, content: &mut dyn Read, overwrite: bool)
        -> Result<Self::Link>;

    /// Open a stream that reads a file without buffering it first.
    fn open_direct_stream(
        &self,
        path: &str,
        access: FileAccess,
        overwrite: bool,
    ) -> Result<Self::DirectStream<'_>>;

    fn move_file(&self, source: &str, destination: &str, overwrite: bool) -> Result<Self::Link>;

    fn delete_file(&self, path: &str) -> Result<()>;

    fn create_directory(&self, path: &str) -> Result<Self::Link>;

    fn move_directory(&self, source: &str, destination: &str) -> Result<Self::Link>;

    fn delete_directory(&self, path: &str, recursive: bool) -> Result<()>;

    fn list_directory(&self, path: &str, options: &ListingOptions) -> Result<Vec<Self::Link>>;

    fn update_metadata(&self, path: &str, metadata: &LinkMetadata) -> Result<Self::Link>;
}
