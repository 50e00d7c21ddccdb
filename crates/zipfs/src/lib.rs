//! # zipfs
//!
//! A hierarchical file-system view over a single zip container.
//!
//! This crate provides:
//! - [`ZipFileSystem`], implementing [`FileSystemOperations`] over a zip file
//! - Directory emulation on top of the flat entry namespace (directories are
//!   entries whose name ends with `/`)
//! - Lazily computed, memoized content hashes on [`ZipLinkInfo`]
//! - Direct read streams that hold the file-system lock until closed
//!
//! Every structural change rewrites the container, stored without
//! compression, and persists it atomically.
//!
//! ## Example
//!
//! ```ignore
//! use zipfs::{FileSystemOperations, LinkInfo, ListingOptions, ZipFileSystem};
//!
//! let fs = ZipFileSystem::open("data.zip")?;
//! fs.write_file("a/b.txt", &mut "hello".as_bytes(), false)?;
//! fs.create_directory("a/c")?;
//!
//! for link in fs.list_directory("a", &ListingOptions::default())? {
//!     println!("{} ({} bytes)", link.full_name(), link.length());
//! }
//!
//! let mut content = Vec::new();
//! fs.read_file("a/b.txt", &mut content)?;
//! ```

mod config;
mod error;
mod filesystem;
mod hash;
mod link;
mod operations;
mod path;
mod stream;

pub use config::ZipFsConfig;
pub use error::{Error, Result};
pub use filesystem::ZipFileSystem;
pub use hash::{hash_reader, FileHash, HashAlgorithm};
pub use link::ZipLinkInfo;
pub use operations::{FileAccess, FileSystemOperations, LinkInfo, LinkMetadata, ListingOptions};
pub use path::normalize_directory_name;
pub use stream::EntryStream;

// Re-export the container layer for callers that need raw entry access
pub use zipfs_archive::{ArchiveEntry, ArchiveHandle};
