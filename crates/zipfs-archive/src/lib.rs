//! # zipfs-archive
//!
//! Transactional access to a single zip container.
//!
//! This crate provides:
//! - An [`ArchiveHandle`] owning the container file and its entry table
//! - Stream-based entry reads ([`ArchiveHandle::open_entry`])
//! - Begin/commit update transactions that rewrite the container atomically
//!   ([`ArchiveHandle::begin_update`])
//!
//! The `zip` crate can only read archives or write new ones, so every commit
//! writes a fresh container next to the current one, raw-copying untouched
//! entries, and then persists it over the container path.
//!
//! ## Example
//!
//! ```ignore
//! use zipfs_archive::ArchiveHandle;
//!
//! let mut handle = ArchiveHandle::open("data.zip")?;
//!
//! let mut update = handle.begin_update();
//! update.add_directory("docs")?;
//! update.add_file("docs/readme.txt", &mut "hello".as_bytes())?;
//! update.commit()?;
//!
//! assert!(handle.entry("docs/").is_some());
//! ```

mod entry;
mod error;
mod handle;
mod update;

pub use entry::{ArchiveEntry, EntryReader, SEPARATOR};
pub use error::{Error, Result};
pub use handle::{ArchiveHandle, ArchiveOptions};
pub use update::ArchiveUpdate;

// Re-export the zip types that appear in the public API
pub use zip::CompressionMethod;
