use crate::config::ZipFsConfig;
use crate::link::ZipLinkInfo;
use crate::operations::{FileAccess, FileSystemOperations, LinkMetadata, ListingOptions};
use crate::path::{
    immediate_child, is_descendant_of, normalize_directory_name, validate_directory_name, validate_file_name,
};
use crate::stream::EntryStream;
use crate::{Error, Result};
use log::{debug, trace, warn};
use std::collections::HashSet;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use zipfs_archive::{ArchiveEntry, ArchiveHandle};

/// A hierarchical file system backed by a single zip container.
///
/// All operations are serialized by one lock around the container handle.
/// Cloning is cheap and yields another view onto the same container.
#[derive(Debug, Clone)]
pub struct ZipFileSystem {
    handle: Arc<Mutex<ArchiveHandle>>,
    config: ZipFsConfig,
}

impl ZipFileSystem {
    /// Open (or create) the container at `path` with default configuration.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, ZipFsConfig::default())
    }

    /// Open the container at `path` with explicit configuration.
    pub fn open_with<P: AsRef<Path>>(path: P, config: ZipFsConfig) -> Result<Self> {
        let handle = ArchiveHandle::open_with(path, config.archive_options())?;
        Ok(Self {
            handle: Arc::new(Mutex::new(handle)),
            config,
        })
    }

    /// Get the configuration this file system was opened with.
    pub fn config(&self) -> &ZipFsConfig {
        &self.config
    }

    /// Get the path to the container file.
    pub fn path(&self) -> PathBuf {
        self.lock().path().to_path_buf()
    }

    /// Number of entries (files and directory markers) in the container.
    pub fn entry_count(&self) -> usize {
        self.lock().len()
    }

    /// Look up a file; directory entries are not returned.
    pub fn get_file_info(&self, path: &str) -> Option<ZipLinkInfo> {
        trace!("get_file_info({:?})", path);
        let handle = self.lock();
        self.file_info(&handle, path)
    }

    /// Look up a directory, with or without a trailing separator.
    pub fn get_directory_info(&self, path: &str) -> Option<ZipLinkInfo> {
        trace!("get_directory_info({:?})", path);
        let handle = self.lock();
        self.directory_info(&handle, path)
    }

    fn lock(&self) -> MutexGuard<'_, ArchiveHandle> {
        lock_handle(&self.handle)
    }

    fn link_for(&self, entry: &ArchiveEntry) -> ZipLinkInfo {
        ZipLinkInfo::from_entry(&self.handle, entry, self.config.hash_algorithm)
    }

    fn info(&self, handle: &ArchiveHandle, name: &str) -> Option<ZipLinkInfo> {
        handle.entry(name).map(|entry| self.link_for(entry))
    }

    fn file_info(&self, handle: &ArchiveHandle, name: &str) -> Option<ZipLinkInfo> {
        handle
            .entry(name)
            .filter(|entry| !entry.is_dir)
            .map(|entry| self.link_for(entry))
    }

    fn directory_info(&self, handle: &ArchiveHandle, name: &str) -> Option<ZipLinkInfo> {
        let name = normalize_directory_name(name);
        handle
            .entry(&name)
            .filter(|entry| entry.is_dir)
            .map(|entry| self.link_for(entry))
    }
}

impl FileSystemOperations for ZipFileSystem {
    type Link = ZipLinkInfo;
    type DirectStream<'a> = EntryStream<'a>;

    fn get_link_info(&self, path: &str) -> Result<Option<ZipLinkInfo>> {
        trace!("get_link_info({:?})", path);
        let handle = self.lock();
        Ok(self.info(&handle, path))
    }

    fn read_file(&self, path: &str, destination: &mut dyn Write) -> Result<()> {
        trace!("read_file({:?})", path);
        let mut handle = self.lock();
        if handle.entry(path).filter(|entry| !entry.is_dir).is_none() {
            return Err(Error::NotFound(path.to_string()));
        }

        let mut reader = handle.open_entry(path).map_err(map_archive_error)?;
        let copied = io::copy(&mut reader, destination)?;
        debug!("read_file: copied {} bytes from {:?}", copied, path);
        Ok(())
    }

    fn write_file(
        &self,
        path: &str,
        content: &mut dyn Read,
        overwrite: bool,
    ) -> Result<ZipLinkInfo> {
        trace!("write_file({:?}, overwrite={})", path, overwrite);
        validate_file_name(path)?;

        let mut handle = self.lock();
        if !overwrite && handle.entry(path).is_some() {
            return Err(Error::AlreadyExists(path.to_string()));
        }

        let mut update = handle.begin_update();
        update.add_file(path, content).map_err(map_archive_error)?;
        update.commit()?;

        self.file_info(&handle, path)
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    /// Only [`FileAccess::Read`] is supported; `overwrite` has no effect on
    /// reads.
    fn open_direct_stream(
        &self,
        path: &str,
        access: FileAccess,
        overwrite: bool,
    ) -> Result<EntryStream<'_>> {
        trace!(
            "open_direct_stream({:?}, {:?}, overwrite={})",
            path,
            access,
            overwrite
        );
        if access != FileAccess::Read {
            return Err(Error::Unsupported("direct streams only support read access"));
        }
        if overwrite {
            warn!("open_direct_stream: overwrite ignored for read access to {:?}", path);
        }

        // The guard moves into the stream on success and is dropped here on
        // every error path.
        let mut handle = self.lock();
        if handle.entry(path).filter(|entry| !entry.is_dir).is_none() {
            return Err(Error::NotFound(path.to_string()));
        }
        let reader = handle.open_entry(path).map_err(map_archive_error)?;
        Ok(EntryStream::new(handle, reader, path))
    }

    fn move_file(&self, source: &str, destination: &str, overwrite: bool) -> Result<ZipLinkInfo> {
        trace!(
            "move_file({:?}, {:?}, overwrite={})",
            source,
            destination,
            overwrite
        );
        validate_file_name(destination)?;

        let mut handle = self.lock();
        if handle.entry(source).filter(|entry| !entry.is_dir).is_none() {
            return Err(Error::NotFound(source.to_string()));
        }
        if source == destination {
            debug!("move_file: source and destination are both {:?}", source);
            return self
                .file_info(&handle, destination)
                .ok_or_else(|| Error::NotFound(destination.to_string()));
        }
        if !overwrite && handle.entry(destination).is_some() {
            return Err(Error::AlreadyExists(destination.to_string()));
        }

        let mut reader = handle.open_entry(source).map_err(map_archive_error)?;
        let mut update = handle.begin_update();
        update
            .add_file(destination, &mut reader)
            .map_err(map_archive_error)?;
        update.delete(source);
        update.commit()?;

        self.file_info(&handle, destination)
            .ok_or_else(|| Error::NotFound(destination.to_string()))
    }

    fn delete_file(&self, path: &str) -> Result<()> {
        trace!("delete_file({:?})", path);
        let mut handle = self.lock();
        let mut update = handle.begin_update();
        if !update.delete(path) {
            debug!("delete_file: {:?} not present, nothing to do", path);
        }
        update.commit()?;
        Ok(())
    }

    fn create_directory(&self, path: &str) -> Result<ZipLinkInfo> {
        trace!("create_directory({:?})", path);
        validate_directory_name(path)?;
        let name = normalize_directory_name(path);

        let mut handle = self.lock();
        if handle.entry(&name).is_some() {
            debug!("create_directory: {:?} already exists", name);
        } else {
            let mut update = handle.begin_update();
            update.add_directory(&name).map_err(map_archive_error)?;
            update.commit()?;
        }

        self.directory_info(&handle, &name)
            .ok_or_else(|| Error::NotFound(name.to_string()))
    }

    fn move_directory(&self, source: &str, destination: &str) -> Result<ZipLinkInfo> {
        trace!("move_directory({:?}, {:?})", source, destination);
        Err(Error::Unsupported("moving directories"))
    }

    /// Removes the directory marker. With `recursive` set, every entry under
    /// the directory is removed in the same commit.
    fn delete_directory(&self, path: &str, recursive: bool) -> Result<()> {
        trace!("delete_directory({:?}, recursive={})", path, recursive);
        let name = normalize_directory_name(path);
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "cannot delete the root directory".to_string(),
            ));
        }

        let mut handle = self.lock();
        let children: Vec<String> = if recursive {
            handle
                .entries()
                .iter()
                .filter(|entry| is_descendant_of(&entry.name, &name))
                .map(|entry| entry.name.clone())
                .collect()
        } else {
            Vec::new()
        };

        let mut update = handle.begin_update();
        let mut removed = usize::from(update.delete(&name));
        for child in &children {
            removed += usize::from(update.delete(child));
        }
        update.commit()?;

        debug!("delete_directory: removed {} entries for {:?}", removed, name);
        Ok(())
    }

    fn list_directory(&self, path: &str, options: &ListingOptions) -> Result<Vec<ZipLinkInfo>> {
        trace!("list_directory({:?}, {:?})", path, options);
        let prefix = normalize_directory_name(path);

        let handle = self.lock();
        let links: Vec<ZipLinkInfo> = if options.recursive {
            handle
                .entries()
                .iter()
                .filter(|entry| is_descendant_of(&entry.name, &prefix))
                .map(|entry| self.link_for(entry))
                .collect()
        } else {
            let mut seen = HashSet::new();
            handle
                .entries()
                .iter()
                .filter_map(|entry| immediate_child(&entry.name, &prefix))
                .filter(|child| seen.insert(*child))
                .map(|child| match handle.entry(child) {
                    Some(entry) => self.link_for(entry),
                    None => ZipLinkInfo::implicit_directory(
                        &self.handle,
                        child,
                        self.config.hash_algorithm,
                    ),
                })
                .collect()
        };

        debug!("list_directory: returning {} entries", links.len());
        Ok(links)
    }

    fn update_metadata(&self, path: &str, metadata: &LinkMetadata) -> Result<ZipLinkInfo> {
        trace!("update_metadata({:?}, {:?})", path, metadata);
        Err(Error::Unsupported("updating entry metadata"))
    }
}

/// Lock the container handle, recovering from poisoning.
///
/// The entry table is only ever replaced whole by a commit. A handle left
/// stale by a failed reload is reloaded before it is handed out.
pub(crate) fn lock_handle(handle: &Mutex<ArchiveHandle>) -> MutexGuard<'_, ArchiveHandle> {
    let mut guard = handle.lock().unwrap_or_else(PoisonError::into_inner);
    if guard.is_stale() {
        if let Err(err) = guard.reload() {
            warn!("container {:?} is still unreadable: {}", guard.path(), err);
        }
    }
    guard
}

pub(crate) fn map_archive_error(err: zipfs_archive::Error) -> Error {
    match err {
        zipfs_archive::Error::EntryNotFound(name) => Error::NotFound(name),
        zipfs_archive::Error::InvalidName(name) => Error::InvalidArgument(name),
        err => Error::Archive(err),
    }
}
