use crate::entry::{naive_from_zip, ArchiveEntry, EntryReader};
use crate::update::ArchiveUpdate;
use crate::{Error, Result};
use log::debug;
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use zip::{ZipArchive, ZipWriter};

/// Options controlling how a container is opened and rewritten.
#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    /// Create an empty container when the path does not exist.
    pub create_if_missing: bool,
    /// Flush the rewritten container to disk before it replaces the old one.
    pub sync_on_commit: bool,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            sync_on_commit: true,
        }
    }
}

/// An open zip container together with its entry table.
///
/// The handle is the only owner of the container file. Structural changes
/// go through [`ArchiveHandle::begin_update`], which rewrites the whole
/// container on commit.
#[derive(Debug)]
pub struct ArchiveHandle {
    path: PathBuf,
    options: ArchiveOptions,
    archive: ZipArchive<File>,
    entries: Vec<ArchiveEntry>,
    stale: bool,
}

impl ArchiveHandle {
    /// Open a container, creating an empty one if it does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, ArchiveOptions::default())
    }

    /// Open a container with explicit options.
    pub fn open_with<P: AsRef<Path>>(path: P, options: ArchiveOptions) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() && options.create_if_missing {
            create_empty(path)?;
        }

        let archive = ZipArchive::new(File::open(path)?)?;
        let mut handle = Self {
            path: path.to_path_buf(),
            options,
            archive,
            entries: Vec::new(),
            stale: false,
        };
        handle.load_entries()?;
        debug!(
            "Opened container {:?} with {} entries",
            handle.path,
            handle.entries.len()
        );
        Ok(handle)
    }

    fn load_entries(&mut self) -> Result<()> {
        let mut entries = Vec::with_capacity(self.archive.len());
        for i in 0..self.archive.len() {
            let file = self.archive.by_index_raw(i)?;
            entries.push(ArchiveEntry {
                name: file.name().to_string(),
                is_dir: file.is_dir(),
                modified: file.last_modified().and_then(naive_from_zip),
                size: file.size(),
                compressed_size: file.compressed_size(),
                compression: file.compression(),
                data_start: file.data_start(),
            });
        }
        self.entries = entries;
        Ok(())
    }

    /// Reload the container from disk.
    ///
    /// The entry table is emptied first, so after a failed reload no entry
    /// offsets from the previous container remain and the handle stays
    /// stale until a later reload succeeds.
    pub fn reload(&mut self) -> Result<()> {
        self.stale = true;
        self.entries.clear();
        self.archive = ZipArchive::new(File::open(&self.path)?)?;
        self.load_entries()?;
        self.stale = false;
        Ok(())
    }

    /// Whether the last reload failed.
    ///
    /// A stale handle lists no entries and refuses to commit.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Get the path to the container file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn options(&self) -> &ArchiveOptions {
        &self.options
    }

    pub(crate) fn archive_mut(&mut self) -> &mut ZipArchive<File> {
        &mut self.archive
    }

    /// Get all entries in enumeration order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Find an entry by its exact name.
    pub fn entry(&self, name: &str) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Number of entries in the container.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the container has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Open a reader over the uncompressed content of an entry.
    pub fn open_entry(&mut self, name: &str) -> Result<EntryReader> {
        let entry = self
            .entry(name)
            .cloned()
            .ok_or_else(|| Error::EntryNotFound(name.to_string()))?;

        if entry.is_stored() {
            let mut file = File::open(&self.path)?;
            file.seek(SeekFrom::Start(entry.data_start))?;
            return Ok(EntryReader::Stored(file.take(entry.size)));
        }

        let mut file = self.archive.by_name(name)?;
        let mut data = Vec::with_capacity(usize::try_from(entry.size).unwrap_or(0));
        file.read_to_end(&mut data)?;
        Ok(EntryReader::Buffered(Cursor::new(data)))
    }

    /// Start an update transaction.
    ///
    /// Nothing is written until [`ArchiveUpdate::commit`] is called.
    pub fn begin_update(&mut self) -> ArchiveUpdate<'_> {
        ArchiveUpdate::new(self)
    }
}

fn create_empty(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    let zip = ZipWriter::new(file);
    zip.finish()?.sync_all()?;
    debug!("Created empty container {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use tempfile::tempdir;
    use zip::write::FileOptions;

    #[test]
    fn test_open_creates_missing_container() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("new.zip");

        let handle = ArchiveHandle::open(&path).unwrap();
        assert!(path.exists());
        assert!(handle.is_empty());
    }

    #[test]
    fn test_open_missing_without_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.zip");
        let options = ArchiveOptions {
            create_if_missing: false,
            ..Default::default()
        };

        let err = ArchiveHandle::open_with(&path, options).unwrap_err();
        assert!(matches!(err, Error::IoError(ref e) if e.kind() == io::ErrorKind::NotFound));
        assert!(!path.exists());
    }

    #[test]
    fn test_open_reads_existing_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("existing.zip");

        let file = File::create(&path).unwrap();
        let mut zip = ZipWriter::new(file);
        let stored: FileOptions<()> =
            FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        let deflated: FileOptions<()> =
            FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        zip.add_directory("docs/", stored).unwrap();
        zip.start_file("docs/plain.txt", stored).unwrap();
        zip.write_all(b"plain text").unwrap();
        zip.start_file("docs/packed.txt", deflated).unwrap();
        zip.write_all(&[b'z'; 4096]).unwrap();
        zip.finish().unwrap();

        let mut handle = ArchiveHandle::open(&path).unwrap();
        assert_eq!(handle.len(), 3);
        assert!(handle.entry("docs/").unwrap().is_dir);
        assert!(!handle.entry("docs/plain.txt").unwrap().is_dir);

        let mut plain = String::new();
        handle
            .open_entry("docs/plain.txt")
            .unwrap()
            .read_to_string(&mut plain)
            .unwrap();
        assert_eq!(plain, "plain text");

        let packed_entry = handle.entry("docs/packed.txt").unwrap();
        assert_eq!(packed_entry.size, 4096);
        assert!(packed_entry.compressed_size < packed_entry.size);
        assert!(!packed_entry.is_stored());
        let plain_entry = handle.entry("docs/plain.txt").unwrap();
        assert_eq!(plain_entry.compressed_size, plain_entry.size);

        let mut packed = Vec::new();
        let mut reader = handle.open_entry("docs/packed.txt").unwrap();
        assert!(matches!(reader, EntryReader::Buffered(_)));
        reader.read_to_end(&mut packed).unwrap();
        assert_eq!(packed, vec![b'z'; 4096]);
    }

    #[test]
    fn test_open_entry_missing() {
        let dir = tempdir().unwrap();
        let mut handle = ArchiveHandle::open(dir.path().join("empty.zip")).unwrap();

        let err = handle.open_entry("nope.txt").unwrap_err();
        assert!(matches!(err, Error::EntryNotFound(name) if name == "nope.txt"));
    }

    #[test]
    fn test_failed_reload_leaves_no_stale_offsets() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("swapped.zip");
        let mut handle = ArchiveHandle::open(&path).unwrap();
        let mut update = handle.begin_update();
        update.add_file("a.txt", &mut &b"first"[..]).unwrap();
        update.commit().unwrap();
        let healthy = std::fs::read(&path).unwrap();

        std::fs::write(&path, b"not a zip container").unwrap();
        assert!(handle.reload().is_err());
        assert!(handle.is_stale());
        assert!(handle.is_empty());
        assert!(matches!(
            handle.open_entry("a.txt").unwrap_err(),
            Error::EntryNotFound(_)
        ));

        let mut update = handle.begin_update();
        update.add_file("b.txt", &mut &b"second"[..]).unwrap();
        assert!(matches!(
            update.commit().unwrap_err(),
            Error::StaleHandle(stale) if stale == path
        ));

        std::fs::write(&path, healthy).unwrap();
        handle.reload().unwrap();
        assert!(!handle.is_stale());
        let mut content = String::new();
        handle
            .open_entry("a.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "first");
    }
}
