use crate::entry::{zip_time_now, SEPARATOR};
use crate::handle::ArchiveHandle;
use crate::{Error, Result};
use log::{debug, trace, warn};
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const ZIP32_LIMIT: u64 = 0xFFFF_FFFF;

#[derive(Debug)]
enum StagedChange {
    File { name: String, content: File },
    Directory { name: String },
}

impl StagedChange {
    fn name(&self) -> &str {
        match self {
            StagedChange::File { name, .. } | StagedChange::Directory { name } => name,
        }
    }
}

/// A pending update transaction on an [`ArchiveHandle`].
///
/// Changes are staged in memory (file content is spooled to an anonymous
/// temp file) and applied in one container rewrite by [`commit`]. Dropping
/// the transaction without committing leaves the container untouched.
///
/// [`commit`]: ArchiveUpdate::commit
#[derive(Debug)]
pub struct ArchiveUpdate<'a> {
    handle: &'a mut ArchiveHandle,
    removed: HashSet<String>,
    staged: Vec<StagedChange>,
}

impl<'a> ArchiveUpdate<'a> {
    pub(crate) fn new(handle: &'a mut ArchiveHandle) -> Self {
        Self {
            handle,
            removed: HashSet::new(),
            staged: Vec::new(),
        }
    }

    /// Stage a file entry, replacing any entry with the same name.
    ///
    /// The content is copied out of `content` immediately; the entry is
    /// written without compression on commit.
    pub fn add_file<R: Read + ?Sized>(&mut self, name: &str, content: &mut R) -> Result<u64> {
        validate_name(name)?;
        let mut spool = tempfile::tempfile()?;
        let written = io::copy(content, &mut spool)?;
        trace!("add_file({:?}) staged {} bytes", name, written);

        self.replace(name);
        self.staged.push(StagedChange::File {
            name: name.to_string(),
            content: spool,
        });
        Ok(written)
    }

    /// Stage a directory marker entry.
    pub fn add_directory(&mut self, name: &str) -> Result<()> {
        validate_name(name)?;
        let name = if name.ends_with(SEPARATOR) {
            name.to_string()
        } else {
            format!("{}{}", name, SEPARATOR)
        };
        trace!("add_directory({:?})", name);

        self.replace(&name);
        self.staged.push(StagedChange::Directory { name });
        Ok(())
    }

    /// Stage removal of the entry with exactly this name.
    ///
    /// Returns whether an entry was removed. Removing an absent name is not
    /// an error.
    pub fn delete(&mut self, name: &str) -> bool {
        trace!("delete({:?})", name);
        let staged_before = self.staged.len();
        self.staged.retain(|change| change.name() != name);
        let dropped_staged = self.staged.len() != staged_before;

        let dropped_existing =
            self.handle.entry(name).is_some() && self.removed.insert(name.to_string());

        dropped_staged || dropped_existing
    }

    /// Check whether the transaction would change the container.
    pub fn has_changes(&self) -> bool {
        !self.removed.is_empty() || !self.staged.is_empty()
    }

    /// Apply every staged change by rewriting the container.
    pub fn commit(self) -> Result<()> {
        let ArchiveUpdate {
            handle,
            removed,
            mut staged,
        } = self;

        if handle.is_stale() {
            return Err(Error::StaleHandle(handle.path().to_path_buf()));
        }

        if removed.is_empty() && staged.is_empty() {
            debug!("commit: nothing staged for {:?}", handle.path());
            return Ok(());
        }

        let path = handle.path().to_path_buf();
        let parent = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut temp = tempfile::Builder::new()
            .prefix(".tmp.zipfs-")
            .suffix(".zip")
            .tempfile_in(parent)?;

        write_updated_archive(
            temp.as_file_mut(),
            handle.archive_mut(),
            &removed,
            &mut staged,
        )?;

        if handle.options().sync_on_commit {
            temp.as_file_mut().sync_all()?;
        }

        persist_tempfile(temp, &path)?;
        if let Err(err) = handle.reload() {
            warn!("commit: {:?} was replaced but failed to reload: {}", path, err);
            return Err(err);
        }

        debug!(
            "commit: removed {}, added {}, container {:?} now has {} entries",
            removed.len(),
            staged.len(),
            path,
            handle.len()
        );
        Ok(())
    }

    fn replace(&mut self, name: &str) {
        self.staged.retain(|change| change.name() != name);
        if self.handle.entry(name).is_some() {
            self.removed.insert(name.to_string());
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "/" {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}

fn write_updated_archive<W: Write + Seek>(
    writer: &mut W,
    archive: &mut ZipArchive<File>,
    removed: &HashSet<String>,
    staged: &mut [StagedChange],
) -> Result<()> {
    let mut zip = ZipWriter::new(writer);

    for i in 0..archive.len() {
        let file = archive.by_index_raw(i)?;
        if removed.contains(file.name()) {
            continue;
        }
        zip.raw_copy_file(file)?;
    }

    let options: FileOptions<()> = FileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(zip_time_now());

    for change in staged.iter_mut() {
        match change {
            StagedChange::File { name, content } => {
                let len = content.seek(SeekFrom::End(0))?;
                content.seek(SeekFrom::Start(0))?;
                zip.start_file(name.as_str(), options.large_file(len >= ZIP32_LIMIT))?;
                io::copy(content, &mut zip)?;
            }
            StagedChange::Directory { name } => {
                zip.add_directory(name.as_str(), options)?;
            }
        }
    }

    zip.finish()?;
    Ok(())
}

fn persist_tempfile(temp: NamedTempFile, final_path: &Path) -> Result<()> {
    temp.persist(final_path)
        .map(|_| ())
        .map_err(|err| Error::IoError(err.error))
}
