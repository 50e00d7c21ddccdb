use chrono::{NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::{self, Cursor, Read, Take};

/// Path separator used by zip entry names.
pub const SEPARATOR: char = '/';

/// Represents an entry within a zip container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Full entry name (e.g., "docs/readme.txt" or "docs/").
    pub name: String,
    /// Whether the entry is a directory marker.
    pub is_dir: bool,
    /// Last modification time recorded in the container, if any.
    pub modified: Option<NaiveDateTime>,
    /// Uncompressed size of the entry.
    pub size: u64,
    /// Size of the entry data as stored in the container.
    pub compressed_size: u64,
    /// Compression method used for this entry.
    pub compression: zip::CompressionMethod,
    /// Byte offset of the entry data within the container.
    pub data_start: u64,
}

impl ArchiveEntry {
    /// Whether the entry data can be read straight from the container file.
    pub fn is_stored(&self) -> bool {
        self.compression == zip::CompressionMethod::Stored
    }
}

/// Owned reader over the uncompressed content of one entry.
///
/// Stored entries are read directly from the container file; compressed
/// entries are inflated up front.
#[derive(Debug)]
pub enum EntryReader {
    Stored(Take<File>),
    Buffered(Cursor<Vec<u8>>),
}

impl Read for EntryReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            EntryReader::Stored(reader) => reader.read(buf),
            EntryReader::Buffered(reader) => reader.read(buf),
        }
    }
}

pub(crate) fn naive_from_zip(time: zip::DateTime) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(
        i32::from(time.year()),
        u32::from(time.month()),
        u32::from(time.day()),
    )?
    .and_hms_opt(
        u32::from(time.hour()),
        u32::from(time.minute()),
        u32::from(time.second()),
    )
}

pub(crate) fn zip_time_now() -> zip::DateTime {
    use chrono::{Datelike, Local, Timelike};

    let now = Local::now().naive_local();
    let year = u16::try_from(now.year()).unwrap_or(1980);
    zip::DateTime::from_date_and_time(
        year,
        now.month() as u8,
        now.day() as u8,
        now.hour() as u8,
        now.minute() as u8,
        now.second() as u8,
    )
    .unwrap_or_default()
}
