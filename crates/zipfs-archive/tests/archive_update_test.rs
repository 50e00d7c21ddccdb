use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::{write::FileOptions, ZipWriter};
use zipfs_archive::{ArchiveHandle, CompressionMethod, Error};

fn create_test_container(temp_dir: &Path) -> PathBuf {
    let path = temp_dir.join("fixture.zip");
    let file = File::create(&path).unwrap();
    let mut zip = ZipWriter::new(file);

    let stored: FileOptions<()> =
        FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let deflated: FileOptions<()> =
        FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.add_directory("docs/", stored).unwrap();
    zip.start_file("docs/notes.txt", stored).unwrap();
    zip.write_all(b"first notes").unwrap();
    zip.start_file("docs/big.log", deflated).unwrap();
    zip.write_all("line\n".repeat(500).as_bytes()).unwrap();

    zip.finish().unwrap();
    path
}

fn read_entry(handle: &mut ArchiveHandle, name: &str) -> String {
    let mut text = String::new();
    handle
        .open_entry(name)
        .unwrap()
        .read_to_string(&mut text)
        .unwrap();
    text
}

struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "source went away"))
    }
}

#[test]
fn commit_replaces_existing_entry_and_keeps_others() {
    let _ = env_logger::builder().is_test(true).try_init();
    let temp_dir = TempDir::new().unwrap();
    let path = create_test_container(temp_dir.path());

    let mut handle = ArchiveHandle::open(&path).unwrap();
    let mut update = handle.begin_update();
    update
        .add_file("docs/notes.txt", &mut "second notes".as_bytes())
        .unwrap();
    update.commit().unwrap();

    assert_eq!(handle.len(), 3);
    assert_eq!(read_entry(&mut handle, "docs/notes.txt"), "second notes");
    assert_eq!(read_entry(&mut handle, "docs/big.log"), "line\n".repeat(500));

    let big = handle.entry("docs/big.log").unwrap();
    assert_eq!(big.compression, CompressionMethod::Deflated);
    let notes = handle.entry("docs/notes.txt").unwrap();
    assert_eq!(notes.compression, CompressionMethod::Stored);
    assert_eq!(notes.size, 12);
    assert!(notes.modified.is_some());
}

#[test]
fn committed_changes_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("persist.zip");

    {
        let mut handle = ArchiveHandle::open(&path).unwrap();
        let mut update = handle.begin_update();
        update.add_directory("a").unwrap();
        update.add_file("a/b.txt", &mut "hello".as_bytes()).unwrap();
        update.commit().unwrap();
    }

    let mut reopened = ArchiveHandle::open(&path).unwrap();
    let names: Vec<_> = reopened.entries().iter().map(|e| e.name.clone()).collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"a/".to_string()));
    assert!(names.contains(&"a/b.txt".to_string()));
    assert_eq!(read_entry(&mut reopened, "a/b.txt"), "hello");
}

#[test]
fn dropped_update_leaves_container_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_test_container(temp_dir.path());
    let before = std::fs::read(&path).unwrap();

    let mut handle = ArchiveHandle::open(&path).unwrap();
    {
        let mut update = handle.begin_update();
        update.delete("docs/notes.txt");
        update.add_file("new.txt", &mut "x".as_bytes()).unwrap();
    }

    assert_eq!(std::fs::read(&path).unwrap(), before);
    assert!(handle.entry("docs/notes.txt").is_some());
    assert!(handle.entry("new.txt").is_none());
}

#[test]
fn failing_source_aborts_before_commit() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_test_container(temp_dir.path());
    let before = std::fs::read(&path).unwrap();

    let mut handle = ArchiveHandle::open(&path).unwrap();
    let mut update = handle.begin_update();
    let err = update
        .add_file("docs/notes.txt", &mut FailingReader)
        .unwrap_err();
    assert!(matches!(err, Error::IoError(ref e) if e.kind() == io::ErrorKind::BrokenPipe));
    drop(update);

    assert_eq!(std::fs::read(&path).unwrap(), before);
    assert_eq!(read_entry(&mut handle, "docs/notes.txt"), "first notes");
}

#[test]
fn delete_removes_only_exact_name() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_test_container(temp_dir.path());

    let mut handle = ArchiveHandle::open(&path).unwrap();
    let mut update = handle.begin_update();
    assert!(update.delete("docs/"));
    update.commit().unwrap();

    assert!(handle.entry("docs/").is_none());
    assert!(handle.entry("docs/notes.txt").is_some());
    assert!(handle.entry("docs/big.log").is_some());
}

#[test]
fn no_temp_files_left_after_commit() {
    let temp_dir = TempDir::new().unwrap();
    let path = create_test_container(temp_dir.path());

    let mut handle = ArchiveHandle::open(&path).unwrap();
    let mut update = handle.begin_update();
    update.add_file("extra.bin", &mut &[0u8; 32][..]).unwrap();
    update.commit().unwrap();

    let leftovers: Vec<_> = std::fs::read_dir(temp_dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .filter(|name| name.starts_with(".tmp.zipfs-"))
        .collect();
    assert!(leftovers.is_empty(), "leftover temp files: {:?}", leftovers);
}
