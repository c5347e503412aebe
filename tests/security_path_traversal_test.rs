//! Path traversal prevention tests
//!
//! Archives with hostile entry names must be rejected by `unpack_to` before
//! anything is written.

use std::fs;
use std::io::{Cursor, Write};
use tempfile::tempdir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;
use ziptree::{ArchiveError, ArchiveHandle};

/// Helper: Build an archive with raw entry names, bypassing ziptree's staging
fn hostile_archive(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in files {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[test]
fn test_path_traversal_dot_dot() {
    let bytes = hostile_archive(&[("safe.txt", b"ok"), ("../../evil.txt", b"malicious")]);
    let work = tempdir().unwrap();
    let dest = work.path().join("a").join("b");

    let mut zip = ArchiveHandle::from_buffer(&bytes).unwrap();
    let result = zip.unpack_to(&dest);

    assert!(matches!(result, Err(ArchiveError::UnsafePath(ref p)) if p == "../../evil.txt"));
    assert!(!work.path().join("evil.txt").exists());
    // Nothing is extracted, not even the safe entry
    assert!(!dest.join("safe.txt").exists());
}

#[test]
fn test_absolute_path_unix() {
    let bytes = hostile_archive(&[("/tmp/ziptree-evil.txt", b"data")]);
    let work = tempdir().unwrap();

    let mut zip = ArchiveHandle::from_buffer(&bytes).unwrap();
    let result = zip.unpack_to(work.path());

    assert!(matches!(result, Err(ArchiveError::UnsafePath(_))));
}

#[test]
fn test_backslash_traversal() {
    let bytes = hostile_archive(&[("dir\\..\\..\\evil.txt", b"data")]);
    let work = tempdir().unwrap();
    let dest = work.path().join("dest");

    let mut zip = ArchiveHandle::from_buffer(&bytes).unwrap();
    let result = zip.unpack_to(&dest);

    assert!(matches!(result, Err(ArchiveError::UnsafePath(_))));
    assert!(!work.path().join("evil.txt").exists());
}

#[test]
fn test_dot_segments_stay_inside() {
    let bytes = hostile_archive(&[("./docs/./readme.txt", b"inside")]);
    let work = tempdir().unwrap();

    let mut zip = ArchiveHandle::from_buffer(&bytes).unwrap();
    zip.unpack_to(work.path()).unwrap();

    assert_eq!(
        fs::read(work.path().join("docs").join("readme.txt")).unwrap(),
        b"inside"
    );
}

#[test]
fn test_staged_backslashes_are_normalized() {
    let work = tempdir().unwrap();
    let source = work.path().join("file.txt");
    fs::write(&source, b"content").unwrap();

    let mut zip = ArchiveHandle::in_memory();
    zip.create_directory("win\\style").unwrap();
    zip.add_file(&source, "win\\style\\file.txt").unwrap();

    let names: Vec<String> = zip.get_entries().unwrap().into_iter().map(|e| e.path).collect();
    assert_eq!(names, vec!["win/style/", "win/style/file.txt"]);
}
