//! Materializing entries on disk, including archives read from real files.

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

use zipstream::zip::Checksum;
use zipstream::{
    CompressionMethod, Entry, EntryKind, ExtractError, LocalFileReader, ProgressCounter,
    ZipExtractor,
};

/// Append a local file header plus payload and return the header offset.
fn push_member(archive: &mut Vec<u8>, name: &str, method: u16, data: &[u8]) -> u64 {
    let payload = if method == 8 {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    } else {
        data.to_vec()
    };

    let offset = archive.len() as u64;
    archive.extend_from_slice(b"PK\x03\x04");
    archive.write_u16::<LittleEndian>(20).unwrap();
    archive.write_u16::<LittleEndian>(0).unwrap();
    archive.write_u16::<LittleEndian>(method).unwrap();
    archive.write_u16::<LittleEndian>(0).unwrap();
    archive.write_u16::<LittleEndian>(0x5821).unwrap();
    archive
        .write_u32::<LittleEndian>(Checksum::new().fold(data).value())
        .unwrap();
    archive.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
    archive.write_u32::<LittleEndian>(data.len() as u32).unwrap();
    archive.write_u16::<LittleEndian>(name.len() as u16).unwrap();
    archive.write_u16::<LittleEndian>(0).unwrap();
    archive.extend_from_slice(name.as_bytes());
    archive.extend_from_slice(&payload);
    offset
}

fn write_archive(dir: &Path, archive: &[u8]) -> LocalFileReader {
    let path = dir.join("test.zip");
    fs::write(&path, archive).unwrap();
    LocalFileReader::new(&path).unwrap()
}

#[test]
fn extracts_members_located_by_local_header() {
    let tmp = TempDir::new().unwrap();
    let text = "All work and no play makes Jack a dull boy.\n".repeat(500);

    let mut archive = Vec::new();
    let stored = push_member(&mut archive, "docs/readme.txt", 0, b"hello zip\n");
    let deflated = push_member(&mut archive, "docs/jack.txt", 8, text.as_bytes());
    let directory = push_member(&mut archive, "docs/empty/", 0, b"");

    let extractor = ZipExtractor::new(write_archive(tmp.path(), &archive));
    let out = tmp.path().join("out");

    for offset in [stored, deflated, directory] {
        let header = extractor.local_header(offset).unwrap();
        let entry = header.to_entry();
        let mut progress = ProgressCounter::new();
        let crc = extractor
            .extract_to_path(&entry, &out.join(&entry.path), Some(&mut progress))
            .unwrap();
        entry.verify_crc32(crc).unwrap();
        assert!(progress.is_finished());
    }

    assert_eq!(fs::read(out.join("docs/readme.txt")).unwrap(), b"hello zip\n");
    assert_eq!(fs::read_to_string(out.join("docs/jack.txt")).unwrap(), text);
    assert!(out.join("docs/empty").is_dir());
}

#[test]
fn existing_file_is_left_untouched() {
    let tmp = TempDir::new().unwrap();
    let mut archive = Vec::new();
    let offset = push_member(&mut archive, "a.txt", 0, b"new contents");
    let extractor = ZipExtractor::new(archive);
    let entry = extractor.local_header(offset).unwrap().to_entry();

    let dest = tmp.path().join("a.txt");
    fs::write(&dest, b"old contents").unwrap();

    let err = extractor.extract_to_path(&entry, &dest, None).unwrap_err();
    assert!(matches!(err, ExtractError::DestinationExists { .. }));
    assert_eq!(fs::read(&dest).unwrap(), b"old contents");
}

#[test]
fn directory_entry_creates_missing_parents() {
    let tmp = TempDir::new().unwrap();
    let extractor = ZipExtractor::new(Vec::new());
    let entry = Entry::directory("a/b/c/", 0);
    let dest = tmp.path().join("a/b/c");

    let mut progress = ProgressCounter::new();
    extractor
        .extract_to_path(&entry, &dest, Some(&mut progress))
        .unwrap();
    assert!(dest.is_dir());
    assert_eq!(fs::read_dir(&dest).unwrap().count(), 0);
    assert_eq!(progress, ProgressCounter { total: 1, completed: 1 });
}

#[test]
fn failed_file_extraction_removes_partial_output() {
    let tmp = TempDir::new().unwrap();
    let data = vec![42u8; 4096];
    let mut archive = Vec::new();
    let offset = push_member(&mut archive, "partial.bin", 0, &data);
    // Lose the last kilobyte of the payload.
    archive.truncate(archive.len() - 1024);

    let extractor = ZipExtractor::new(archive);
    let entry = extractor.local_header(offset).unwrap().to_entry();
    let dest = tmp.path().join("partial.bin");

    let err = extractor.extract_to_path(&entry, &dest, None).unwrap_err();
    assert!(matches!(err, ExtractError::Truncated { .. }));
    assert!(!dest.exists());
}

#[test]
fn unsupported_method_creates_nothing() {
    let tmp = TempDir::new().unwrap();
    let extractor = ZipExtractor::new(vec![0u8; 64]);
    let entry = Entry::file("x.lzma", CompressionMethod::Unknown(14), 64, 64, 0);
    let dest = tmp.path().join("x.lzma");

    let err = extractor.extract_to_path(&entry, &dest, None).unwrap_err();
    assert!(matches!(err, ExtractError::UnsupportedCompression { .. }));
    assert!(!dest.exists());
}

#[cfg(unix)]
mod symlinks {
    use super::*;

    fn link_archive(target: &str) -> (ZipExtractor<Vec<u8>>, Entry) {
        let mut archive = b"leading bytes".to_vec();
        let offset = archive.len() as u64;
        archive.extend_from_slice(target.as_bytes());
        let entry = Entry::symlink("nested/link", target.len() as u64, offset)
            .with_external_attributes(0o120777 << 16);
        (ZipExtractor::new(archive), entry)
    }

    #[test]
    fn symlink_points_at_stored_target() {
        let tmp = TempDir::new().unwrap();
        let (extractor, entry) = link_archive("../shared/target.txt");
        let dest = tmp.path().join("nested/link");

        let mut progress = ProgressCounter::new();
        extractor
            .extract_to_path(&entry, &dest, Some(&mut progress))
            .unwrap();

        assert!(fs::symlink_metadata(&dest).unwrap().file_type().is_symlink());
        assert_eq!(
            fs::read_link(&dest).unwrap(),
            Path::new("../shared/target.txt")
        );
        assert_eq!(entry.kind, EntryKind::Symlink);
        assert_eq!(progress, ProgressCounter { total: 1, completed: 1 });
    }

    #[test]
    fn symlink_refuses_existing_destination() {
        let tmp = TempDir::new().unwrap();
        let (extractor, entry) = link_archive("elsewhere");
        let dest = tmp.path().join("taken");
        fs::write(&dest, b"mine").unwrap();

        let err = extractor.extract_to_path(&entry, &dest, None).unwrap_err();
        assert!(matches!(err, ExtractError::DestinationExists { .. }));
        assert_eq!(fs::read(&dest).unwrap(), b"mine");
    }

    #[test]
    fn non_utf8_target_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut archive = vec![0xC3, 0x28];
        archive.extend_from_slice(b"pad");
        let entry = Entry::symlink("bad", 2, 0);
        let extractor = ZipExtractor::new(archive);

        let err = extractor
            .extract_to_path(&entry, &tmp.path().join("bad"), None)
            .unwrap_err();
        assert!(matches!(err, ExtractError::InvalidSymlinkTarget { .. }));
    }
}
