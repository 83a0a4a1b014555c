#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Streams that must not mount

mod common;

use blockpak::{
    ArchiveReader, ArchiveReaderError, ArchiveReaderSettings, ArchiveWriter,
    ArchiveWriterFileSettings, ArchiveWriterSettings, CodecRegistry, CompressionAlgorithm,
};
use common::build_archive;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::io::Cursor;
use std::sync::Arc;

/// Reader settings whose callback records every failure message
fn recording_settings() -> (ArchiveReaderSettings, Arc<Mutex<Vec<String>>>) {
    let failures = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&failures);
    let settings = ArchiveReaderSettings::default()
        .with_error_callback(move |e| sink.lock().push(e.to_string()));
    (settings, failures)
}

fn valid_archive() -> Vec<u8> {
    build_archive(
        ArchiveWriterSettings::default(),
        &[
            ("foo.txt", b"Hello World".as_slice(), CompressionAlgorithm::Uncompressed),
            ("bar.bin", b"barbarbarbarbar".as_slice(), CompressionAlgorithm::LZ4),
        ],
    )
}

fn toc_offset(bytes: &[u8]) -> usize {
    u64::from_le_bytes(bytes[20..28].try_into().unwrap()) as usize
}

fn mount_error(bytes: Vec<u8>, settings: ArchiveReaderSettings) -> ArchiveReaderError {
    let mut reader = ArchiveReader::unmounted(settings);
    let err = reader.try_mount(Cursor::new(bytes)).unwrap_err();
    assert!(!reader.is_mounted());
    err
}

// --- Callback contract ---

#[test]
fn empty_stream_invokes_callback_once() {
    let (settings, failures) = recording_settings();
    let reader = ArchiveReader::new(Cursor::new(Vec::new()), settings);

    assert!(!reader.is_mounted());
    assert_eq!(*failures.lock(), vec!["archive stream is empty".to_string()]);
}

#[test]
fn failed_reader_can_mount_another_stream() {
    let (settings, failures) = recording_settings();
    let mut reader = ArchiveReader::new(Cursor::new(vec![0x5A; 700]), settings);
    assert!(!reader.is_mounted());

    assert!(reader.mount_archive(Cursor::new(valid_archive())));
    assert!(reader.is_mounted());
    assert!(reader.contains_file("foo.txt"));
    assert_eq!(failures.lock().len(), 1);
}

#[test]
fn lookup_miss_does_not_invoke_callback() {
    let (settings, failures) = recording_settings();
    let reader = ArchiveReader::new(Cursor::new(valid_archive()), settings);
    assert!(reader.is_mounted());

    let mut out = [0u8; 16];
    assert!(reader.list_file_in_archive("nope").is_none());
    assert!(
        reader
            .extract_file_from_archive(
                &mut out,
                &blockpak::ArchiveReaderFileSettings::new("nope")
            )
            .unwrap()
            .is_none()
    );
    assert!(failures.lock().is_empty());
}

#[test]
fn remount_failure_unmounts_previous_archive() {
    let (settings, failures) = recording_settings();
    let mut reader = ArchiveReader::new(Cursor::new(valid_archive()), settings);
    assert!(reader.is_mounted());

    assert!(!reader.mount_archive(Cursor::new(Vec::new())));
    assert!(!reader.is_mounted());
    assert_eq!(reader.file_count(), 0);
    assert_eq!(failures.lock().len(), 1);
}

// --- Structural failures ---

#[test]
fn short_stream() {
    let err = mount_error(vec![0u8; 100], ArchiveReaderSettings::default());
    assert!(matches!(err, ArchiveReaderError::StreamTooShort { len: 100, required: 512 }));
}

#[test]
fn uncommitted_writer_output() {
    let mut cursor = Cursor::new(Vec::new());
    let mut writer = ArchiveWriter::create(&mut cursor, ArchiveWriterSettings::default()).unwrap();
    writer
        .add_file_to_archive(b"pending", &ArchiveWriterFileSettings::new("pending.txt"))
        .unwrap();
    drop(writer);

    let err = mount_error(cursor.into_inner(), ArchiveReaderSettings::default());
    assert!(matches!(err, ArchiveReaderError::NotCommitted));
}

#[test]
fn unsupported_version() {
    let mut bytes = valid_archive();
    bytes[4..8].copy_from_slice(&9u32.to_le_bytes());
    let err = mount_error(bytes, ArchiveReaderSettings::default());
    assert!(matches!(err, ArchiveReaderError::UnsupportedVersion(9)));
}

#[test]
fn corrupt_table_of_contents() {
    let mut bytes = valid_archive();
    let toc = toc_offset(&bytes);
    bytes[toc + 12] ^= 0x40;

    let err = mount_error(bytes, ArchiveReaderSettings::default());
    assert!(matches!(err, ArchiveReaderError::TocChecksumMismatch { .. }));
}

#[test]
fn truncated_table_of_contents() {
    let mut bytes = valid_archive();
    let toc = toc_offset(&bytes);
    bytes.truncate(toc + 4);

    let err = mount_error(bytes, ArchiveReaderSettings::default());
    assert!(matches!(err, ArchiveReaderError::InvalidTocLocation { .. }));
}

#[test]
fn table_of_contents_codec_not_registered() {
    let bytes = build_archive(
        ArchiveWriterSettings::default().with_toc_compression(CompressionAlgorithm::ZLIB),
        &[("foo.txt", b"Hello World".as_slice(), CompressionAlgorithm::Uncompressed)],
    );

    let settings = ArchiveReaderSettings::default().with_registry(Arc::new(CodecRegistry::new()));
    let err = mount_error(bytes, settings);
    assert!(matches!(err, ArchiveReaderError::Codec(_)));
}

// --- Property tests ---

proptest! {
    #[test]
    fn random_bytes_never_mount(bytes in prop::collection::vec(any::<u8>(), 0..4096)) {
        let (settings, failures) = recording_settings();
        let reader = ArchiveReader::new(Cursor::new(bytes), settings);

        prop_assert!(!reader.is_mounted());
        prop_assert_eq!(failures.lock().len(), 1);
    }
}
