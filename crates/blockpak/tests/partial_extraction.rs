#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Range reads across compression chunk boundaries

mod common;

use blockpak::{
    ArchiveError, ArchiveReader, ArchiveReaderFileSettings, ArchiveReaderSettings, ArchiveWriter,
    ArchiveWriterFileSettings, ArchiveWriterSettings, COMPRESSION_CHUNK_SIZE,
    CompressionAlgorithm,
};
use common::{CountingCodec, counting_registry, noise};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::io::Cursor;
use std::sync::{Arc, LazyLock};

const CHUNK: usize = COMPRESSION_CHUNK_SIZE as usize;
const MARKER: &[u8] = b"CROSS-CHUNK";
const MARKER_START: usize = CHUNK - 5;

/// Three full chunks plus a short tail, with a marker straddling the first boundary
fn chunked_data() -> Vec<u8> {
    let mut data = noise(3 * CHUNK + 1000, 11);
    data[MARKER_START..MARKER_START + MARKER.len()].copy_from_slice(MARKER);
    data
}

struct Fixture {
    reader: ArchiveReader<Cursor<Vec<u8>>>,
    codec: Arc<CountingCodec>,
    data: Vec<u8>,
}

fn fixture() -> Fixture {
    common::init_tracing();

    let (registry, codec) = counting_registry();
    let data = chunked_data();

    let mut writer = ArchiveWriter::create(
        Cursor::new(Vec::new()),
        ArchiveWriterSettings::default().with_registry(Arc::clone(&registry)),
    )
    .unwrap();
    writer
        .add_file_to_archive(
            &data,
            &ArchiveWriterFileSettings::new("chunked.bin")
                .with_compression(CountingCodec::algorithm()),
        )
        .unwrap();
    let bytes = writer.finish().unwrap().into_inner();
    assert_eq!(codec.compressions(), 4);
    codec.reset();

    let reader = ArchiveReader::new(
        Cursor::new(bytes),
        ArchiveReaderSettings::default().with_registry(registry),
    );
    assert!(reader.is_mounted());

    Fixture {
        reader,
        codec,
        data,
    }
}

fn extract(fixture: &Fixture, settings: &ArchiveReaderFileSettings) -> (Vec<u8>, Option<u32>) {
    let mut out = vec![0u8; fixture.data.len()];
    let result = fixture
        .reader
        .extract_file_from_archive(&mut out, settings)
        .unwrap()
        .unwrap();
    (result.file_span.to_vec(), result.crc32)
}

// --- Decompressed ranges ---

#[test]
fn marker_across_one_boundary_touches_two_chunks() {
    let fixture = fixture();
    let settings = ArchiveReaderFileSettings::new("chunked.bin")
        .with_range(MARKER_START as u64, MARKER.len() as u64);

    let (bytes, crc32) = extract(&fixture, &settings);
    assert_eq!(bytes, MARKER);
    assert_eq!(crc32, None);
    assert_eq!(fixture.codec.decompressions(), 2);
}

#[test]
fn range_spanning_three_chunks() {
    // Last byte of chunk 0, all of chunk 1, first byte of chunk 2
    let fixture = fixture();
    let start = CHUNK - 1;
    let len = CHUNK + 2;
    let settings =
        ArchiveReaderFileSettings::new("chunked.bin").with_range(start as u64, len as u64);

    let (bytes, _) = extract(&fixture, &settings);
    assert_eq!(bytes.len(), len);
    assert!(bytes == fixture.data[start..start + len]);
    assert_eq!(fixture.codec.decompressions(), 3);
}

#[test]
fn range_inside_short_final_chunk() {
    let fixture = fixture();
    let start = 3 * CHUNK + 10;
    let settings = ArchiveReaderFileSettings::new("chunked.bin").with_range(start as u64, 100);

    let (bytes, _) = extract(&fixture, &settings);
    assert_eq!(bytes, fixture.data[start..start + 100].to_vec());
    assert_eq!(fixture.codec.decompressions(), 1);
}

#[test]
fn whole_file_reports_checksum() {
    let fixture = fixture();
    let (bytes, crc32) = extract(&fixture, &ArchiveReaderFileSettings::new("chunked.bin"));

    assert!(bytes == fixture.data);
    assert_eq!(crc32, Some(crc32fast::hash(&fixture.data)));
    assert_eq!(fixture.codec.decompressions(), 4);
}

#[test]
fn request_past_end_is_clamped() {
    let fixture = fixture();
    let start = fixture.data.len() - 7;
    let settings = ArchiveReaderFileSettings::new("chunked.bin").with_range(start as u64, 4096);

    let (bytes, crc32) = extract(&fixture, &settings);
    assert_eq!(bytes, fixture.data[start..].to_vec());
    assert_eq!(crc32, None);
}

#[test]
fn buffer_smaller_than_range_fails_without_decompressing() {
    let fixture = fixture();
    let mut out = vec![0u8; 10];
    let err = fixture
        .reader
        .extract_file_from_archive(
            &mut out,
            &ArchiveReaderFileSettings::new("chunked.bin").with_range(0, 11),
        )
        .unwrap_err();

    assert!(matches!(err, ArchiveError::BufferTooSmall { required: 11, available: 10 }));
    assert_eq!(fixture.codec.decompressions(), 0);
    assert!(fixture.reader.is_mounted());
}

#[test]
fn buffer_must_hold_request_even_past_end() {
    let fixture = fixture();
    let start = fixture.data.len() - 7;
    let mut out = vec![0u8; 64];
    let err = fixture
        .reader
        .extract_file_from_archive(
            &mut out,
            &ArchiveReaderFileSettings::new("chunked.bin").with_range(start as u64, 100),
        )
        .unwrap_err();

    assert!(matches!(err, ArchiveError::BufferTooSmall { required: 100, available: 64 }));
    assert_eq!(fixture.codec.decompressions(), 0);
}

// --- Raw reads ---

#[test]
fn raw_reads_skip_the_codec() {
    let fixture = fixture();
    let listing = fixture.reader.list_file_in_archive("chunked.bin").unwrap();

    let (raw, crc32) = extract(&fixture, &ArchiveReaderFileSettings::new("chunked.bin").raw());
    assert_eq!(raw.len() as u64, listing.compressed_size);
    assert_eq!(crc32, None);

    let (slice, _) = extract(
        &fixture,
        &ArchiveReaderFileSettings::new("chunked.bin")
            .with_range(100, 50)
            .raw(),
    );
    assert_eq!(slice, raw[100..150].to_vec());
    assert_eq!(fixture.codec.decompressions(), 0);
}

#[test]
fn corrupt_chunk_is_reported_and_reader_survives() {
    let (registry, _codec) = counting_registry();
    let data = chunked_data();
    let mut writer = ArchiveWriter::create(
        Cursor::new(Vec::new()),
        ArchiveWriterSettings::default().with_registry(Arc::clone(&registry)),
    )
    .unwrap();
    let added = writer
        .add_file_to_archive(
            &data,
            &ArchiveWriterFileSettings::new("chunked.bin")
                .with_compression(CountingCodec::algorithm()),
        )
        .unwrap();
    writer
        .add_file_to_archive(b"intact", &ArchiveWriterFileSettings::new("intact.txt"))
        .unwrap();
    let mut bytes = writer.finish().unwrap().into_inner();

    // Damage the middle of the stored data, well inside the first chunk
    let target = (added.offset + 4096) as usize;
    for byte in &mut bytes[target..target + 64] {
        *byte = !*byte;
    }

    let reader = ArchiveReader::new(
        Cursor::new(bytes),
        ArchiveReaderSettings::default().with_registry(registry),
    );
    assert!(reader.is_mounted());

    let mut out = vec![0u8; data.len()];
    let err = reader
        .extract_file_from_archive(&mut out, &ArchiveReaderFileSettings::new("chunked.bin"))
        .unwrap_err();
    assert!(err.is_corruption(), "{err}");

    // Untouched chunks still decode
    let tail_start = 3 * CHUNK;
    let tail = reader
        .extract_file_from_archive(
            &mut out,
            &ArchiveReaderFileSettings::new("chunked.bin").with_start_offset(tail_start as u64),
        )
        .unwrap()
        .unwrap();
    assert!(tail.file_span == &data[tail_start..]);

    assert_eq!(reader.verify_file("intact.txt").unwrap(), Some(crc32fast::hash(b"intact")));
}

// --- Property tests ---

struct SharedArchive {
    bytes: Vec<u8>,
    data: Vec<u8>,
}

static SHARED: LazyLock<SharedArchive> = LazyLock::new(|| {
    let data = noise(2 * CHUNK + 4321, 29);
    let mut writer =
        ArchiveWriter::create(Cursor::new(Vec::new()), ArchiveWriterSettings::default()).unwrap();
    writer
        .add_file_to_archive(
            &data,
            &ArchiveWriterFileSettings::new("shared.bin").with_compression(CompressionAlgorithm::LZ4),
        )
        .unwrap();
    SharedArchive {
        bytes: writer.finish().unwrap().into_inner(),
        data,
    }
});

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn any_range_matches_source(start_fraction in 0.0f64..1.0, len in 0usize..(CHUNK + 4096)) {
        let shared = &*SHARED;
        let reader = ArchiveReader::new(Cursor::new(shared.bytes.clone()), ArchiveReaderSettings::default());

        let start = (start_fraction * shared.data.len() as f64) as usize;
        let end = (start + len).min(shared.data.len());
        let mut out = vec![0u8; len];
        let result = reader
            .extract_file_from_archive(
                &mut out,
                &ArchiveReaderFileSettings::new("shared.bin").with_range(start as u64, len as u64),
            )
            .unwrap()
            .unwrap();

        prop_assert_eq!(result.file_span, &shared.data[start..end]);
    }
}
