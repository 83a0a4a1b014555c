//! Table of contents records and their stored encoding

use crate::entry::FileEntry;
use crate::error::{ArchiveError, ArchiveReaderError, ArchiveResult};
use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};
use blockpak_codec::{CodecRegistry, CompressionAlgorithm};
use std::borrow::Cow;
use tracing::debug;

use super::ArchiveHeader;

/// Upper bound accepted for a decompressed table of contents
const MAX_TOC_SIZE: u64 = 1 << 30;

/// Serialized table of contents
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[br(little, magic = b"BTOC")]
#[bw(little, magic = b"BTOC")]
pub(crate) struct TocTable {
    pub entry_count: u32,
    #[br(count = entry_count)]
    pub records: Vec<TocRecord>,
}

/// One file record as stored in the table of contents
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[br(little)]
#[bw(little)]
pub(crate) struct TocRecord {
    pub path_len: u16,
    #[br(count = path_len)]
    pub path: Vec<u8>,
    pub token: u64,
    pub algorithm: u32,
    pub uncompressed_size: u64,
    pub compressed_size: u64,
    pub offset: u64,
    pub crc32: u32,
    pub chunk_count: u32,
    #[br(count = chunk_count)]
    pub chunk_sizes: Vec<u32>,
}

/// Table of contents ready to be written
#[derive(Debug)]
pub(crate) struct EncodedToc {
    pub stored: Vec<u8>,
    pub uncompressed_size: u64,
    pub crc32: u32,
}

/// Serialize entries and compress the result as a single block
pub(crate) fn encode_toc(
    entries: &[FileEntry],
    algorithm: CompressionAlgorithm,
    registry: &CodecRegistry,
) -> ArchiveResult<EncodedToc> {
    let records = entries
        .iter()
        .map(FileEntry::to_record)
        .collect::<ArchiveResult<Vec<_>>>()?;
    let entry_count = u32::try_from(records.len())
        .map_err(|_| ArchiveError::InvalidFormat(format!("too many files: {}", records.len())))?;

    let mut cursor = Cursor::new(Vec::new());
    TocTable {
        entry_count,
        records,
    }
    .write(&mut cursor)?;
    let raw = cursor.into_inner();
    let uncompressed_size = raw.len() as u64;

    let stored = match algorithm.codec_id() {
        None => raw,
        Some(id) => {
            let codec = registry.require(id)?;
            let mut compressed = vec![0u8; codec.compress_bound(raw.len())];
            let written = codec.compress_block(&mut compressed, &raw)?;
            compressed.truncate(written);
            debug!(
                "Compressed table of contents with {} from {} to {} bytes",
                codec.name(),
                uncompressed_size,
                written
            );
            compressed
        }
    };

    let crc32 = crc32fast::hash(&stored);
    Ok(EncodedToc {
        stored,
        uncompressed_size,
        crc32,
    })
}

/// Verify and decode the stored table of contents described by `header`
pub(crate) fn decode_toc(
    stored: &[u8],
    header: &ArchiveHeader,
    registry: &CodecRegistry,
) -> Result<TocTable, ArchiveReaderError> {
    let actual = crc32fast::hash(stored);
    if actual != header.toc_crc32 {
        return Err(ArchiveReaderError::TocChecksumMismatch {
            expected: header.toc_crc32,
            actual,
        });
    }

    let raw: Cow<'_, [u8]> = match header.toc_compression_algorithm().codec_id() {
        None => {
            if stored.len() as u64 != header.toc_uncompressed_size {
                return Err(ArchiveReaderError::CorruptToc(format!(
                    "stored size {} differs from uncompressed size {}",
                    stored.len(),
                    header.toc_uncompressed_size
                )));
            }
            Cow::Borrowed(stored)
        }
        Some(id) => {
            if header.toc_uncompressed_size > MAX_TOC_SIZE {
                return Err(ArchiveReaderError::CorruptToc(format!(
                    "uncompressed size {} exceeds limit",
                    header.toc_uncompressed_size
                )));
            }
            let codec = registry.require(id)?;
            let mut buffer = vec![0u8; header.toc_uncompressed_size as usize];
            let written = codec.decompress_block(&mut buffer, stored)?;
            if written != buffer.len() {
                return Err(ArchiveReaderError::CorruptToc(format!(
                    "decompressed to {written} bytes, expected {}",
                    buffer.len()
                )));
            }
            Cow::Owned(buffer)
        }
    };

    let mut cursor = Cursor::new(raw.as_ref());
    let table = TocTable::read(&mut cursor)?;
    if cursor.position() != raw.len() as u64 {
        return Err(ArchiveReaderError::CorruptToc(format!(
            "{} trailing bytes after last record",
            raw.len() as u64 - cursor.position()
        )));
    }

    if table.entry_count != header.file_count {
        return Err(ArchiveReaderError::CorruptToc(format!(
            "header lists {} files, table of contents has {}",
            header.file_count, table.entry_count
        )));
    }

    Ok(table)
}
