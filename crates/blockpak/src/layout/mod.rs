//! On-disk container layout
//!
//! ```text
//! +-----------------+  offset 0
//! | header block    |  ArchiveHeader, zero padded to 512 bytes
//! +-----------------+  offset 512
//! | file data       |  one region per file, each starting block aligned
//! | ...             |  and zero padded to the next block boundary
//! +-----------------+  toc_offset
//! | table of        |  TocTable, optionally compressed as one block
//! | contents        |
//! +-----------------+
//! ```

mod header;
mod toc;

pub use header::{ARCHIVE_MAGIC, ARCHIVE_VERSION, ArchiveHeader, HEADER_SIZE};
pub(crate) use toc::{TocRecord, encode_toc};

use crate::entry::FileEntry;
use crate::error::ArchiveReaderError;
use crate::index::ArchiveIndex;
use crate::path::FilePathCase;
use blockpak_codec::CodecRegistry;
use std::io::{self, Read, Seek, SeekFrom, Write};
use tracing::debug;

/// Alignment of every file data region and of the table of contents
pub const BLOCK_ALIGNMENT: u64 = 512;

/// Uncompressed size of one independently compressed chunk
pub const COMPRESSION_CHUNK_SIZE: u64 = 2 * 1024 * 1024;

const ZERO_BLOCK: [u8; BLOCK_ALIGNMENT as usize] = [0; BLOCK_ALIGNMENT as usize];

/// Round `value` up to the next multiple of `alignment`
pub const fn align_up(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

/// Number of compression chunks covering `uncompressed_size` bytes
pub const fn chunk_count(uncompressed_size: u64) -> u64 {
    uncompressed_size.div_ceil(COMPRESSION_CHUNK_SIZE)
}

pub(crate) fn stream_len<S: Seek>(stream: &mut S) -> io::Result<u64> {
    stream.seek(SeekFrom::End(0))
}

/// Write `payload` at `offset` followed by zero padding to the next block
///
/// Returns the aligned end of the region.
pub(crate) fn write_region<S: Write + Seek>(
    stream: &mut S,
    offset: u64,
    payload: &[u8],
) -> io::Result<u64> {
    stream.seek(SeekFrom::Start(offset))?;
    stream.write_all(payload)?;

    let end = offset + payload.len() as u64;
    let aligned = align_up(end, BLOCK_ALIGNMENT);
    stream.write_all(&ZERO_BLOCK[..(aligned - end) as usize])?;
    Ok(aligned)
}

/// Parsed header and index of a committed archive
#[derive(Debug)]
pub(crate) struct ArchiveLayout {
    pub header: ArchiveHeader,
    pub path_case: FilePathCase,
    pub index: ArchiveIndex,
}

/// Read and validate the header and table of contents of `stream`
pub(crate) fn read_archive<S: Read + Seek>(
    stream: &mut S,
    registry: &CodecRegistry,
) -> Result<ArchiveLayout, ArchiveReaderError> {
    let len = stream_len(stream)?;
    if len == 0 {
        return Err(ArchiveReaderError::EmptyStream);
    }
    if len < BLOCK_ALIGNMENT {
        return Err(ArchiveReaderError::StreamTooShort {
            len,
            required: BLOCK_ALIGNMENT,
        });
    }

    let mut block = [0u8; BLOCK_ALIGNMENT as usize];
    stream.seek(SeekFrom::Start(0))?;
    stream.read_exact(&mut block)?;

    let header = ArchiveHeader::parse(&block)?;
    header.validate()?;
    let path_case = header
        .file_path_case()
        .ok_or(ArchiveReaderError::InvalidPathCase(header.path_case))?;

    if !header.is_committed() {
        return Err(ArchiveReaderError::NotCommitted);
    }

    let toc_end = header.toc_offset.checked_add(header.toc_stored_size);
    let toc_fits = header.toc_offset >= BLOCK_ALIGNMENT
        && header.toc_offset % BLOCK_ALIGNMENT == 0
        && toc_end.is_some_and(|end| end <= len);
    if !toc_fits {
        return Err(ArchiveReaderError::InvalidTocLocation {
            offset: header.toc_offset,
            size: header.toc_stored_size,
            stream_len: len,
        });
    }

    let mut stored = vec![0u8; header.toc_stored_size as usize];
    stream.seek(SeekFrom::Start(header.toc_offset))?;
    stream.read_exact(&mut stored)?;

    let table = toc::decode_toc(&stored, &header, registry)?;

    let mut index = ArchiveIndex::with_capacity(table.records.len());
    for (position, record) in table.records.into_iter().enumerate() {
        let entry = FileEntry::from_record(position, record, path_case, header.toc_offset)?;
        index
            .check(&entry.relative_path, entry.token)
            .map_err(|conflict| ArchiveReaderError::CorruptEntry {
                index: position,
                reason: conflict.to_string(),
            })?;
        index.push(entry);
    }

    debug!(
        "Read archive layout: {} files, table of contents at {} ({} bytes stored)",
        index.len(),
        header.toc_offset,
        header.toc_stored_size
    );

    Ok(ArchiveLayout {
        header,
        path_case,
        index,
    })
}
