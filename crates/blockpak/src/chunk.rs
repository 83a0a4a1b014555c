//! Chunk directories and partial-range read planning
//!
//! A compressed file is split into chunks of [`COMPRESSION_CHUNK_SIZE`]
//! uncompressed bytes, each compressed on its own and stored back to back.
//! [`plan_chunk_reads`] maps an uncompressed byte range onto the chunks that
//! overlap it, so a reader only touches those chunks.
//!
//! [`COMPRESSION_CHUNK_SIZE`]: crate::COMPRESSION_CHUNK_SIZE

use crate::error::{ArchiveError, ArchiveResult};
use std::ops::Range;

/// Per-chunk compressed lengths of one file, with prefix-sum offsets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDirectory {
    sizes: Vec<u32>,
    // offsets[i] is the start of chunk i relative to the file offset;
    // offsets[len] is the total compressed size
    offsets: Vec<u64>,
}

impl ChunkDirectory {
    /// Build a directory from compressed chunk lengths in file order
    pub fn from_sizes(sizes: Vec<u32>) -> Self {
        let mut offsets = Vec::with_capacity(sizes.len() + 1);
        let mut running = 0u64;
        offsets.push(running);
        for &size in &sizes {
            running += u64::from(size);
            offsets.push(running);
        }
        Self { sizes, offsets }
    }

    /// Number of chunks
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Whether the directory has no chunks
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Compressed chunk lengths
    pub fn sizes(&self) -> &[u32] {
        &self.sizes
    }

    /// Sum of all compressed chunk lengths
    pub fn total_compressed_size(&self) -> u64 {
        self.offsets.last().copied().unwrap_or(0)
    }

    /// Compressed byte range of chunk `index`, relative to the file offset
    pub fn compressed_range(&self, index: usize) -> Option<Range<u64>> {
        let start = *self.offsets.get(index)?;
        let end = *self.offsets.get(index + 1)?;
        Some(start..end)
    }
}

impl Default for ChunkDirectory {
    fn default() -> Self {
        Self::from_sizes(Vec::new())
    }
}

/// One chunk touched by a range read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRead {
    /// Zero-based chunk index
    pub chunk_index: usize,
    /// Compressed bytes of the chunk, relative to the file offset
    pub compressed: Range<u64>,
    /// Uncompressed length of the whole chunk
    pub chunk_len: usize,
    /// Bytes to take from the decompressed chunk
    pub source: Range<usize>,
    /// Where those bytes land in the output
    pub destination: Range<usize>,
}

impl ChunkRead {
    /// Whether the read consumes the entire decompressed chunk
    pub fn is_whole_chunk(&self) -> bool {
        self.source.start == 0 && self.source.end == self.chunk_len
    }
}

/// Plan the chunk reads needed to produce `range` of a file
///
/// `range` is in uncompressed file coordinates and must lie within
/// `uncompressed_size`. An empty range yields an empty plan. Destination ranges
/// are relative to `range.start` and tile `0..range.len()` in order.
pub fn plan_chunk_reads(
    directory: &ChunkDirectory,
    chunk_size: u64,
    uncompressed_size: u64,
    range: Range<u64>,
) -> ArchiveResult<Vec<ChunkRead>> {
    if chunk_size == 0 {
        return Err(ArchiveError::InvalidFormat("chunk size is zero".to_string()));
    }
    if range.start > range.end || range.end > uncompressed_size {
        return Err(ArchiveError::InvalidRange {
            start: range.start,
            size: uncompressed_size,
        });
    }

    let expected_chunks = uncompressed_size.div_ceil(chunk_size);
    if directory.len() as u64 != expected_chunks {
        return Err(ArchiveError::InvalidFormat(format!(
            "chunk directory has {} entries, {} bytes need {}",
            directory.len(),
            uncompressed_size,
            expected_chunks
        )));
    }

    if range.is_empty() {
        return Ok(Vec::new());
    }

    let first = range.start / chunk_size;
    let last = (range.end - 1) / chunk_size;
    let mut reads = Vec::with_capacity((last - first + 1) as usize);

    for index in first..=last {
        let chunk_start = index * chunk_size;
        let chunk_end = (chunk_start + chunk_size).min(uncompressed_size);
        let usable_start = range.start.max(chunk_start);
        let usable_end = range.end.min(chunk_end);

        let chunk_index = index as usize;
        let compressed = directory
            .compressed_range(chunk_index)
            .ok_or_else(|| ArchiveError::InvalidFormat(format!("missing chunk {chunk_index}")))?;

        reads.push(ChunkRead {
            chunk_index,
            compressed,
            chunk_len: (chunk_end - chunk_start) as usize,
            source: (usable_start - chunk_start) as usize..(usable_end - chunk_start) as usize,
            destination: (usable_start - range.start) as usize..(usable_end - range.start) as usize,
        });
    }

    Ok(reads)
}
