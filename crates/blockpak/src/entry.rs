//! In-memory file entries

use crate::chunk::ChunkDirectory;
use crate::error::{ArchiveError, ArchiveReaderError, ArchiveResult};
use crate::layout::{BLOCK_ALIGNMENT, TocRecord, chunk_count};
use crate::path::{FilePathCase, normalize_path};
use crate::results::ArchiveListFileResult;
use crate::token::ArchiveFileToken;
use blockpak_codec::CompressionAlgorithm;

/// One archived file
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FileEntry {
    pub relative_path: String,
    pub token: ArchiveFileToken,
    pub compression_algorithm: CompressionAlgorithm,
    pub uncompressed_size: u64,
    pub compressed_size: u64,
    pub offset: u64,
    pub crc32: u32,
    pub chunk_directory: ChunkDirectory,
}

impl FileEntry {
    /// Metadata view handed to callers
    pub fn list_result(&self) -> ArchiveListFileResult {
        ArchiveListFileResult {
            file_path_token: self.token,
            relative_file_path: self.relative_path.clone(),
            compression_algorithm: self.compression_algorithm,
            uncompressed_size: self.uncompressed_size,
            compressed_size: self.compressed_size,
            offset: self.offset,
            crc32: self.crc32,
        }
    }

    /// Compressed size if decompression is skipped, uncompressed size otherwise
    pub fn readable_size(&self, decompress: bool) -> u64 {
        if decompress {
            self.uncompressed_size
        } else {
            self.compressed_size
        }
    }

    pub fn to_record(&self) -> ArchiveResult<TocRecord> {
        let path = self.relative_path.as_bytes().to_vec();
        let path_len = u16::try_from(path.len())
            .map_err(|_| ArchiveError::InvalidPath(self.relative_path.clone()))?;
        let chunk_count = u32::try_from(self.chunk_directory.len()).map_err(|_| {
            ArchiveError::InvalidFormat(format!(
                "{} has too many chunks: {}",
                self.relative_path,
                self.chunk_directory.len()
            ))
        })?;

        Ok(TocRecord {
            path_len,
            path,
            token: self.token.get(),
            algorithm: self.compression_algorithm.to_raw(),
            uncompressed_size: self.uncompressed_size,
            compressed_size: self.compressed_size,
            offset: self.offset,
            crc32: self.crc32,
            chunk_count,
            chunk_sizes: self.chunk_directory.sizes().to_vec(),
        })
    }

    /// Validate a stored record whose data must end at or before `data_end`
    ///
    /// The stored path must already be normalized under `path_case`, otherwise
    /// lookups could never reach it.
    pub fn from_record(
        index: usize,
        record: TocRecord,
        path_case: FilePathCase,
        data_end: u64,
    ) -> Result<Self, ArchiveReaderError> {
        let corrupt = |reason: String| ArchiveReaderError::CorruptEntry { index, reason };

        let relative_path = String::from_utf8(record.path)
            .map_err(|e| corrupt(format!("path is not UTF-8: {e}")))?;
        let normalized = normalize_path(&relative_path, path_case).ok();
        if normalized.as_deref() != Some(relative_path.as_str()) {
            return Err(corrupt(format!(
                "path {relative_path:?} is not normalized for {path_case:?} case"
            )));
        }

        let token = ArchiveFileToken::from_raw(record.token);
        if token != ArchiveFileToken::from_normalized_path(&relative_path) {
            return Err(corrupt(format!(
                "token {token} does not match path {relative_path:?}"
            )));
        }

        if record.offset < BLOCK_ALIGNMENT || record.offset % BLOCK_ALIGNMENT != 0 {
            return Err(corrupt(format!("offset {} is not block aligned", record.offset)));
        }
        if record
            .offset
            .checked_add(record.compressed_size)
            .is_none_or(|end| end > data_end)
        {
            return Err(corrupt(format!(
                "data at {} with size {} overlaps the table of contents at {data_end}",
                record.offset, record.compressed_size
            )));
        }

        let compression_algorithm = CompressionAlgorithm::from_raw(record.algorithm);
        let chunk_directory = ChunkDirectory::from_sizes(record.chunk_sizes);
        if compression_algorithm.is_uncompressed() {
            if record.compressed_size != record.uncompressed_size {
                return Err(corrupt(format!(
                    "uncompressed entry has sizes {} and {}",
                    record.uncompressed_size, record.compressed_size
                )));
            }
            if !chunk_directory.is_empty() {
                return Err(corrupt("uncompressed entry has chunks".to_string()));
            }
        } else {
            let expected = chunk_count(record.uncompressed_size);
            if chunk_directory.len() as u64 != expected {
                return Err(corrupt(format!(
                    "{} chunks recorded, {expected} expected",
                    chunk_directory.len()
                )));
            }
            if chunk_directory.total_compressed_size() != record.compressed_size {
                return Err(corrupt(format!(
                    "chunk sizes sum to {}, compressed size is {}",
                    chunk_directory.total_compressed_size(),
                    record.compressed_size
                )));
            }
        }

        Ok(Self {
            relative_path,
            token,
            compression_algorithm,
            uncompressed_size: record.uncompressed_size,
            compressed_size: record.compressed_size,
            offset: record.offset,
            crc32: record.crc32,
            chunk_directory,
        })
    }
}
