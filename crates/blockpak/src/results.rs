//! Results returned by writer and reader operations

use crate::token::ArchiveFileToken;
use blockpak_codec::CompressionAlgorithm;
use serde::Serialize;

/// Metadata of one archived file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveListFileResult {
    /// Token of the file
    pub file_path_token: ArchiveFileToken,
    /// Normalized relative path
    pub relative_file_path: String,
    /// How the file is stored
    pub compression_algorithm: CompressionAlgorithm,
    /// Size of the original content
    pub uncompressed_size: u64,
    /// Size of the stored content
    pub compressed_size: u64,
    /// Block-aligned offset of the stored content
    pub offset: u64,
    /// CRC32 of the original content
    pub crc32: u32,
}

/// Outcome of a successful extraction
///
/// `file_span` borrows exactly the requested bytes from the caller's buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveExtractFileResult<'a> {
    /// Token of the file
    pub file_path_token: ArchiveFileToken,
    /// Normalized relative path
    pub relative_file_path: String,
    /// How the file is stored
    pub compression_algorithm: CompressionAlgorithm,
    /// Size of the original content
    pub uncompressed_size: u64,
    /// Size of the stored content
    pub compressed_size: u64,
    /// Block-aligned offset of the stored content
    pub offset: u64,
    /// Extracted bytes
    pub file_span: &'a [u8],
    /// Verified CRC32, present only when the whole file was decompressed
    pub crc32: Option<u32>,
}

/// Outcome of adding a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveAddFileResult {
    /// Token of the new file
    pub file_path_token: ArchiveFileToken,
    /// Path after normalization
    pub relative_file_path: String,
    /// Algorithm actually used, which may differ from the request after a
    /// threshold fallback
    pub compression_algorithm: CompressionAlgorithm,
    /// Size of the original content
    pub uncompressed_size: u64,
    /// Size of the stored content
    pub compressed_size: u64,
    /// Block-aligned offset of the stored content
    pub offset: u64,
    /// CRC32 of the original content
    pub crc32: u32,
}
