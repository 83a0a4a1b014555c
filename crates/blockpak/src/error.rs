//! Error types for archive operations

use blockpak_codec::CodecError;
use thiserror::Error;

/// Archive operation result type
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Reasons a stream cannot be mounted as an archive
///
/// These are reported through the reader's error callback and never abort the
/// process; the reader stays unmounted and can be handed another stream.
#[derive(Debug, Error)]
pub enum ArchiveReaderError {
    /// The stream holds no bytes at all
    #[error("archive stream is empty")]
    EmptyStream,

    /// The stream is shorter than the header block
    #[error("archive stream is {len} bytes, shorter than the {required} byte header block")]
    StreamTooShort {
        /// Stream length
        len: u64,
        /// Minimum length of a mountable archive
        required: u64,
    },

    /// Header magic does not identify an archive
    #[error("invalid archive magic: expected [42, 50, 41, 4B], got {0:02X?}")]
    InvalidMagic([u8; 4]),

    /// Header version is newer or older than this implementation understands
    #[error("unsupported archive version: {0}")]
    UnsupportedVersion(u32),

    /// Header path case byte is unknown
    #[error("invalid path case value in header: {0}")]
    InvalidPathCase(u8),

    /// The writer never committed a table of contents
    #[error("archive has not been committed (no table of contents)")]
    NotCommitted,

    /// Header points the table of contents outside the stream
    #[error(
        "table of contents at offset {offset} with size {size} does not fit in a {stream_len} byte stream"
    )]
    InvalidTocLocation {
        /// Recorded TOC offset
        offset: u64,
        /// Recorded TOC stored size
        size: u64,
        /// Actual stream length
        stream_len: u64,
    },

    /// Stored table of contents bytes are damaged
    #[error("table of contents checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    TocChecksumMismatch {
        /// Checksum recorded in the header
        expected: u32,
        /// Checksum of the bytes read
        actual: u32,
    },

    /// Table of contents decoded but is internally inconsistent
    #[error("corrupt table of contents: {0}")]
    CorruptToc(String),

    /// A single file record violates a layout invariant
    #[error("corrupt table of contents entry {index}: {reason}")]
    CorruptEntry {
        /// Record index in TOC order
        index: usize,
        /// Violated invariant
        reason: String,
    },

    /// Table of contents codec failure
    #[error("table of contents codec error: {0}")]
    Codec(#[from] CodecError),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by archive writers and readers
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Path is empty after normalization
    #[error("invalid archive path: {0:?}")]
    InvalidPath(String),

    /// Path already present in the archive
    #[error("file already exists in archive: {0}")]
    DuplicatePath(String),

    /// Two different paths hash to the same token
    #[error("path token collision between {path:?} and existing {existing:?}")]
    TokenCollision {
        /// Path being added
        path: String,
        /// Path already holding the token
        existing: String,
    },

    /// Reader has no archive mounted
    #[error("no archive is mounted")]
    NotMounted,

    /// Output buffer cannot hold the requested bytes
    #[error("output buffer too small: need {required} bytes, have {available}")]
    BufferTooSmall {
        /// Requested byte count
        required: u64,
        /// Caller buffer length
        available: usize,
    },

    /// Requested range starts past the end of the file
    #[error("invalid range: start {start} is past the end of a {size} byte file")]
    InvalidRange {
        /// Requested start offset
        start: u64,
        /// Size of the addressed content
        size: u64,
    },

    /// Extracted content does not match the stored checksum
    #[error("checksum mismatch for {path}: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Archive path
        path: String,
        /// Stored CRC32
        expected: u32,
        /// CRC32 of the extracted bytes
        actual: u32,
    },

    /// A chunk failed to compress
    #[error("failed to compress chunk {chunk_index} of {path}: {source}")]
    ChunkCompression {
        /// Archive path
        path: String,
        /// Zero-based chunk index
        chunk_index: usize,
        /// Codec failure
        #[source]
        source: CodecError,
    },

    /// A chunk failed to decompress
    #[error("failed to decompress chunk {chunk_index} of {path}: {source}")]
    ChunkDecompression {
        /// Archive path
        path: String,
        /// Zero-based chunk index
        chunk_index: usize,
        /// Codec failure
        #[source]
        source: CodecError,
    },

    /// A chunk decompressed to an unexpected length
    #[error("chunk {chunk_index} of {path} decompressed to {actual} bytes, expected {expected}")]
    ChunkSizeMismatch {
        /// Archive path
        path: String,
        /// Zero-based chunk index
        chunk_index: usize,
        /// Uncompressed chunk length from the layout
        expected: usize,
        /// Bytes produced by the codec
        actual: usize,
    },

    /// Codec lookup or codec failure outside chunk processing
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Stream could not be mounted
    #[error("mount failed: {0}")]
    Mount(#[from] ArchiveReaderError),

    /// Value does not fit the on-disk format
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Binary read/write error
    #[error("binary format error: {0}")]
    BinRw(#[from] binrw::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    /// Check if the caller can fix its input and retry on the same archive
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidPath(_)
                | Self::DuplicatePath(_)
                | Self::TokenCollision { .. }
                | Self::BufferTooSmall { .. }
                | Self::InvalidRange { .. }
        )
    }

    /// Check if this error indicates damaged archive content
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::ChecksumMismatch { .. }
                | Self::ChunkDecompression { .. }
                | Self::ChunkSizeMismatch { .. }
                | Self::Mount(
                    ArchiveReaderError::TocChecksumMismatch { .. }
                        | ArchiveReaderError::CorruptToc(_)
                        | ArchiveReaderError::CorruptEntry { .. }
                )
        )
    }
}
