//! Codec error types

use thiserror::Error;

use crate::algorithm::CompressionAlgorithmId;

/// Errors raised by block codecs and the codec registry
#[derive(Debug, Error)]
pub enum CodecError {
    /// Destination buffer cannot hold the codec output
    #[error("output buffer too small: need at least {required} bytes, have {available}")]
    OutputTooSmall {
        /// Bytes the operation needed
        required: usize,
        /// Bytes the caller provided
        available: usize,
    },

    /// Compression of a block failed
    #[error("{codec} compression failed: {reason}")]
    CompressionFailed {
        /// Codec name
        codec: &'static str,
        /// Codec-specific failure detail
        reason: String,
    },

    /// Decompression of a block failed (corrupt or truncated input)
    #[error("{codec} decompression failed: {reason}")]
    DecompressionFailed {
        /// Codec name
        codec: &'static str,
        /// Codec-specific failure detail
        reason: String,
    },

    /// Identifier 0 is reserved for uncompressed storage
    #[error("compression algorithm id 0 is reserved for uncompressed storage")]
    ReservedAlgorithmId,

    /// A codec with the same identifier is already registered
    #[error("compression algorithm {0} is already registered")]
    AlreadyRegistered(CompressionAlgorithmId),

    /// No codec is registered for the identifier
    #[error("compression algorithm {0} is not registered")]
    NotRegistered(CompressionAlgorithmId),
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;
