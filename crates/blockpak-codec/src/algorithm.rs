//! Compression algorithm identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a registered block codec
///
/// Identifiers are stored verbatim in archive tables of contents, so a value
/// must never be reassigned to a different codec. `0` is reserved for
/// uncompressed storage and cannot be registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompressionAlgorithmId(u32);

impl CompressionAlgorithmId {
    /// LZ4 block format
    pub const LZ4: Self = Self(1);
    /// zlib (deflate with zlib framing)
    pub const ZLIB: Self = Self(2);

    /// Create an identifier from its raw value
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw value as stored on disk
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CompressionAlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a file's bytes are stored: verbatim or through a registered codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompressionAlgorithm {
    /// Stored verbatim, no codec involved
    #[default]
    Uncompressed,
    /// Compressed in independent chunks by the codec with this identifier
    Registered(CompressionAlgorithmId),
}

impl CompressionAlgorithm {
    /// LZ4 block compression
    pub const LZ4: Self = Self::Registered(CompressionAlgorithmId::LZ4);
    /// zlib compression
    pub const ZLIB: Self = Self::Registered(CompressionAlgorithmId::ZLIB);

    /// Decode from the on-disk representation (`0` = uncompressed)
    pub const fn from_raw(raw: u32) -> Self {
        if raw == 0 {
            Self::Uncompressed
        } else {
            Self::Registered(CompressionAlgorithmId(raw))
        }
    }

    /// Encode to the on-disk representation
    pub const fn to_raw(self) -> u32 {
        match self {
            Self::Uncompressed => 0,
            Self::Registered(id) => id.0,
        }
    }

    /// Whether this stores bytes verbatim
    pub const fn is_uncompressed(self) -> bool {
        matches!(self, Self::Uncompressed)
    }

    /// Codec identifier, if any
    pub const fn codec_id(self) -> Option<CompressionAlgorithmId> {
        match self {
            Self::Uncompressed => None,
            Self::Registered(id) => Some(id),
        }
    }
}

impl From<CompressionAlgorithmId> for CompressionAlgorithm {
    fn from(id: CompressionAlgorithmId) -> Self {
        Self::Registered(id)
    }
}

impl fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uncompressed => f.write_str("uncompressed"),
            Self::Registered(id) if *id == CompressionAlgorithmId::LZ4 => f.write_str("lz4"),
            Self::Registered(id) if *id == CompressionAlgorithmId::ZLIB => f.write_str("zlib"),
            Self::Registered(id) => write!(f, "codec#{id}"),
        }
    }
}
