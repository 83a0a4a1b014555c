//! zlib block codec

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use crate::algorithm::CompressionAlgorithmId;
use crate::codec::Codec;
use crate::error::{CodecError, CodecResult};

/// zlib block codec backed by `flate2`
#[derive(Debug, Clone, Copy)]
pub struct ZlibCodec {
    level: Compression,
}

impl ZlibCodec {
    /// Create a codec with an explicit compression level (0-9)
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }
}

impl Default for ZlibCodec {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl Codec for ZlibCodec {
    fn id(&self) -> CompressionAlgorithmId {
        CompressionAlgorithmId::ZLIB
    }

    fn name(&self) -> &'static str {
        "zlib"
    }

    /// miniz `mz_compressBound`, which also covers zlib's tighter `compressBound`
    fn compress_bound(&self, uncompressed_len: usize) -> usize {
        let expanded = 128 + uncompressed_len.saturating_mul(110) / 100;
        let stored = 128 + uncompressed_len + (uncompressed_len / (31 * 1024) + 1) * 5;
        expanded.max(stored)
    }

    fn compress_block(&self, dst: &mut [u8], src: &[u8]) -> CodecResult<usize> {
        let mut compressor = Compress::new(self.level, true);
        let status = compressor
            .compress(src, dst, FlushCompress::Finish)
            .map_err(|e| CodecError::CompressionFailed {
                codec: self.name(),
                reason: e.to_string(),
            })?;

        match status {
            Status::StreamEnd => Ok(compressor.total_out() as usize),
            Status::Ok | Status::BufError => Err(CodecError::OutputTooSmall {
                required: self.compress_bound(src.len()),
                available: dst.len(),
            }),
        }
    }

    fn decompress_block(&self, dst: &mut [u8], src: &[u8]) -> CodecResult<usize> {
        let mut decompressor = Decompress::new(true);
        let status = decompressor
            .decompress(src, dst, FlushDecompress::Finish)
            .map_err(|e| CodecError::DecompressionFailed {
                codec: self.name(),
                reason: e.to_string(),
            })?;

        match status {
            Status::StreamEnd => Ok(decompressor.total_out() as usize),
            Status::Ok | Status::BufError => Err(CodecError::DecompressionFailed {
                codec: self.name(),
                reason: format!(
                    "stream did not end after {} input bytes and {} output bytes",
                    decompressor.total_in(),
                    decompressor.total_out()
                ),
            }),
        }
    }
}
