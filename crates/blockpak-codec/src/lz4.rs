//! LZ4 block codec
//!
//! Blocks are raw LZ4 block format with no size prefix; the archive table of
//! contents already records both sizes of every chunk.

use crate::algorithm::CompressionAlgorithmId;
use crate::codec::Codec;
use crate::error::{CodecError, CodecResult};

/// LZ4 block codec backed by `lz4_flex`
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4Codec;

impl Codec for Lz4Codec {
    fn id(&self) -> CompressionAlgorithmId {
        CompressionAlgorithmId::LZ4
    }

    fn name(&self) -> &'static str {
        "lz4"
    }

    fn compress_bound(&self, uncompressed_len: usize) -> usize {
        lz4_flex::block::get_maximum_output_size(uncompressed_len)
    }

    fn compress_block(&self, dst: &mut [u8], src: &[u8]) -> CodecResult<usize> {
        let required = self.compress_bound(src.len());
        if dst.len() < required {
            return Err(CodecError::OutputTooSmall {
                required,
                available: dst.len(),
            });
        }

        lz4_flex::block::compress_into(src, dst).map_err(|e| CodecError::CompressionFailed {
            codec: self.name(),
            reason: e.to_string(),
        })
    }

    fn decompress_block(&self, dst: &mut [u8], src: &[u8]) -> CodecResult<usize> {
        lz4_flex::block::decompress_into(src, dst).map_err(|e| CodecError::DecompressionFailed {
            codec: self.name(),
            reason: e.to_string(),
        })
    }
}
