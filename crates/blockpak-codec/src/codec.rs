//! Block codec interface

use std::fmt;

use crate::algorithm::CompressionAlgorithmId;
use crate::error::CodecResult;

/// A compressor/decompressor for independent blocks
///
/// Each call handles exactly one block; codecs keep no state between calls,
/// which is what lets an archive decompress any chunk of a file without
/// touching its neighbours.
pub trait Codec: Send + Sync + fmt::Debug {
    /// Identifier recorded in archives for data produced by this codec
    fn id(&self) -> CompressionAlgorithmId;

    /// Human readable codec name
    fn name(&self) -> &'static str;

    /// Worst-case compressed size for `uncompressed_len` input bytes
    fn compress_bound(&self, uncompressed_len: usize) -> usize;

    /// Compress `src` into `dst`, returning the number of bytes written
    ///
    /// `dst` should be at least [`compress_bound`](Self::compress_bound) bytes.
    fn compress_block(&self, dst: &mut [u8], src: &[u8]) -> CodecResult<usize>;

    /// Decompress `src` into `dst`, returning the number of bytes written
    fn decompress_block(&self, dst: &mut [u8], src: &[u8]) -> CodecResult<usize>;
}
