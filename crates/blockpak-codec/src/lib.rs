//! Block codec interface for blockpak archives
//!
//! Archives compress each file in fixed-size chunks, one codec call per
//! chunk. This crate defines the [`Codec`] trait those calls go through, the
//! identifiers stored on disk for each algorithm, and a [`CodecRegistry`]
//! that readers and writers receive explicitly.
//!
//! # Built-in codecs
//!
//! - **LZ4** ([`Lz4Codec`]): raw LZ4 block format via `lz4_flex`
//! - **zlib** ([`ZlibCodec`]): deflate with zlib framing via `flate2`
//!
//! # Example
//!
//! ```
//! use blockpak_codec::{CodecRegistry, CompressionAlgorithmId};
//!
//! let registry = CodecRegistry::with_defaults();
//! let lz4 = registry.require(CompressionAlgorithmId::LZ4)?;
//!
//! let input = b"abcabcabcabcabcabcabcabc";
//! let mut compressed = vec![0u8; lz4.compress_bound(input.len())];
//! let written = lz4.compress_block(&mut compressed, input)?;
//!
//! let mut output = vec![0u8; input.len()];
//! lz4.decompress_block(&mut output, &compressed[..written])?;
//! assert_eq!(&output, input);
//! # Ok::<(), blockpak_codec::CodecError>(())
//! ```

#![warn(missing_docs)]

mod algorithm;
mod codec;
mod error;
mod lz4;
mod registry;
mod zlib;

pub use algorithm::{CompressionAlgorithm, CompressionAlgorithmId};
pub use codec::Codec;
pub use error::{CodecError, CodecResult};
pub use lz4::Lz4Codec;
pub use registry::CodecRegistry;
pub use zlib::ZlibCodec;
