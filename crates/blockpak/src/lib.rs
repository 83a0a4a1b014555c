//! Block-aligned archive container
//!
//! An archive packs many files into one seekable stream. Every file starts on
//! a 512 byte boundary and may be stored verbatim or compressed in
//! independent 2 MiB chunks, so a byte range of a large compressed file can be
//! read by decompressing only the chunks it overlaps. A table of contents
//! written at commit time maps normalized paths and their 64-bit tokens to
//! file metadata.
//!
//! # Example
//!
//! ```
//! use blockpak::{
//!     ArchiveReader, ArchiveReaderFileSettings, ArchiveReaderSettings, ArchiveWriter,
//!     ArchiveWriterFileSettings, ArchiveWriterSettings, CompressionAlgorithm,
//! };
//! use std::io::Cursor;
//!
//! let mut writer = ArchiveWriter::create(Cursor::new(Vec::new()), ArchiveWriterSettings::default())?;
//! writer.add_file_to_archive(b"Hello World", &ArchiveWriterFileSettings::new("foo.txt"))?;
//! writer.add_file_to_archive(
//!     b"My Prefab Data in an Archive",
//!     &ArchiveWriterFileSettings::new("subdirectory/Level.prefab")
//!         .with_compression(CompressionAlgorithm::LZ4),
//! )?;
//! let stream = writer.finish()?;
//!
//! let reader = ArchiveReader::new(stream, ArchiveReaderSettings::default());
//! assert!(reader.is_mounted());
//!
//! let listing = reader.list_file_in_archive("subdirectory/level.prefab").expect("listed");
//! assert_eq!(listing.offset, 1024);
//!
//! let mut buffer = vec![0u8; listing.uncompressed_size as usize];
//! let extracted = reader
//!     .extract_file_from_archive(&mut buffer, &ArchiveReaderFileSettings::new(listing.file_path_token))?
//!     .expect("extracted");
//! assert_eq!(extracted.file_span, b"My Prefab Data in an Archive");
//! # Ok::<(), blockpak::ArchiveError>(())
//! ```

#![warn(missing_docs)]

mod chunk;
mod entry;
mod error;
mod index;
pub mod layout;
mod metadata;
mod path;
mod reader;
mod results;
mod settings;
mod token;
mod writer;

pub use chunk::{ChunkDirectory, ChunkRead, plan_chunk_reads};
pub use error::{ArchiveError, ArchiveReaderError, ArchiveResult};
pub use layout::{BLOCK_ALIGNMENT, COMPRESSION_CHUNK_SIZE};
pub use metadata::ArchiveMetadataSettings;
pub use path::{FilePathCase, normalize_path};
pub use reader::ArchiveReader;
pub use results::{ArchiveAddFileResult, ArchiveExtractFileResult, ArchiveListFileResult};
pub use settings::{
    ArchiveReaderFileSettings, ArchiveReaderSettings, ArchiveWriterFileSettings,
    ArchiveWriterSettings, ErrorCallback, FileIdentifier,
};
pub use token::ArchiveFileToken;
pub use writer::ArchiveWriter;

pub use blockpak_codec::{
    Codec, CodecError, CodecRegistry, CompressionAlgorithm, CompressionAlgorithmId,
};
