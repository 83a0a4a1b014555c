//! Archive header block

use crate::error::ArchiveReaderError;
use crate::path::FilePathCase;
use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};
use blockpak_codec::CompressionAlgorithm;

use super::BLOCK_ALIGNMENT;

/// Archive magic signature
pub const ARCHIVE_MAGIC: [u8; 4] = *b"BPAK";

/// Current archive format version
pub const ARCHIVE_VERSION: u32 = 1;

/// Serialized size of [`ArchiveHeader`] before block padding
pub const HEADER_SIZE: usize = 48;

/// Header stored in block 0 of every archive
///
/// The remainder of block 0 after the header fields is zero padding. A
/// `toc_offset` of zero marks an archive whose writer has not committed yet.
#[derive(Debug, Clone, PartialEq, Eq, BinRead, BinWrite)]
#[br(little)]
#[bw(little)]
pub struct ArchiveHeader {
    /// Magic signature, always "BPAK"
    pub magic: [u8; 4],

    /// Format version
    pub version: u32,

    /// Number of files described by the table of contents
    pub file_count: u32,

    /// [`FilePathCase`] used for stored paths
    pub path_case: u8,

    /// Reserved, zero
    pub reserved: [u8; 3],

    /// Raw algorithm of the stored table of contents
    pub toc_compression: u32,

    /// Block-aligned offset of the table of contents, 0 when uncommitted
    pub toc_offset: u64,

    /// Table of contents size as stored
    pub toc_stored_size: u64,

    /// Table of contents size after decompression
    pub toc_uncompressed_size: u64,

    /// CRC32 of the stored table of contents bytes
    pub toc_crc32: u32,
}

impl ArchiveHeader {
    /// Header of an archive that has no table of contents yet
    pub fn uncommitted(file_count: u32, path_case: FilePathCase) -> Self {
        Self {
            magic: ARCHIVE_MAGIC,
            version: ARCHIVE_VERSION,
            file_count,
            path_case: path_case.to_raw(),
            reserved: [0; 3],
            toc_compression: 0,
            toc_offset: 0,
            toc_stored_size: 0,
            toc_uncompressed_size: 0,
            toc_crc32: 0,
        }
    }

    /// Whether a table of contents has been committed
    pub fn is_committed(&self) -> bool {
        self.toc_offset != 0
    }

    /// Decoded path case, if the stored byte is known
    pub fn file_path_case(&self) -> Option<FilePathCase> {
        FilePathCase::from_raw(self.path_case)
    }

    /// Decoded table of contents algorithm
    pub fn toc_compression_algorithm(&self) -> CompressionAlgorithm {
        CompressionAlgorithm::from_raw(self.toc_compression)
    }

    /// Validate the fixed header fields
    pub fn validate(&self) -> Result<(), ArchiveReaderError> {
        if self.magic != ARCHIVE_MAGIC {
            return Err(ArchiveReaderError::InvalidMagic(self.magic));
        }

        if self.version != ARCHIVE_VERSION {
            return Err(ArchiveReaderError::UnsupportedVersion(self.version));
        }

        if self.file_path_case().is_none() {
            return Err(ArchiveReaderError::InvalidPathCase(self.path_case));
        }

        Ok(())
    }

    /// Parse a header from the start of block 0
    pub fn parse(block: &[u8]) -> Result<Self, ArchiveReaderError> {
        let mut cursor = Cursor::new(block);
        Ok(Self::read(&mut cursor)?)
    }

    /// Serialize into a full zero-padded block
    pub fn to_block(&self) -> binrw::BinResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::with_capacity(BLOCK_ALIGNMENT as usize));
        self.write(&mut cursor)?;
        let mut block = cursor.into_inner();
        block.resize(BLOCK_ALIGNMENT as usize, 0);
        Ok(block)
    }
}
