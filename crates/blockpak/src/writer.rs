//! Archive construction

use crate::chunk::ChunkDirectory;
use crate::entry::FileEntry;
use crate::error::{ArchiveError, ArchiveResult};
use crate::index::{ArchiveIndex, IndexConflict};
use crate::layout::{
    self, ArchiveHeader, ArchiveLayout, BLOCK_ALIGNMENT, COMPRESSION_CHUNK_SIZE, chunk_count,
};
use crate::metadata::{ArchiveMetadataSettings, write_metadata};
use crate::path::normalize_path;
use crate::results::{ArchiveAddFileResult, ArchiveListFileResult};
use crate::settings::{ArchiveWriterFileSettings, ArchiveWriterSettings, FileIdentifier};
use crate::token::ArchiveFileToken;
use blockpak_codec::CompressionAlgorithm;
use std::borrow::Cow;
use std::io::{Read, Seek, SeekFrom, Write};
use tracing::{debug, info, warn};

/// Builds an archive on a seekable stream
///
/// Files are written as they are added; [`commit`](Self::commit) writes the
/// table of contents after the last file and finalizes the header. Until the
/// first commit, readers refuse to mount the stream.
///
/// Pass `&mut stream` to keep ownership of the stream, or the stream itself
/// and get it back from [`finish`](Self::finish).
#[derive(Debug)]
pub struct ArchiveWriter<S: Write + Seek> {
    stream: S,
    settings: ArchiveWriterSettings,
    index: ArchiveIndex,
    next_offset: u64,
    committed: bool,
}

/// File content prepared for storage
struct EncodedContent<'a> {
    algorithm: CompressionAlgorithm,
    payload: Cow<'a, [u8]>,
    chunk_sizes: Vec<u32>,
}

impl<'a> EncodedContent<'a> {
    fn stored(data: &'a [u8]) -> Self {
        Self {
            algorithm: CompressionAlgorithm::Uncompressed,
            payload: Cow::Borrowed(data),
            chunk_sizes: Vec::new(),
        }
    }
}

impl<S: Write + Seek> ArchiveWriter<S> {
    /// Start a new archive at the beginning of `stream`
    pub fn create(mut stream: S, settings: ArchiveWriterSettings) -> ArchiveResult<Self> {
        let header = ArchiveHeader::uncommitted(0, settings.path_case);
        stream.seek(SeekFrom::Start(0))?;
        stream.write_all(&header.to_block()?)?;

        debug!(
            "Created archive writer (path case {:?}, table of contents {})",
            settings.path_case, settings.toc_compression
        );

        Ok(Self {
            stream,
            settings,
            index: ArchiveIndex::default(),
            next_offset: BLOCK_ALIGNMENT,
            committed: false,
        })
    }

    /// Add a file with the given content
    ///
    /// The path is normalized with the writer's path case. Compressed files
    /// are split into [`COMPRESSION_CHUNK_SIZE`] chunks compressed one by one.
    /// On error nothing is recorded for the file.
    pub fn add_file_to_archive(
        &mut self,
        data: &[u8],
        file_settings: &ArchiveWriterFileSettings,
    ) -> ArchiveResult<ArchiveAddFileResult> {
        let relative_path =
            normalize_path(&file_settings.relative_file_path, self.settings.path_case)?;
        if relative_path.len() > usize::from(u16::MAX) {
            return Err(ArchiveError::InvalidPath(relative_path));
        }

        let token = ArchiveFileToken::from_normalized_path(&relative_path);
        if let Err(conflict) = self.index.check(&relative_path, token) {
            debug!("Rejected {}: {}", relative_path, conflict);
            return Err(match conflict {
                IndexConflict::DuplicatePath => ArchiveError::DuplicatePath(relative_path),
                IndexConflict::DuplicateToken { existing } => ArchiveError::TokenCollision {
                    path: relative_path,
                    existing,
                },
            });
        }

        let crc32 = crc32fast::hash(data);
        let encoded = self.encode(&relative_path, data, file_settings.compression_algorithm)?;

        self.reopen_if_committed()?;

        let offset = self.next_offset;
        self.next_offset = layout::write_region(&mut self.stream, offset, &encoded.payload)?;

        let entry = FileEntry {
            relative_path,
            token,
            compression_algorithm: encoded.algorithm,
            uncompressed_size: data.len() as u64,
            compressed_size: encoded.payload.len() as u64,
            offset,
            crc32,
            chunk_directory: ChunkDirectory::from_sizes(encoded.chunk_sizes),
        };

        debug!(
            "Added {} at offset {} ({} bytes, {} stored with {})",
            entry.relative_path,
            entry.offset,
            entry.uncompressed_size,
            entry.compressed_size,
            entry.compression_algorithm
        );

        let result = ArchiveAddFileResult {
            file_path_token: entry.token,
            relative_file_path: entry.relative_path.clone(),
            compression_algorithm: entry.compression_algorithm,
            uncompressed_size: entry.uncompressed_size,
            compressed_size: entry.compressed_size,
            offset: entry.offset,
            crc32: entry.crc32,
        };
        self.index.push(entry);
        Ok(result)
    }

    /// Read `reader` to the end and add its content
    pub fn add_file_from_reader<R: Read>(
        &mut self,
        mut reader: R,
        file_settings: &ArchiveWriterFileSettings,
    ) -> ArchiveResult<ArchiveAddFileResult> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        self.add_file_to_archive(&data, file_settings)
    }

    /// Write the table of contents and finalize the header
    ///
    /// An archive with no files commits to a valid empty archive. Adding more
    /// files afterwards is allowed; they replace the table of contents, which
    /// is written again by the next commit.
    pub fn commit(&mut self) -> ArchiveResult<()> {
        let toc = layout::encode_toc(
            self.index.entries(),
            self.settings.toc_compression,
            &self.settings.registry,
        )?;

        let toc_offset = self.next_offset;
        layout::write_region(&mut self.stream, toc_offset, &toc.stored)?;

        let mut header = ArchiveHeader::uncommitted(self.file_count_u32()?, self.settings.path_case);
        header.toc_compression = self.settings.toc_compression.to_raw();
        header.toc_offset = toc_offset;
        header.toc_stored_size = toc.stored.len() as u64;
        header.toc_uncompressed_size = toc.uncompressed_size;
        header.toc_crc32 = toc.crc32;
        self.write_header(&header)?;
        self.stream.flush()?;
        self.committed = true;

        info!(
            "Committed archive with {} files, table of contents at {} ({} bytes)",
            header.file_count, toc_offset, header.toc_stored_size
        );
        Ok(())
    }

    /// Commit and hand back the stream
    pub fn finish(mut self) -> ArchiveResult<S> {
        self.commit()?;
        Ok(self.stream)
    }

    /// Whether the last change has been committed
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Number of files added so far, including any from an opened archive
    pub fn file_count(&self) -> usize {
        self.index.len()
    }

    /// Writer settings
    pub fn settings(&self) -> &ArchiveWriterSettings {
        &self.settings
    }

    /// Whether `path` has been added
    pub fn contains_file(&self, path: &str) -> bool {
        self.find_file(path).is_some()
    }

    /// Token of `path` if it has been added
    pub fn find_file(&self, path: &str) -> Option<ArchiveFileToken> {
        self.list_file_in_archive(path)
            .map(|listing| listing.file_path_token)
    }

    /// Metadata of an added file
    pub fn list_file_in_archive(
        &self,
        identifier: impl Into<FileIdentifier>,
    ) -> Option<ArchiveListFileResult> {
        self.index
            .resolve(&identifier.into(), self.settings.path_case)
            .map(FileEntry::list_result)
    }

    /// Write a text listing of the files added so far
    pub fn dump_archive_metadata<W: Write + ?Sized>(
        &self,
        out: &mut W,
        settings: &ArchiveMetadataSettings,
    ) -> ArchiveResult<()> {
        write_metadata(out, self.index.entries(), settings)?;
        Ok(())
    }

    fn encode<'a>(
        &self,
        path: &str,
        data: &'a [u8],
        requested: CompressionAlgorithm,
    ) -> ArchiveResult<EncodedContent<'a>> {
        let Some(id) = requested.codec_id() else {
            return Ok(EncodedContent::stored(data));
        };
        let codec = self.settings.registry.require(id)?;

        let chunk_size = COMPRESSION_CHUNK_SIZE as usize;
        let mut scratch = vec![0u8; codec.compress_bound(data.len().min(chunk_size))];
        let mut payload = Vec::with_capacity(data.len() / 2);
        let mut chunk_sizes = Vec::with_capacity(chunk_count(data.len() as u64) as usize);

        for (chunk_index, chunk) in data.chunks(chunk_size).enumerate() {
            let written = codec
                .compress_block(&mut scratch, chunk)
                .map_err(|source| ArchiveError::ChunkCompression {
                    path: path.to_string(),
                    chunk_index,
                    source,
                })?;

            if let Some(threshold) = self.settings.compression_threshold
                && written as u64 > u64::from(threshold)
            {
                warn!(
                    "Chunk {} of {} compressed to {} bytes, above threshold {}; storing uncompressed",
                    chunk_index, path, written, threshold
                );
                return Ok(EncodedContent::stored(data));
            }

            payload.extend_from_slice(&scratch[..written]);
            chunk_sizes.push(written as u32);
        }

        Ok(EncodedContent {
            algorithm: requested,
            payload: Cow::Owned(payload),
            chunk_sizes,
        })
    }

    /// Mark the header uncommitted before data overwrites the old table of contents
    fn reopen_if_committed(&mut self) -> ArchiveResult<()> {
        if self.committed {
            debug!("Invalidating committed table of contents at {}", self.next_offset);
            let header = ArchiveHeader::uncommitted(self.file_count_u32()?, self.settings.path_case);
            self.write_header(&header)?;
            self.committed = false;
        }
        Ok(())
    }

    fn write_header(&mut self, header: &ArchiveHeader) -> ArchiveResult<()> {
        self.stream.seek(SeekFrom::Start(0))?;
        self.stream.write_all(&header.to_block()?)?;
        Ok(())
    }

    fn file_count_u32(&self) -> ArchiveResult<u32> {
        u32::try_from(self.index.len())
            .map_err(|_| ArchiveError::InvalidFormat(format!("too many files: {}", self.index.len())))
    }
}

impl<S: Read + Write + Seek> ArchiveWriter<S> {
    /// Reopen a committed archive to append files
    ///
    /// New files are written over the existing table of contents; the next
    /// commit writes a fresh one. The archive's stored path case replaces
    /// the one in `settings`. An empty stream starts a new archive.
    pub fn open_existing(mut stream: S, mut settings: ArchiveWriterSettings) -> ArchiveResult<Self> {
        if layout::stream_len(&mut stream)? == 0 {
            return Self::create(stream, settings);
        }

        let ArchiveLayout {
            header,
            path_case,
            index,
        } = layout::read_archive(&mut stream, &settings.registry)?;

        if path_case != settings.path_case {
            debug!(
                "Archive stores paths as {:?}, overriding requested {:?}",
                path_case, settings.path_case
            );
            settings.path_case = path_case;
        }

        info!(
            "Opened archive with {} files for appending at offset {}",
            index.len(),
            header.toc_offset
        );

        Ok(Self {
            stream,
            settings,
            index,
            next_offset: header.toc_offset,
            committed: true,
        })
    }
}
