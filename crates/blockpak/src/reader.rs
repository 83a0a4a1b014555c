//! Archive mounting, lookup and extraction

use crate::chunk::plan_chunk_reads;
use crate::entry::FileEntry;
use crate::error::{ArchiveError, ArchiveReaderError, ArchiveResult};
use crate::index::ArchiveIndex;
use crate::layout::{self, ArchiveHeader, ArchiveLayout, COMPRESSION_CHUNK_SIZE};
use crate::metadata::{ArchiveMetadataSettings, write_metadata};
use crate::path::FilePathCase;
use crate::results::{ArchiveExtractFileResult, ArchiveListFileResult};
use crate::settings::{ArchiveReaderFileSettings, ArchiveReaderSettings, FileIdentifier};
use crate::token::ArchiveFileToken;
use blockpak_codec::Codec;
use parking_lot::Mutex;
use std::io::{self, Read, Seek, SeekFrom};
use std::ops::Range;
use tracing::{debug, info, warn};

/// Read-only view of a committed archive
///
/// Lookups and extraction take `&self`, so a mounted reader can be shared
/// between threads. Each positioned read holds the stream lock for its
/// seek and read. Mounting and unmounting take `&mut self`.
#[derive(Debug)]
pub struct ArchiveReader<S> {
    settings: ArchiveReaderSettings,
    mounted: Option<MountedArchive<S>>,
}

#[derive(Debug)]
struct MountedArchive<S> {
    stream: Mutex<S>,
    header: ArchiveHeader,
    path_case: FilePathCase,
    index: ArchiveIndex,
}

impl<S: Read + Seek> MountedArchive<S> {
    fn read_at(&self, offset: u64, dst: &mut [u8]) -> io::Result<()> {
        let mut stream = self.stream.lock();
        stream.seek(SeekFrom::Start(offset))?;
        stream.read_exact(dst)
    }

    /// Decompress `range` of `entry` into `out`, touching only overlapping chunks
    fn read_chunks(
        &self,
        entry: &FileEntry,
        range: Range<u64>,
        out: &mut [u8],
        codec: &dyn Codec,
    ) -> ArchiveResult<()> {
        let plan = plan_chunk_reads(
            &entry.chunk_directory,
            COMPRESSION_CHUNK_SIZE,
            entry.uncompressed_size,
            range,
        )?;

        debug!(
            "Reading {} of {} chunks of {}",
            plan.len(),
            entry.chunk_directory.len(),
            entry.relative_path
        );

        let mut compressed = Vec::new();
        let mut scratch = Vec::new();
        for read in &plan {
            compressed.resize((read.compressed.end - read.compressed.start) as usize, 0);
            self.read_at(entry.offset + read.compressed.start, &mut compressed)?;

            let target = &mut out[read.destination.clone()];
            if read.is_whole_chunk() {
                decompress_chunk(codec, target, &compressed, entry, read.chunk_index)?;
            } else {
                scratch.resize(read.chunk_len, 0);
                decompress_chunk(codec, &mut scratch, &compressed, entry, read.chunk_index)?;
                target.copy_from_slice(&scratch[read.source.clone()]);
            }
        }

        Ok(())
    }
}

fn decompress_chunk(
    codec: &dyn Codec,
    dst: &mut [u8],
    src: &[u8],
    entry: &FileEntry,
    chunk_index: usize,
) -> ArchiveResult<()> {
    let written =
        codec
            .decompress_block(dst, src)
            .map_err(|source| ArchiveError::ChunkDecompression {
                path: entry.relative_path.clone(),
                chunk_index,
                source,
            })?;

    if written != dst.len() {
        return Err(ArchiveError::ChunkSizeMismatch {
            path: entry.relative_path.clone(),
            chunk_index,
            expected: dst.len(),
            actual: written,
        });
    }
    Ok(())
}

impl<S> ArchiveReader<S> {
    /// Create a reader with nothing mounted
    pub fn unmounted(settings: ArchiveReaderSettings) -> Self {
        Self {
            settings,
            mounted: None,
        }
    }

    /// Whether an archive is mounted
    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Drop the index and hand back the stream
    pub fn unmount_archive(&mut self) -> Option<S> {
        let mounted = self.mounted.take()?;
        debug!("Unmounted archive with {} files", mounted.index.len());
        Some(mounted.stream.into_inner())
    }

    /// Reader settings
    pub fn settings(&self) -> &ArchiveReaderSettings {
        &self.settings
    }

    /// Header of the mounted archive
    pub fn header(&self) -> Option<&ArchiveHeader> {
        self.mounted.as_ref().map(|m| &m.header)
    }

    /// Number of files in the mounted archive, 0 when unmounted
    pub fn file_count(&self) -> usize {
        self.mounted.as_ref().map_or(0, |m| m.index.len())
    }

    /// Whether `path` is in the mounted archive
    pub fn contains_file(&self, path: &str) -> bool {
        self.resolve(&FileIdentifier::from(path)).is_some()
    }

    /// Token of `path`, if present
    pub fn find_file(&self, path: &str) -> Option<ArchiveFileToken> {
        self.resolve(&FileIdentifier::from(path)).map(|entry| entry.token)
    }

    /// Metadata of a file, `None` if absent or nothing is mounted
    pub fn list_file_in_archive(
        &self,
        identifier: impl Into<FileIdentifier>,
    ) -> Option<ArchiveListFileResult> {
        self.resolve(&identifier.into()).map(FileEntry::list_result)
    }

    /// Visit every file in table of contents order
    ///
    /// Returning `false` from `callback` stops the walk. Returns `false` only
    /// when nothing is mounted.
    pub fn enumerate_files_in_archive<F>(&self, mut callback: F) -> bool
    where
        F: FnMut(ArchiveListFileResult) -> bool,
    {
        let Some(mounted) = &self.mounted else {
            return false;
        };

        for entry in mounted.index.entries() {
            if !callback(entry.list_result()) {
                break;
            }
        }
        true
    }

    /// Write a text listing of the mounted archive
    pub fn dump_archive_metadata<W: io::Write + ?Sized>(
        &self,
        out: &mut W,
        settings: &ArchiveMetadataSettings,
    ) -> ArchiveResult<()> {
        let mounted = self.mounted.as_ref().ok_or(ArchiveError::NotMounted)?;
        write_metadata(out, mounted.index.entries(), settings)?;
        Ok(())
    }

    fn resolve(&self, identifier: &FileIdentifier) -> Option<&FileEntry> {
        let mounted = self.mounted.as_ref()?;
        mounted.index.resolve(identifier, mounted.path_case)
    }
}

impl<S: Read + Seek> ArchiveReader<S> {
    /// Create a reader and mount `stream`
    ///
    /// A stream that fails to mount still yields a reader, left unmounted,
    /// after the failure has been passed to the error callback.
    pub fn new(stream: S, settings: ArchiveReaderSettings) -> Self {
        let mut reader = Self::unmounted(settings);
        reader.mount_archive(stream);
        reader
    }

    /// Mount `stream`, reporting failure through the error callback
    ///
    /// Any previously mounted archive is unmounted first and its stream
    /// dropped; call [`unmount_archive`](Self::unmount_archive) beforehand to
    /// keep it.
    pub fn mount_archive(&mut self, stream: S) -> bool {
        match self.try_mount(stream) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to mount archive: {}", e);
                if let Some(callback) = &self.settings.error_callback {
                    callback(&e);
                }
                false
            }
        }
    }

    /// Mount `stream`, returning the failure instead of invoking the callback
    pub fn try_mount(&mut self, mut stream: S) -> Result<(), ArchiveReaderError> {
        self.mounted = None;

        let ArchiveLayout {
            header,
            path_case,
            index,
        } = layout::read_archive(&mut stream, &self.settings.registry)?;

        info!(
            "Mounted archive with {} files (table of contents at {})",
            index.len(),
            header.toc_offset
        );

        self.mounted = Some(MountedArchive {
            stream: Mutex::new(stream),
            header,
            path_case,
            index,
        });
        Ok(())
    }

    /// Extract bytes of a file into `out`
    ///
    /// Returns `Ok(None)` when the file is not in the archive. `out` must hold
    /// the requested byte count even when the file ends earlier; the returned
    /// `file_span` covers exactly the bytes read. When the whole file is
    /// decompressed its CRC32 is checked and reported; partial and raw reads
    /// report no checksum.
    pub fn extract_file_from_archive<'b>(
        &self,
        out: &'b mut [u8],
        file_settings: &ArchiveReaderFileSettings,
    ) -> ArchiveResult<Option<ArchiveExtractFileResult<'b>>> {
        let mounted = self.mounted.as_ref().ok_or(ArchiveError::NotMounted)?;
        let Some(entry) = mounted
            .index
            .resolve(&file_settings.file_path_identifier, mounted.path_case)
        else {
            debug!(
                "Extraction target {:?} not found",
                file_settings.file_path_identifier
            );
            return Ok(None);
        };

        let decompress = file_settings.decompress_file;
        let size = entry.readable_size(decompress);
        let start = file_settings.start_offset;
        if start > size {
            return Err(ArchiveError::InvalidRange { start, size });
        }
        let remaining = size - start;
        let requested = file_settings.bytes_to_read.unwrap_or(remaining);
        if !usize::try_from(requested).is_ok_and(|requested| requested <= out.len()) {
            return Err(ArchiveError::BufferTooSmall {
                required: requested,
                available: out.len(),
            });
        }
        // the buffer holds `requested` bytes, so the clamped length fits in usize
        let len = requested.min(remaining);
        let (span, _) = out.split_at_mut(len as usize);

        match entry.compression_algorithm.codec_id() {
            Some(id) if decompress && len > 0 => {
                let codec = self.settings.registry.require(id)?;
                mounted.read_chunks(entry, start..start + len, span, codec.as_ref())?;
            }
            _ => mounted.read_at(entry.offset + start, span)?,
        }

        let crc32 = if decompress && start == 0 && len == entry.uncompressed_size {
            let actual = crc32fast::hash(span);
            if actual != entry.crc32 {
                warn!(
                    "Checksum mismatch for {}: stored {:08x}, extracted {:08x}",
                    entry.relative_path, entry.crc32, actual
                );
                return Err(ArchiveError::ChecksumMismatch {
                    path: entry.relative_path.clone(),
                    expected: entry.crc32,
                    actual,
                });
            }
            Some(actual)
        } else {
            None
        };

        let file_span: &'b [u8] = span;
        Ok(Some(ArchiveExtractFileResult {
            file_path_token: entry.token,
            relative_file_path: entry.relative_path.clone(),
            compression_algorithm: entry.compression_algorithm,
            uncompressed_size: entry.uncompressed_size,
            compressed_size: entry.compressed_size,
            offset: entry.offset,
            file_span,
            crc32,
        }))
    }

    /// Decompress a whole file and check its CRC32
    ///
    /// Returns the verified checksum, or `Ok(None)` if the file is absent.
    pub fn verify_file(&self, identifier: impl Into<FileIdentifier>) -> ArchiveResult<Option<u32>> {
        let identifier = identifier.into();
        let Some(size) = self.resolve(&identifier).map(|entry| entry.uncompressed_size) else {
            return Ok(None);
        };

        let len = usize::try_from(size)
            .map_err(|_| ArchiveError::InvalidFormat(format!("{size} byte file exceeds memory")))?;
        let mut buffer = vec![0u8; len];
        let extracted =
            self.extract_file_from_archive(&mut buffer, &ArchiveReaderFileSettings::new(identifier))?;
        Ok(extracted.and_then(|result| result.crc32))
    }
}
