//! Human readable archive listings

use crate::entry::FileEntry;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Switches controlling [`dump_archive_metadata`](crate::ArchiveReader::dump_archive_metadata) output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ArchiveMetadataSettings {
    /// Emit the `Total File Count` line
    pub write_file_count: bool,
    /// Emit one line per file
    pub write_file_paths: bool,
    /// Append offsets to file lines
    pub write_file_offsets: bool,
    /// Append sizes and, for compressed files, the algorithm id
    pub write_file_sizes_and_compression: bool,
}

impl Default for ArchiveMetadataSettings {
    fn default() -> Self {
        Self {
            write_file_count: true,
            write_file_paths: true,
            write_file_offsets: true,
            write_file_sizes_and_compression: true,
        }
    }
}

pub(crate) fn write_metadata<W: Write + ?Sized>(
    out: &mut W,
    entries: &[FileEntry],
    settings: &ArchiveMetadataSettings,
) -> io::Result<()> {
    if settings.write_file_count {
        writeln!(out, "Total File Count: {}", entries.len())?;
    }

    if !settings.write_file_paths {
        return Ok(());
    }

    for (position, entry) in entries.iter().enumerate() {
        write!(out, "File {position}: path=\"{}\"", entry.relative_path)?;
        if settings.write_file_offsets {
            write!(out, ", offset={}", entry.offset)?;
        }
        if settings.write_file_sizes_and_compression {
            write!(out, ", uncompressed_size={}", entry.uncompressed_size)?;
            if let Some(id) = entry.compression_algorithm.codec_id() {
                write!(
                    out,
                    ", compressed_size={}, compression_algorithm_id={id}",
                    entry.compressed_size
                )?;
            }
        }
        writeln!(out)?;
    }

    Ok(())
}
