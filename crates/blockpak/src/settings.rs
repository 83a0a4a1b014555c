//! Writer and reader settings

use crate::error::ArchiveReaderError;
use crate::path::FilePathCase;
use crate::token::ArchiveFileToken;
use blockpak_codec::{CodecRegistry, CompressionAlgorithm};
use std::fmt;
use std::sync::Arc;

/// Callback receiving mount failures
pub type ErrorCallback = Arc<dyn Fn(&ArchiveReaderError) + Send + Sync>;

/// Archive-wide writer configuration
#[derive(Debug, Clone)]
pub struct ArchiveWriterSettings {
    /// Codecs available to file and table of contents compression
    pub registry: Arc<CodecRegistry>,

    /// Case applied to stored paths
    pub path_case: FilePathCase,

    /// Algorithm used for the table of contents
    pub toc_compression: CompressionAlgorithm,

    /// Store a file uncompressed when any compressed chunk exceeds this size
    pub compression_threshold: Option<u32>,
}

impl Default for ArchiveWriterSettings {
    fn default() -> Self {
        Self {
            registry: Arc::new(CodecRegistry::with_defaults()),
            path_case: FilePathCase::default(),
            toc_compression: CompressionAlgorithm::Uncompressed,
            compression_threshold: None,
        }
    }
}

impl ArchiveWriterSettings {
    /// Use a specific codec registry
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<CodecRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Set the stored path case
    #[must_use]
    pub const fn with_path_case(mut self, path_case: FilePathCase) -> Self {
        self.path_case = path_case;
        self
    }

    /// Compress the table of contents
    #[must_use]
    pub const fn with_toc_compression(mut self, algorithm: CompressionAlgorithm) -> Self {
        self.toc_compression = algorithm;
        self
    }

    /// Set the per-chunk compressed size limit
    #[must_use]
    pub const fn with_compression_threshold(mut self, threshold: u32) -> Self {
        self.compression_threshold = Some(threshold);
        self
    }
}

/// Per-file writer options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveWriterFileSettings {
    /// Path inside the archive, normalized before use
    pub relative_file_path: String,

    /// Requested storage algorithm
    pub compression_algorithm: CompressionAlgorithm,
}

impl ArchiveWriterFileSettings {
    /// Store `path` uncompressed
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            relative_file_path: path.into(),
            compression_algorithm: CompressionAlgorithm::Uncompressed,
        }
    }

    /// Set the storage algorithm
    #[must_use]
    pub const fn with_compression(mut self, algorithm: CompressionAlgorithm) -> Self {
        self.compression_algorithm = algorithm;
        self
    }
}

/// Reader configuration
#[derive(Clone)]
pub struct ArchiveReaderSettings {
    /// Codecs available for decompression
    pub registry: Arc<CodecRegistry>,

    /// Invoked synchronously when a mount fails
    pub error_callback: Option<ErrorCallback>,
}

impl Default for ArchiveReaderSettings {
    fn default() -> Self {
        Self {
            registry: Arc::new(CodecRegistry::with_defaults()),
            error_callback: None,
        }
    }
}

impl fmt::Debug for ArchiveReaderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveReaderSettings")
            .field("registry", &self.registry)
            .field("error_callback", &self.error_callback.is_some())
            .finish()
    }
}

impl ArchiveReaderSettings {
    /// Use a specific codec registry
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<CodecRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Set the mount failure callback
    #[must_use]
    pub fn with_error_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&ArchiveReaderError) + Send + Sync + 'static,
    {
        self.error_callback = Some(Arc::new(callback));
        self
    }
}

/// Addresses a file by path or by token
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileIdentifier {
    /// Relative path, normalized with the archive's path case
    Path(String),
    /// Token from a previous lookup
    Token(ArchiveFileToken),
}

impl Default for FileIdentifier {
    fn default() -> Self {
        Self::Token(ArchiveFileToken::INVALID)
    }
}

impl From<&str> for FileIdentifier {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}

impl From<String> for FileIdentifier {
    fn from(path: String) -> Self {
        Self::Path(path)
    }
}

impl From<&String> for FileIdentifier {
    fn from(path: &String) -> Self {
        Self::Path(path.clone())
    }
}

impl From<ArchiveFileToken> for FileIdentifier {
    fn from(token: ArchiveFileToken) -> Self {
        Self::Token(token)
    }
}

/// Per-extraction options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReaderFileSettings {
    /// File to extract
    pub file_path_identifier: FileIdentifier,

    /// First byte to read; uncompressed coordinates when decompressing,
    /// stored coordinates otherwise
    pub start_offset: u64,

    /// Number of bytes to read, `None` for everything after `start_offset`
    pub bytes_to_read: Option<u64>,

    /// Decompress, or copy the stored bytes verbatim
    pub decompress_file: bool,
}

impl Default for ArchiveReaderFileSettings {
    fn default() -> Self {
        Self {
            file_path_identifier: FileIdentifier::default(),
            start_offset: 0,
            bytes_to_read: None,
            decompress_file: true,
        }
    }
}

impl ArchiveReaderFileSettings {
    /// Extract all of `identifier`, decompressed
    pub fn new(identifier: impl Into<FileIdentifier>) -> Self {
        Self {
            file_path_identifier: identifier.into(),
            ..Default::default()
        }
    }

    /// Read `len` bytes starting at `start`
    #[must_use]
    pub const fn with_range(mut self, start: u64, len: u64) -> Self {
        self.start_offset = start;
        self.bytes_to_read = Some(len);
        self
    }

    /// Set the first byte to read
    #[must_use]
    pub const fn with_start_offset(mut self, start: u64) -> Self {
        self.start_offset = start;
        self
    }

    /// Limit the number of bytes read
    #[must_use]
    pub const fn with_bytes_to_read(mut self, len: u64) -> Self {
        self.bytes_to_read = Some(len);
        self
    }

    /// Copy stored bytes without decompressing
    #[must_use]
    pub const fn raw(mut self) -> Self {
        self.decompress_file = false;
        self
    }
}
