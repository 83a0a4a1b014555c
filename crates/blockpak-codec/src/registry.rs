//! Codec registry
//!
//! The registry is an ordinary value handed to archive readers and writers,
//! so tests can swap in fake codecs without touching process-wide state.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::algorithm::CompressionAlgorithmId;
use crate::codec::Codec;
use crate::error::{CodecError, CodecResult};
use crate::lz4::Lz4Codec;
use crate::zlib::ZlibCodec;

/// Lookup table from algorithm identifier to codec implementation
#[derive(Debug, Clone, Default)]
pub struct CodecRegistry {
    codecs: HashMap<CompressionAlgorithmId, Arc<dyn Codec>>,
}

impl CodecRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in LZ4 and zlib codecs
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.codecs.insert(CompressionAlgorithmId::LZ4, Arc::new(Lz4Codec));
        registry
            .codecs
            .insert(CompressionAlgorithmId::ZLIB, Arc::new(ZlibCodec::default()));
        registry
    }

    /// Register a codec under its own identifier
    pub fn register(&mut self, codec: Arc<dyn Codec>) -> CodecResult<()> {
        let id = codec.id();
        if id.get() == 0 {
            return Err(CodecError::ReservedAlgorithmId);
        }
        if self.codecs.contains_key(&id) {
            return Err(CodecError::AlreadyRegistered(id));
        }

        debug!("Registering {} codec with id {}", codec.name(), id);
        self.codecs.insert(id, codec);
        Ok(())
    }

    /// Register a codec, replacing any codec with the same identifier
    pub fn replace(&mut self, codec: Arc<dyn Codec>) -> CodecResult<Option<Arc<dyn Codec>>> {
        let id = codec.id();
        if id.get() == 0 {
            return Err(CodecError::ReservedAlgorithmId);
        }
        Ok(self.codecs.insert(id, codec))
    }

    /// Look up a codec
    pub fn get(&self, id: CompressionAlgorithmId) -> Option<Arc<dyn Codec>> {
        self.codecs.get(&id).cloned()
    }

    /// Look up a codec, failing if it is not registered
    pub fn require(&self, id: CompressionAlgorithmId) -> CodecResult<Arc<dyn Codec>> {
        self.get(id).ok_or(CodecError::NotRegistered(id))
    }

    /// Whether a codec is registered for `id`
    pub fn contains(&self, id: CompressionAlgorithmId) -> bool {
        self.codecs.contains_key(&id)
    }

    /// Registered identifiers in ascending order
    pub fn ids(&self) -> Vec<CompressionAlgorithmId> {
        let mut ids: Vec<_> = self.codecs.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered codecs
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Whether no codecs are registered
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}
