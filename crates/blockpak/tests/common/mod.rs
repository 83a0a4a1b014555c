//! Shared helpers for archive integration tests
#![allow(dead_code)]

use blockpak::{
    ArchiveWriter, ArchiveWriterFileSettings, ArchiveWriterSettings, Codec, CodecError,
    CodecRegistry, CompressionAlgorithm, CompressionAlgorithmId,
};
use blockpak_codec::Lz4Codec;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing_subscriber::EnvFilter;

/// Identifier of [`CountingCodec`]
pub const COUNTING_CODEC_ID: CompressionAlgorithmId = CompressionAlgorithmId::new(0x100);

/// LZ4 wrapper that counts block calls
#[derive(Debug, Default)]
pub struct CountingCodec {
    inner: Lz4Codec,
    compressions: AtomicUsize,
    decompressions: AtomicUsize,
}

impl CountingCodec {
    pub fn algorithm() -> CompressionAlgorithm {
        CompressionAlgorithm::Registered(COUNTING_CODEC_ID)
    }

    pub fn compressions(&self) -> usize {
        self.compressions.load(Ordering::SeqCst)
    }

    pub fn decompressions(&self) -> usize {
        self.decompressions.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.compressions.store(0, Ordering::SeqCst);
        self.decompressions.store(0, Ordering::SeqCst);
    }
}

impl Codec for CountingCodec {
    fn id(&self) -> CompressionAlgorithmId {
        COUNTING_CODEC_ID
    }

    fn name(&self) -> &'static str {
        "counting-lz4"
    }

    fn compress_bound(&self, uncompressed_len: usize) -> usize {
        self.inner.compress_bound(uncompressed_len)
    }

    fn compress_block(&self, dst: &mut [u8], src: &[u8]) -> Result<usize, CodecError> {
        self.compressions.fetch_add(1, Ordering::SeqCst);
        self.inner.compress_block(dst, src)
    }

    fn decompress_block(&self, dst: &mut [u8], src: &[u8]) -> Result<usize, CodecError> {
        self.decompressions.fetch_add(1, Ordering::SeqCst);
        self.inner.decompress_block(dst, src)
    }
}

/// Built-in codecs plus a fresh [`CountingCodec`]
pub fn counting_registry() -> (Arc<CodecRegistry>, Arc<CountingCodec>) {
    let codec = Arc::new(CountingCodec::default());
    let mut registry = CodecRegistry::with_defaults();
    registry
        .register(Arc::clone(&codec) as Arc<dyn Codec>)
        .unwrap();
    (Arc::new(registry), codec)
}

/// Identifier of [`FailingCodec`]
pub const FAILING_CODEC_ID: CompressionAlgorithmId = CompressionAlgorithmId::new(0x101);

/// LZ4 wrapper whose compressor fails on one chunk of the first file it sees
#[derive(Debug)]
pub struct FailingCodec {
    inner: Lz4Codec,
    fail_at: usize,
    calls: AtomicUsize,
}

impl FailingCodec {
    pub fn new(fail_at: usize) -> Self {
        Self {
            inner: Lz4Codec,
            fail_at,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn algorithm() -> CompressionAlgorithm {
        CompressionAlgorithm::Registered(FAILING_CODEC_ID)
    }
}

impl Codec for FailingCodec {
    fn id(&self) -> CompressionAlgorithmId {
        FAILING_CODEC_ID
    }

    fn name(&self) -> &'static str {
        "failing-lz4"
    }

    fn compress_bound(&self, uncompressed_len: usize) -> usize {
        self.inner.compress_bound(uncompressed_len)
    }

    fn compress_block(&self, dst: &mut [u8], src: &[u8]) -> Result<usize, CodecError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == self.fail_at {
            return Err(CodecError::CompressionFailed {
                codec: self.name(),
                reason: "injected failure".to_string(),
            });
        }
        self.inner.compress_block(dst, src)
    }

    fn decompress_block(&self, dst: &mut [u8], src: &[u8]) -> Result<usize, CodecError> {
        self.inner.decompress_block(dst, src)
    }
}

/// Built-in codecs plus a [`FailingCodec`] that fails on call `fail_at`
pub fn failing_registry(fail_at: usize) -> Arc<CodecRegistry> {
    let mut registry = CodecRegistry::with_defaults();
    registry
        .register(Arc::new(FailingCodec::new(fail_at)) as Arc<dyn Codec>)
        .unwrap();
    Arc::new(registry)
}

/// Write `files` into an in-memory archive and commit it
pub fn build_archive(
    settings: ArchiveWriterSettings,
    files: &[(&str, &[u8], CompressionAlgorithm)],
) -> Vec<u8> {
    let mut writer = ArchiveWriter::create(Cursor::new(Vec::new()), settings).unwrap();
    for (path, data, algorithm) in files {
        writer
            .add_file_to_archive(
                data,
                &ArchiveWriterFileSettings::new(*path).with_compression(*algorithm),
            )
            .unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Deterministic bytes that compress poorly
pub fn noise(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(747_796_405).wrapping_add(2_891_336_453);
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        })
        .collect()
}

/// Match `text` against a pattern where `*` spans any run and `?` one char
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = star {
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

/// Route library logs to the test harness, filtered by `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
