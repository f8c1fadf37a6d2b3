//! SM3 cryptographic hash algorithm.
//!
//! SM3 is a 256-bit cryptographic hash function standardized by the Chinese
//! government (GB/T 32905-2016). It is structurally similar to SHA-256 and
//! is widely used in Chinese commercial cryptography alongside SM2 and SM4.

mod batch;
pub(crate) mod compress;
mod multiway;

pub use batch::{Sm3Backend, BATCH_MIN_BLOCKS};
pub use multiway::SM3_LANES;

use batch::compress_blocks;
use compress::{compress, IV};
use smlog_types::CryptoError;

/// SM3 output size in bytes.
pub const SM3_OUTPUT_SIZE: usize = 32;

/// SM3 block size in bytes.
pub const SM3_BLOCK_SIZE: usize = 64;

/// Longest message whose bit length fits the 64-bit length field.
const MAX_MESSAGE_BYTES: u64 = u64::MAX >> 3;

/// Number of compression calls a message of `len` bytes needs once padded.
///
/// `None` for lengths whose bit count does not fit the 64-bit length field.
pub fn padded_blocks(len: u64) -> Option<u64> {
    if len > MAX_MESSAGE_BYTES {
        return None;
    }
    // 0x80 marker + 8-byte length
    Some((len + 9).div_ceil(SM3_BLOCK_SIZE as u64))
}

/// SM3 hash context.
#[derive(Clone)]
pub struct Sm3 {
    /// Internal state (eight 32-bit words).
    state: [u32; 8],
    /// Number of bytes processed so far.
    count: u64,
    /// Partial block buffer.
    buffer: [u8; SM3_BLOCK_SIZE],
    /// Number of bytes in the buffer.
    buffer_len: usize,
    backend: Sm3Backend,
}

impl Sm3 {
    /// Create a new SM3 hash context on the best available backend.
    pub fn new() -> Self {
        Self::with_resolved(Sm3Backend::best())
    }

    /// Create a context on a specific backend.
    pub fn with_backend(backend: Sm3Backend) -> Result<Self, CryptoError> {
        let backend = backend.resolve()?;
        log::debug!("sm3: {} backend bound", backend.name());
        Ok(Self::with_resolved(backend))
    }

    fn with_resolved(backend: Sm3Backend) -> Self {
        Self {
            state: IV,
            count: 0,
            buffer: [0u8; SM3_BLOCK_SIZE],
            buffer_len: 0,
            backend,
        }
    }

    /// The resolved backend. Never [`Sm3Backend::Auto`].
    pub fn backend(&self) -> Sm3Backend {
        self.backend
    }

    /// Feed data into the hash computation.
    pub fn update(&mut self, mut data: &[u8]) -> Result<(), CryptoError> {
        let count = self
            .count
            .checked_add(data.len() as u64)
            .filter(|&c| c <= MAX_MESSAGE_BYTES)
            .ok_or(CryptoError::InvalidArg)?;
        self.count = count;

        if self.buffer_len > 0 {
            let take = (SM3_BLOCK_SIZE - self.buffer_len).min(data.len());
            self.buffer[self.buffer_len..self.buffer_len + take].copy_from_slice(&data[..take]);
            self.buffer_len += take;
            data = &data[take..];
            if self.buffer_len < SM3_BLOCK_SIZE {
                return Ok(());
            }
            compress(&mut self.state, &self.buffer);
            self.buffer_len = 0;
        }

        let whole = data.len() - data.len() % SM3_BLOCK_SIZE;
        if whole > 0 {
            compress_blocks(self.backend, &mut self.state, &data[..whole]);
            data = &data[whole..];
        }

        self.buffer[..data.len()].copy_from_slice(data);
        self.buffer_len = data.len();
        Ok(())
    }

    /// Finalize the hash and return the 32-byte digest.
    ///
    /// The context is reset afterwards and can hash a new message.
    pub fn finish(&mut self) -> Result<[u8; SM3_OUTPUT_SIZE], CryptoError> {
        let bit_len = self.count << 3;
        let mut n = self.buffer_len;
        self.buffer[n] = 0x80;
        n += 1;
        if n > SM3_BLOCK_SIZE - 8 {
            self.buffer[n..].fill(0);
            compress(&mut self.state, &self.buffer);
            n = 0;
        }
        self.buffer[n..SM3_BLOCK_SIZE - 8].fill(0);
        self.buffer[SM3_BLOCK_SIZE - 8..].copy_from_slice(&bit_len.to_be_bytes());
        compress(&mut self.state, &self.buffer);

        let mut out = [0u8; SM3_OUTPUT_SIZE];
        for (chunk, word) in out.chunks_exact_mut(4).zip(self.state.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        self.reset();
        Ok(out)
    }

    /// Reset the hash context for a new computation.
    pub fn reset(&mut self) {
        self.state = IV;
        self.count = 0;
        self.buffer = [0u8; SM3_BLOCK_SIZE];
        self.buffer_len = 0;
    }

    /// One-shot: compute the SM3 digest of `data`.
    pub fn digest(data: &[u8]) -> Result<[u8; SM3_OUTPUT_SIZE], CryptoError> {
        let mut ctx = Self::new();
        ctx.update(data)?;
        ctx.finish()
    }
}

impl Default for Sm3 {
    fn default() -> Self {
        Self::new()
    }
}

impl crate::provider::Digest for Sm3 {
    fn output_size(&self) -> usize {
        SM3_OUTPUT_SIZE
    }

    fn block_size(&self) -> usize {
        SM3_BLOCK_SIZE
    }

    fn update(&mut self, data: &[u8]) -> Result<(), CryptoError> {
        Sm3::update(self, data)
    }

    fn finish(&mut self, out: &mut [u8]) -> Result<(), CryptoError> {
        if out.len() < SM3_OUTPUT_SIZE {
            return Err(CryptoError::BufferTooSmall {
                need: SM3_OUTPUT_SIZE,
                got: out.len(),
            });
        }
        let digest = Sm3::finish(self)?;
        out[..SM3_OUTPUT_SIZE].copy_from_slice(&digest);
        Ok(())
    }

    fn reset(&mut self) {
        Sm3::reset(self)
    }
}
