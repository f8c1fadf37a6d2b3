//! Trait-based provider mechanism for cryptographic algorithms.
//!
//! Modes of operation and the Merkle layer are written against these
//! traits, so a backend is chosen once when a context is built and every
//! later call is statically dispatched.

use smlog_types::{CryptoError, Direction};

/// A hash / message digest algorithm.
pub trait Digest: Send + Sync {
    /// The output size in bytes.
    fn output_size(&self) -> usize;

    /// The internal block size in bytes.
    fn block_size(&self) -> usize;

    /// Feed data into the hash state.
    fn update(&mut self, data: &[u8]) -> Result<(), CryptoError>;

    /// Finalize the hash and write the digest to `out`.
    /// The length of `out` must be at least `output_size()`.
    fn finish(&mut self, out: &mut [u8]) -> Result<(), CryptoError>;

    /// Reset the hash state to process a new message.
    fn reset(&mut self);
}

/// A block cipher key schedule bound to one direction (e.g. SM4).
pub trait BlockCipher: Send + Sync {
    /// Block size in bytes.
    fn block_size(&self) -> usize;

    /// Key size in bytes.
    fn key_size(&self) -> usize;

    /// Whether the schedule encrypts or decrypts.
    fn direction(&self) -> Direction;

    /// Apply the block function to a single block in place.
    fn crypt_block(&self, block: &mut [u8]) -> Result<(), CryptoError>;

    /// Apply the block function to consecutive blocks in place.
    ///
    /// `data.len()` must be a multiple of `block_size()`. Implementations
    /// with a multi-block path override this.
    fn crypt_blocks(&self, data: &mut [u8]) -> Result<(), CryptoError> {
        let bs = self.block_size();
        if data.len() % bs != 0 {
            return Err(CryptoError::UnalignedLength {
                len: data.len(),
                block: bs,
            });
        }
        for chunk in data.chunks_exact_mut(bs) {
            self.crypt_block(chunk)?;
        }
        Ok(())
    }
}
