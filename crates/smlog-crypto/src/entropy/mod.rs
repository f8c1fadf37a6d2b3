//! Entropy collaborator.
//!
//! Key, IV and nonce generation never read the OS directly; they take an
//! [`EntropySource`]. [`SystemEntropy`] is the default, backed by
//! `getrandom`. Any failure surfaces as [`CryptoError::EntropyUnavailable`].
//!
//! # Example
//!
//! ```
//! use smlog_crypto::entropy::{EntropySource, SystemEntropy};
//!
//! let mut buf = [0u8; 16];
//! SystemEntropy.fill_random(&mut buf).expect("entropy acquisition failed");
//! ```

use smlog_types::CryptoError;

/// Trait for pluggable random-byte sources.
pub trait EntropySource {
    /// Fill `buf` entirely with random bytes, or fail without partial output.
    fn fill_random(&mut self, buf: &mut [u8]) -> Result<(), CryptoError>;
}

/// System entropy source wrapping `getrandom`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEntropy;

impl EntropySource for SystemEntropy {
    fn fill_random(&mut self, buf: &mut [u8]) -> Result<(), CryptoError> {
        getrandom::getrandom(buf).map_err(|e| {
            log::warn!("entropy: system source failed: {e}");
            CryptoError::EntropyUnavailable
        })
    }
}
