//! Unified hash module.
//!
//! Re-exports the digest implementations behind the [`Digest`] trait.

pub use crate::provider::Digest;

#[cfg(feature = "sm3")]
pub use crate::sm3::{Sm3, Sm3Backend, SM3_OUTPUT_SIZE};

/// Hash `data` with the algorithm named by `alg`.
#[cfg(feature = "sm3")]
pub fn digest(
    alg: smlog_types::HashAlgId,
    data: &[u8],
) -> Result<Vec<u8>, smlog_types::CryptoError> {
    match alg {
        smlog_types::HashAlgId::Sm3 => Ok(Sm3::digest(data)?.to_vec()),
    }
}
