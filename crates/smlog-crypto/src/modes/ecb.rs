//! ECB (Electronic Codebook) mode of operation.
//!
//! **Security warning**: ECB mode does not provide semantic security and
//! should generally not be used. It is provided for completeness and
//! specific low-level use cases only.

use super::{check_block_size, check_output, BLOCK_SIZE};
use crate::provider::BlockCipher;
use smlog_types::CryptoError;

/// Apply ECB in place. The length must be a multiple of 16; empty input is a no-op.
pub fn ecb_crypt_in_place<C: BlockCipher + ?Sized>(
    cipher: &C,
    data: &mut [u8],
) -> Result<(), CryptoError> {
    check_block_size(cipher)?;
    if data.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::UnalignedLength {
            len: data.len(),
            block: BLOCK_SIZE,
        });
    }
    cipher.crypt_blocks(data)
}

/// Apply ECB from `input` into the first `input.len()` bytes of `output`.
pub fn ecb_crypt<C: BlockCipher + ?Sized>(
    cipher: &C,
    input: &[u8],
    output: &mut [u8],
) -> Result<(), CryptoError> {
    check_block_size(cipher)?;
    if input.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::UnalignedLength {
            len: input.len(),
            block: BLOCK_SIZE,
        });
    }
    check_output(input, output)?;
    let out = &mut output[..input.len()];
    out.copy_from_slice(input);
    cipher.crypt_blocks(out)
}
