//! Block cipher modes of operation.
//!
//! ECB, CBC and CTR over any [`BlockCipher`](crate::provider::BlockCipher)
//! with a 16-byte block. Passing an [`Sm4`](crate::sm4::Sm4) context routes
//! the bulk work through its bound backend.

pub mod cbc;
pub mod ctr;
pub mod ecb;

use smlog_types::CryptoError;

pub(crate) const BLOCK_SIZE: usize = 16;

fn check_block_size<C: crate::provider::BlockCipher + ?Sized>(
    cipher: &C,
) -> Result<(), CryptoError> {
    if cipher.block_size() != BLOCK_SIZE {
        return Err(CryptoError::InvalidArg);
    }
    Ok(())
}

fn check_output(input: &[u8], output: &[u8]) -> Result<(), CryptoError> {
    if output.len() < input.len() {
        return Err(CryptoError::BufferTooSmall {
            need: input.len(),
            got: output.len(),
        });
    }
    Ok(())
}

#[inline]
fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}
