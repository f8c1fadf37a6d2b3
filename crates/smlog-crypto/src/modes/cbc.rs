//! CBC (Cipher Block Chaining) mode of operation.
//!
//! No padding is applied: input must be a multiple of 16 bytes. The IV is
//! updated in place to the last ciphertext block, so consecutive calls
//! chain exactly like one call over the concatenated input.

use super::{check_block_size, check_output, xor_in_place, BLOCK_SIZE};
use crate::provider::BlockCipher;
use smlog_types::{CryptoError, Direction};

/// Decryption is parallel in CBC; this many bytes go to the cipher at once.
const DECRYPT_GROUP: usize = 4 * BLOCK_SIZE;

fn check_args<C: BlockCipher + ?Sized>(
    cipher: &C,
    direction: Direction,
    len: usize,
) -> Result<(), CryptoError> {
    check_block_size(cipher)?;
    if cipher.direction() != direction {
        return Err(CryptoError::DirectionMismatch);
    }
    if len % BLOCK_SIZE != 0 {
        return Err(CryptoError::UnalignedLength {
            len,
            block: BLOCK_SIZE,
        });
    }
    Ok(())
}

/// CBC from `input` into the first `input.len()` bytes of `output`.
///
/// `direction` must match the direction `cipher` was keyed for.
pub fn cbc_crypt<C: BlockCipher + ?Sized>(
    cipher: &C,
    direction: Direction,
    iv: &mut [u8; BLOCK_SIZE],
    input: &[u8],
    output: &mut [u8],
) -> Result<(), CryptoError> {
    check_args(cipher, direction, input.len())?;
    check_output(input, output)?;
    let out = &mut output[..input.len()];
    out.copy_from_slice(input);
    match direction {
        Direction::Encrypt => encrypt_in_place(cipher, iv, out),
        Direction::Decrypt => decrypt_in_place(cipher, iv, out),
    }
}

/// CBC over `data` in place.
pub fn cbc_crypt_in_place<C: BlockCipher + ?Sized>(
    cipher: &C,
    direction: Direction,
    iv: &mut [u8; BLOCK_SIZE],
    data: &mut [u8],
) -> Result<(), CryptoError> {
    check_args(cipher, direction, data.len())?;
    match direction {
        Direction::Encrypt => encrypt_in_place(cipher, iv, data),
        Direction::Decrypt => decrypt_in_place(cipher, iv, data),
    }
}

fn encrypt_in_place<C: BlockCipher + ?Sized>(
    cipher: &C,
    iv: &mut [u8; BLOCK_SIZE],
    data: &mut [u8],
) -> Result<(), CryptoError> {
    let mut prev = *iv;
    for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
        xor_in_place(chunk, &prev);
        cipher.crypt_block(chunk)?;
        prev.copy_from_slice(chunk);
    }
    *iv = prev;
    Ok(())
}

fn decrypt_in_place<C: BlockCipher + ?Sized>(
    cipher: &C,
    iv: &mut [u8; BLOCK_SIZE],
    data: &mut [u8],
) -> Result<(), CryptoError> {
    let mut prev = *iv;
    let mut saved = [0u8; DECRYPT_GROUP];
    for group in data.chunks_mut(DECRYPT_GROUP) {
        let n = group.len();
        saved[..n].copy_from_slice(group);
        cipher.crypt_blocks(group)?;
        xor_in_place(&mut group[..BLOCK_SIZE], &prev);
        xor_in_place(&mut group[BLOCK_SIZE..], &saved[..n - BLOCK_SIZE]);
        prev.copy_from_slice(&saved[n - BLOCK_SIZE..n]);
    }
    *iv = prev;
    Ok(())
}

/// Draw a fresh random IV from `source`.
#[cfg(feature = "entropy")]
pub fn generate_iv<E: crate::entropy::EntropySource + ?Sized>(
    source: &mut E,
) -> Result<[u8; BLOCK_SIZE], CryptoError> {
    let mut iv = [0u8; BLOCK_SIZE];
    source.fill_random(&mut iv)?;
    Ok(iv)
}
