//! CTR (Counter) mode of operation.
//!
//! The 16-byte counter block is one 128-bit big-endian integer that wraps
//! modulo 2^128. Keystream may be consumed at byte granularity across
//! calls through [`CtrState`].

use super::{check_block_size, check_output, xor_in_place, BLOCK_SIZE};
use crate::provider::BlockCipher;
use smlog_types::{CryptoError, Direction};
use zeroize::Zeroize;

/// Bytes of keystream produced per bulk call.
const BULK: usize = 4 * BLOCK_SIZE;

/// Increment a 128-bit big-endian counter by 1.
fn increment_counter(counter: &mut [u8; BLOCK_SIZE]) {
    for byte in counter.iter_mut().rev() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            break;
        }
    }
}

/// Caller-owned CTR streaming state.
///
/// When `nc_off == 0` the next keystream byte comes from a fresh block.
/// When `nc_off > 0`, `stream_block` holds the keystream for the previous
/// counter value and `nonce_counter` has already moved past it.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct CtrState {
    pub nonce_counter: [u8; BLOCK_SIZE],
    pub stream_block: [u8; BLOCK_SIZE],
    pub nc_off: usize,
}

impl CtrState {
    /// Start a fresh stream at `nonce_counter`.
    pub fn new(nonce_counter: [u8; BLOCK_SIZE]) -> Self {
        Self {
            nonce_counter,
            stream_block: [0u8; BLOCK_SIZE],
            nc_off: 0,
        }
    }

    /// Start a fresh stream at a random counter block drawn from `source`.
    #[cfg(feature = "entropy")]
    pub fn with_random_nonce<E: crate::entropy::EntropySource + ?Sized>(
        source: &mut E,
    ) -> Result<Self, CryptoError> {
        let mut nonce = [0u8; BLOCK_SIZE];
        source.fill_random(&mut nonce)?;
        Ok(Self::new(nonce))
    }
}

/// CTR from `input` into the first `input.len()` bytes of `output`.
///
/// Encryption and decryption are the same operation. `cipher` must be an
/// encryption schedule. With `nc_off == 0` and at least four blocks left,
/// keystream is generated four blocks at a time through
/// [`BlockCipher::crypt_blocks`].
pub fn ctr_crypt<C: BlockCipher + ?Sized>(
    cipher: &C,
    state: &mut CtrState,
    input: &[u8],
    output: &mut [u8],
) -> Result<(), CryptoError> {
    check_args(cipher, state)?;
    check_output(input, output)?;
    let out = &mut output[..input.len()];
    out.copy_from_slice(input);
    apply_keystream(cipher, state, out)
}

/// CTR over `data` in place.
pub fn ctr_crypt_in_place<C: BlockCipher + ?Sized>(
    cipher: &C,
    state: &mut CtrState,
    data: &mut [u8],
) -> Result<(), CryptoError> {
    check_args(cipher, state)?;
    apply_keystream(cipher, state, data)
}

fn check_args<C: BlockCipher + ?Sized>(cipher: &C, state: &CtrState) -> Result<(), CryptoError> {
    check_block_size(cipher)?;
    if cipher.direction() != Direction::Encrypt {
        return Err(CryptoError::DirectionMismatch);
    }
    if state.nc_off >= BLOCK_SIZE {
        return Err(CryptoError::StreamOffset(state.nc_off));
    }
    Ok(())
}

fn apply_keystream<C: BlockCipher + ?Sized>(
    cipher: &C,
    state: &mut CtrState,
    data: &mut [u8],
) -> Result<(), CryptoError> {
    let n = data.len();
    let mut pos = 0;

    // Drain what is left of the cached keystream block.
    while state.nc_off != 0 && pos < n {
        data[pos] ^= state.stream_block[state.nc_off];
        state.nc_off = (state.nc_off + 1) % BLOCK_SIZE;
        pos += 1;
    }

    let mut ks = [0u8; BULK];
    while n - pos >= BULK {
        for lane in ks.chunks_exact_mut(BLOCK_SIZE) {
            lane.copy_from_slice(&state.nonce_counter);
            increment_counter(&mut state.nonce_counter);
        }
        cipher.crypt_blocks(&mut ks)?;
        xor_in_place(&mut data[pos..pos + BULK], &ks);
        pos += BULK;
    }
    ks.zeroize();

    while pos < n {
        if state.nc_off == 0 {
            state.stream_block = state.nonce_counter;
            cipher.crypt_block(&mut state.stream_block)?;
            increment_counter(&mut state.nonce_counter);
        }
        data[pos] ^= state.stream_block[state.nc_off];
        state.nc_off = (state.nc_off + 1) % BLOCK_SIZE;
        pos += 1;
    }
    Ok(())
}
