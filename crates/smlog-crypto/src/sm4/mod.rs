//! SM4 block cipher implementation.
//!
//! SM4 is a 128-bit block cipher standardized by the Chinese government
//! (GB/T 32907-2016). It uses a 128-bit key and 32 rounds of an unbalanced
//! Feistel structure built from a byte S-box and a word-level linear map.
//!
//! [`Sm4Key`] is the portable reference path. [`Sm4`] binds a key to the
//! fastest backend the CPU supports (see [`dispatch`]).

pub mod dispatch;
pub(crate) mod table;

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
pub(crate) mod simd;

pub use dispatch::{Sm4, Sm4Backend};

use smlog_types::{CryptoError, Direction};
use zeroize::Zeroize;

/// SM4 block size in bytes (128 bits).
pub const SM4_BLOCK_SIZE: usize = 16;

/// SM4 key size in bytes (128 bits).
pub const SM4_KEY_SIZE: usize = 16;

/// Number of rounds (and round keys).
pub const SM4_ROUNDS: usize = 32;

pub(crate) const SBOX: [u8; 256] = [
    0xd6, 0x90, 0xe9, 0xfe, 0xcc, 0xe1, 0x3d, 0xb7, 0x16, 0xb6, 0x14, 0xc2, 0x28, 0xfb, 0x2c, 0x05,
    0x2b, 0x67, 0x9a, 0x76, 0x2a, 0xbe, 0x04, 0xc3, 0xaa, 0x44, 0x13, 0x26, 0x49, 0x86, 0x06, 0x99,
    0x9c, 0x42, 0x50, 0xf4, 0x91, 0xef, 0x98, 0x7a, 0x33, 0x54, 0x0b, 0x43, 0xed, 0xcf, 0xac, 0x62,
    0xe4, 0xb3, 0x1c, 0xa9, 0xc9, 0x08, 0xe8, 0x95, 0x80, 0xdf, 0x94, 0xfa, 0x75, 0x8f, 0x3f, 0xa6,
    0x47, 0x07, 0xa7, 0xfc, 0xf3, 0x73, 0x17, 0xba, 0x83, 0x59, 0x3c, 0x19, 0xe6, 0x85, 0x4f, 0xa8,
    0x68, 0x6b, 0x81, 0xb2, 0x71, 0x64, 0xda, 0x8b, 0xf8, 0xeb, 0x0f, 0x4b, 0x70, 0x56, 0x9d, 0x35,
    0x1e, 0x24, 0x0e, 0x5e, 0x63, 0x58, 0xd1, 0xa2, 0x25, 0x22, 0x7c, 0x3b, 0x01, 0x21, 0x78, 0x87,
    0xd4, 0x00, 0x46, 0x57, 0x9f, 0xd3, 0x27, 0x52, 0x4c, 0x36, 0x02, 0xe7, 0xa0, 0xc4, 0xc8, 0x9e,
    0xea, 0xbf, 0x8a, 0xd2, 0x40, 0xc7, 0x38, 0xb5, 0xa3, 0xf7, 0xf2, 0xce, 0xf9, 0x61, 0x15, 0xa1,
    0xe0, 0xae, 0x5d, 0xa4, 0x9b, 0x34, 0x1a, 0x55, 0xad, 0x93, 0x32, 0x30, 0xf5, 0x8c, 0xb1, 0xe3,
    0x1d, 0xf6, 0xe2, 0x2e, 0x82, 0x66, 0xca, 0x60, 0xc0, 0x29, 0x23, 0xab, 0x0d, 0x53, 0x4e, 0x6f,
    0xd5, 0xdb, 0x37, 0x45, 0xde, 0xfd, 0x8e, 0x2f, 0x03, 0xff, 0x6a, 0x72, 0x6d, 0x6c, 0x5b, 0x51,
    0x8d, 0x1b, 0xaf, 0x92, 0xbb, 0xdd, 0xbc, 0x7f, 0x11, 0xd9, 0x5c, 0x41, 0x1f, 0x10, 0x5a, 0xd8,
    0x0a, 0xc1, 0x31, 0x88, 0xa5, 0xcd, 0x7b, 0xbd, 0x2d, 0x74, 0xd0, 0x12, 0xb8, 0xe5, 0xb4, 0xb0,
    0x89, 0x69, 0x97, 0x4a, 0x0c, 0x96, 0x77, 0x7e, 0x65, 0xb9, 0xf1, 0x09, 0xc5, 0x6e, 0xc6, 0x84,
    0x18, 0xf0, 0x7d, 0xec, 0x3a, 0xdc, 0x4d, 0x20, 0x79, 0xee, 0x5f, 0x3e, 0xd7, 0xcb, 0x39, 0x48,
];

/// System parameter XORed into the key before expansion.
const FK: [u32; 4] = [0xa3b1bac6, 0x56aa3350, 0x677d9197, 0xb27022dc];

/// Round constants: byte j of CK[i] is (4i + j) * 7 mod 256.
const CK: [u32; SM4_ROUNDS] = [
    0x00070e15, 0x1c232a31, 0x383f464d, 0x545b6269, 0x70777e85, 0x8c939aa1, 0xa8afb6bd, 0xc4cbd2d9,
    0xe0e7eef5, 0xfc030a11, 0x181f262d, 0x343b4249, 0x50575e65, 0x6c737a81, 0x888f969d, 0xa4abb2b9,
    0xc0c7ced5, 0xdce3eaf1, 0xf8ff060d, 0x141b2229, 0x30373e45, 0x4c535a61, 0x686f767d, 0x848b9299,
    0xa0a7aeb5, 0xbcc3cad1, 0xd8dfe6ed, 0xf4fb0209, 0x10171e25, 0x2c333a41, 0x484f565d, 0x646b7279,
];

// ---------------------------------------------------------------------------
// Round primitives
// ---------------------------------------------------------------------------

/// Apply the S-box to each byte of a 32-bit word.
#[inline(always)]
pub(crate) fn tau(a: u32) -> u32 {
    let b = a.to_be_bytes();
    u32::from_be_bytes([
        SBOX[b[0] as usize],
        SBOX[b[1] as usize],
        SBOX[b[2] as usize],
        SBOX[b[3] as usize],
    ])
}

/// Linear transform of the encryption round.
#[inline(always)]
pub(crate) fn l(b: u32) -> u32 {
    b ^ b.rotate_left(2) ^ b.rotate_left(10) ^ b.rotate_left(18) ^ b.rotate_left(24)
}

/// Linear transform of the key schedule.
#[inline(always)]
fn l_key(b: u32) -> u32 {
    b ^ b.rotate_left(13) ^ b.rotate_left(23)
}

#[inline(always)]
pub(crate) fn load_words(block: &[u8; SM4_BLOCK_SIZE]) -> [u32; 4] {
    [
        u32::from_be_bytes([block[0], block[1], block[2], block[3]]),
        u32::from_be_bytes([block[4], block[5], block[6], block[7]]),
        u32::from_be_bytes([block[8], block[9], block[10], block[11]]),
        u32::from_be_bytes([block[12], block[13], block[14], block[15]]),
    ]
}

/// Write the final state `(X35, X34, X33, X32)` back big-endian.
#[inline(always)]
pub(crate) fn store_words_reversed(x: &[u32; 4], block: &mut [u8; SM4_BLOCK_SIZE]) {
    block[0..4].copy_from_slice(&x[3].to_be_bytes());
    block[4..8].copy_from_slice(&x[2].to_be_bytes());
    block[8..12].copy_from_slice(&x[1].to_be_bytes());
    block[12..16].copy_from_slice(&x[0].to_be_bytes());
}

/// Expand a 16-byte key into 32 encryption round keys.
fn expand_key(key: &[u8; SM4_KEY_SIZE]) -> [u32; SM4_ROUNDS] {
    let mw = load_words(key);
    let mut k = [mw[0] ^ FK[0], mw[1] ^ FK[1], mw[2] ^ FK[2], mw[3] ^ FK[3]];
    let mut rk = [0u32; SM4_ROUNDS];
    for i in 0..SM4_ROUNDS {
        let next = k[0] ^ l_key(tau(k[1] ^ k[2] ^ k[3] ^ CK[i]));
        rk[i] = next;
        k = [k[1], k[2], k[3], next];
    }
    k.zeroize();
    rk
}

/// The portable block function: 32 rounds with an S-box lookup per byte.
pub(crate) fn crypt_block_basic(rk: &[u32; SM4_ROUNDS], block: &mut [u8; SM4_BLOCK_SIZE]) {
    let mut x = load_words(block);
    for &k in rk.iter() {
        let next = x[0] ^ l(tau(x[1] ^ x[2] ^ x[3] ^ k));
        x = [x[1], x[2], x[3], next];
    }
    store_words_reversed(&x, block);
}

// ---------------------------------------------------------------------------
// Sm4Key
// ---------------------------------------------------------------------------

/// An SM4 key with precomputed round keys, bound to one direction.
///
/// The decryption schedule is the encryption schedule in reverse order, so
/// the same round function serves both directions.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Sm4Key {
    /// Precomputed round keys (32 rounds), already in application order.
    round_keys: [u32; SM4_ROUNDS],
    #[zeroize(skip)]
    direction: Direction,
}

impl Sm4Key {
    /// Create an encryption key from 16 raw bytes.
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        Self::with_direction(key, Direction::Encrypt)
    }

    /// Create a decryption key from 16 raw bytes.
    pub fn new_decrypt(key: &[u8]) -> Result<Self, CryptoError> {
        Self::with_direction(key, Direction::Decrypt)
    }

    /// Run the key schedule for the given direction.
    pub fn with_direction(key: &[u8], direction: Direction) -> Result<Self, CryptoError> {
        let key: &[u8; SM4_KEY_SIZE] = key.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: SM4_KEY_SIZE,
            got: key.len(),
        })?;
        let mut round_keys = expand_key(key);
        if direction == Direction::Decrypt {
            round_keys.reverse();
        }
        Ok(Self {
            round_keys,
            direction,
        })
    }

    /// Direction this schedule was prepared for.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub(crate) fn round_keys(&self) -> &[u32; SM4_ROUNDS] {
        &self.round_keys
    }

    /// Apply the block function to one 16-byte block in place.
    pub fn crypt_block(&self, block: &mut [u8; SM4_BLOCK_SIZE]) {
        crypt_block_basic(&self.round_keys, block);
    }

    /// Draw a fresh 128-bit key from `source`.
    #[cfg(feature = "entropy")]
    pub fn generate_key<E: crate::entropy::EntropySource + ?Sized>(
        source: &mut E,
    ) -> Result<zeroize::Zeroizing<[u8; SM4_KEY_SIZE]>, CryptoError> {
        let mut key = zeroize::Zeroizing::new([0u8; SM4_KEY_SIZE]);
        source.fill_random(key.as_mut())?;
        Ok(key)
    }
}

impl crate::provider::BlockCipher for Sm4Key {
    fn block_size(&self) -> usize {
        SM4_BLOCK_SIZE
    }

    fn key_size(&self) -> usize {
        SM4_KEY_SIZE
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn crypt_block(&self, block: &mut [u8]) -> Result<(), CryptoError> {
        let len = block.len();
        let block: &mut [u8; SM4_BLOCK_SIZE] =
            block.try_into().map_err(|_| CryptoError::UnalignedLength {
                len,
                block: SM4_BLOCK_SIZE,
            })?;
        Sm4Key::crypt_block(self, block);
        Ok(())
    }
}
