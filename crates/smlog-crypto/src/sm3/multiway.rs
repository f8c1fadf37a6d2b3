//! Four independent SM3 messages hashed side by side.
//!
//! Lane `l` of every 128-bit register carries the state of message `l`.
//! While all four messages still have a padded block left, one call to the
//! lane-parallel compression advances all of them; once lengths diverge the
//! remaining lanes finish on the scalar compression. Each digest is
//! bit-identical to [`Sm3::digest`] of the same bytes.

use smlog_types::CryptoError;

use super::batch::Sm3Backend;
use super::compress::{compress, IV};
use super::{Sm3, MAX_MESSAGE_BYTES, SM3_BLOCK_SIZE, SM3_OUTPUT_SIZE};

/// Messages per lane-parallel call.
pub const SM3_LANES: usize = 4;

/// One message, given as consecutive parts, read back as padded blocks.
struct PaddedStream<'a> {
    parts: &'a [&'a [u8]],
    part: usize,
    offset: usize,
    bit_len: u64,
    marker_done: bool,
    done: bool,
}

impl<'a> PaddedStream<'a> {
    fn new(parts: &'a [&'a [u8]]) -> Result<Self, CryptoError> {
        let len = parts
            .iter()
            .try_fold(0u64, |acc, p| acc.checked_add(p.len() as u64))
            .filter(|&len| len <= MAX_MESSAGE_BYTES)
            .ok_or(CryptoError::InvalidArg)?;
        Ok(Self {
            parts,
            part: 0,
            offset: 0,
            bit_len: len << 3,
            marker_done: false,
            done: false,
        })
    }

    /// Write the next padded block into `block`. False once the length
    /// block has been produced.
    fn next_block(&mut self, block: &mut [u8; SM3_BLOCK_SIZE]) -> bool {
        if self.done {
            return false;
        }
        let mut n = 0;
        while n < SM3_BLOCK_SIZE && self.part < self.parts.len() {
            let src = &self.parts[self.part][self.offset..];
            let take = src.len().min(SM3_BLOCK_SIZE - n);
            block[n..n + take].copy_from_slice(&src[..take]);
            n += take;
            self.offset += take;
            if self.offset == self.parts[self.part].len() {
                self.part += 1;
                self.offset = 0;
            }
        }
        if n == SM3_BLOCK_SIZE {
            return true;
        }
        if !self.marker_done {
            block[n] = 0x80;
            n += 1;
            self.marker_done = true;
        }
        block[n..].fill(0);
        if n <= SM3_BLOCK_SIZE - 8 {
            block[SM3_BLOCK_SIZE - 8..].copy_from_slice(&self.bit_len.to_be_bytes());
            self.done = true;
        }
        true
    }
}

impl Sm3 {
    /// Digest four independent messages at once.
    pub fn digest_x4(
        msgs: [&[u8]; SM3_LANES],
    ) -> Result<[[u8; SM3_OUTPUT_SIZE]; SM3_LANES], CryptoError> {
        let parts = msgs.map(|m| [m]);
        Self::digest_parts_x4([&parts[0], &parts[1], &parts[2], &parts[3]])
    }

    /// Digest four messages, each the concatenation of its parts.
    pub fn digest_parts_x4(
        msgs: [&[&[u8]]; SM3_LANES],
    ) -> Result<[[u8; SM3_OUTPUT_SIZE]; SM3_LANES], CryptoError> {
        digest_lanes(Sm3Backend::best(), msgs)
    }

    /// As [`Sm3::digest_x4`] on a specific backend.
    pub fn digest_x4_with_backend(
        backend: Sm3Backend,
        msgs: [&[u8]; SM3_LANES],
    ) -> Result<[[u8; SM3_OUTPUT_SIZE]; SM3_LANES], CryptoError> {
        let backend = backend.resolve()?;
        let parts = msgs.map(|m| [m]);
        digest_lanes(backend, [&parts[0], &parts[1], &parts[2], &parts[3]])
    }
}

fn digest_lanes(
    backend: Sm3Backend,
    msgs: [&[&[u8]]; SM3_LANES],
) -> Result<[[u8; SM3_OUTPUT_SIZE]; SM3_LANES], CryptoError> {
    let mut streams = [
        PaddedStream::new(msgs[0])?,
        PaddedStream::new(msgs[1])?,
        PaddedStream::new(msgs[2])?,
        PaddedStream::new(msgs[3])?,
    ];
    let mut states = [IV; SM3_LANES];
    let mut blocks = [[0u8; SM3_BLOCK_SIZE]; SM3_LANES];

    loop {
        let mut active = [false; SM3_LANES];
        for ((stream, block), live) in streams
            .iter_mut()
            .zip(blocks.iter_mut())
            .zip(&mut active)
        {
            *live = stream.next_block(block);
        }
        if active == [true; SM3_LANES] {
            compress_x4(backend, &mut states, &blocks);
            continue;
        }
        if active == [false; SM3_LANES] {
            break;
        }
        for ((state, block), _) in states
            .iter_mut()
            .zip(&blocks)
            .zip(&active)
            .filter(|(_, live)| **live)
        {
            compress(state, block);
        }
    }

    let mut out = [[0u8; SM3_OUTPUT_SIZE]; SM3_LANES];
    for (digest, state) in out.iter_mut().zip(&states) {
        for (chunk, word) in digest.chunks_exact_mut(4).zip(state) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
    }
    Ok(out)
}

fn compress_x4(
    backend: Sm3Backend,
    states: &mut [[u32; 8]; SM3_LANES],
    blocks: &[[u8; SM3_BLOCK_SIZE]; SM3_LANES],
) {
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    if backend == Sm3Backend::Ssse3 {
        // SAFETY: the Ssse3 backend is only resolved after the CPU
        // reported SSE2 and SSSE3.
        unsafe { sse2::compress_x4(states, blocks) };
        return;
    }
    #[cfg(not(all(feature = "simd", target_arch = "x86_64")))]
    let _ = backend;

    for (state, block) in states.iter_mut().zip(blocks) {
        compress(state, block);
    }
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
mod sse2 {
    use core::arch::x86_64::*;

    use super::SM3_LANES;
    use crate::sm3::compress::load_block;
    use crate::sm3::SM3_BLOCK_SIZE;

    const T_LOW: u32 = 0x79cc4519;
    const T_HIGH: u32 = 0x7a879d8a;

    #[inline]
    #[target_feature(enable = "sse2")]
    unsafe fn rotl(x: __m128i, n: i32) -> __m128i {
        _mm_or_si128(
            _mm_sll_epi32(x, _mm_cvtsi32_si128(n)),
            _mm_srl_epi32(x, _mm_cvtsi32_si128(32 - n)),
        )
    }

    #[inline]
    #[target_feature(enable = "sse2")]
    unsafe fn xor3(a: __m128i, b: __m128i, c: __m128i) -> __m128i {
        _mm_xor_si128(a, _mm_xor_si128(b, c))
    }

    #[inline]
    #[target_feature(enable = "sse2")]
    unsafe fn p0(x: __m128i) -> __m128i {
        xor3(x, rotl(x, 9), rotl(x, 17))
    }

    #[inline]
    #[target_feature(enable = "sse2")]
    unsafe fn p1(x: __m128i) -> __m128i {
        xor3(x, rotl(x, 15), rotl(x, 23))
    }

    /// Word `i` of every lane in one register, lane 0 lowest.
    #[inline]
    #[target_feature(enable = "sse2")]
    unsafe fn gather(words: &[[u32; 16]; SM3_LANES], i: usize) -> __m128i {
        _mm_set_epi32(
            words[3][i] as i32,
            words[2][i] as i32,
            words[1][i] as i32,
            words[0][i] as i32,
        )
    }

    /// Compress one block per lane.
    ///
    /// # Safety
    /// The caller must ensure the CPU supports SSE2.
    #[target_feature(enable = "sse2")]
    pub(super) unsafe fn compress_x4(
        states: &mut [[u32; 8]; SM3_LANES],
        blocks: &[[u8; SM3_BLOCK_SIZE]; SM3_LANES],
    ) {
        let words = [
            load_block(&blocks[0]),
            load_block(&blocks[1]),
            load_block(&blocks[2]),
            load_block(&blocks[3]),
        ];
        let mut w = [_mm_setzero_si128(); 68];
        for (j, slot) in w.iter_mut().take(16).enumerate() {
            *slot = gather(&words, j);
        }
        for j in 16..68 {
            w[j] = xor3(
                p1(xor3(w[j - 16], w[j - 9], rotl(w[j - 3], 15))),
                rotl(w[j - 13], 7),
                w[j - 6],
            );
        }

        let mut v = [_mm_setzero_si128(); 8];
        for (i, reg) in v.iter_mut().enumerate() {
            *reg = _mm_set_epi32(
                states[3][i] as i32,
                states[2][i] as i32,
                states[1][i] as i32,
                states[0][i] as i32,
            );
        }
        let [mut a, mut b, mut c, mut d, mut e, mut f, mut g, mut h] = v;

        for j in 0..64 {
            let (t, ff, gg) = if j < 16 {
                (T_LOW, xor3(a, b, c), xor3(e, f, g))
            } else {
                (
                    T_HIGH,
                    _mm_or_si128(
                        _mm_or_si128(_mm_and_si128(a, b), _mm_and_si128(a, c)),
                        _mm_and_si128(b, c),
                    ),
                    _mm_or_si128(_mm_and_si128(e, f), _mm_andnot_si128(e, g)),
                )
            };
            let tj = _mm_set1_epi32(t.rotate_left(j as u32 % 32) as i32);
            let a12 = rotl(a, 12);
            let ss1 = rotl(_mm_add_epi32(_mm_add_epi32(a12, e), tj), 7);
            let ss2 = _mm_xor_si128(ss1, a12);
            let tt1 = _mm_add_epi32(
                _mm_add_epi32(ff, d),
                _mm_add_epi32(ss2, _mm_xor_si128(w[j], w[j + 4])),
            );
            let tt2 = _mm_add_epi32(_mm_add_epi32(gg, h), _mm_add_epi32(ss1, w[j]));
            d = c;
            c = rotl(b, 9);
            b = a;
            a = tt1;
            h = g;
            g = rotl(f, 19);
            f = e;
            e = p0(tt2);
        }

        for (i, reg) in [a, b, c, d, e, f, g, h].into_iter().enumerate() {
            let mut lanes = [0u32; SM3_LANES];
            _mm_storeu_si128(lanes.as_mut_ptr() as *mut __m128i, reg);
            for (state, lane) in states.iter_mut().zip(lanes) {
                state[i] ^= lane;
            }
        }
    }
}
