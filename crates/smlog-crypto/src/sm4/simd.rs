//! Four-block parallel SM4 using SSE2/SSSE3 intrinsics.
//!
//! This module is only compiled on `x86_64` with the `simd` feature. Four
//! independent blocks are loaded, byte-swapped to big-endian words and
//! transposed so that lane `b` of register `X_i` holds word `i` of block `b`.
//! Every round then runs on all four blocks at once.

use core::arch::x86_64::*;

use super::{SBOX, SM4_BLOCK_SIZE, SM4_ROUNDS};

/// Blocks processed per call.
pub(crate) const LANES: usize = 4;

/// Bytes processed per call.
pub(crate) const CHUNK: usize = SM4_BLOCK_SIZE * LANES;

macro_rules! rotl {
    ($x:expr, $n:literal, $m:literal) => {
        _mm_or_si128(_mm_slli_epi32($x, $n), _mm_srli_epi32($x, $m))
    };
}

// ---------------------------------------------------------------------------
// Lane helpers
// ---------------------------------------------------------------------------

/// Shuffle mask reversing the bytes of every 32-bit lane.
#[inline]
#[target_feature(enable = "sse2")]
unsafe fn bswap_mask() -> __m128i {
    _mm_set_epi8(12, 13, 14, 15, 8, 9, 10, 11, 4, 5, 6, 7, 0, 1, 2, 3)
}

/// 4x4 transpose of 32-bit lanes. Self-inverse.
#[inline]
#[target_feature(enable = "sse2")]
unsafe fn transpose(
    r0: __m128i,
    r1: __m128i,
    r2: __m128i,
    r3: __m128i,
) -> (__m128i, __m128i, __m128i, __m128i) {
    let t0 = _mm_unpacklo_epi32(r0, r1);
    let t1 = _mm_unpacklo_epi32(r2, r3);
    let t2 = _mm_unpackhi_epi32(r0, r1);
    let t3 = _mm_unpackhi_epi32(r2, r3);
    (
        _mm_unpacklo_epi64(t0, t1),
        _mm_unpackhi_epi64(t0, t1),
        _mm_unpacklo_epi64(t2, t3),
        _mm_unpackhi_epi64(t2, t3),
    )
}

/// S-box applied to all sixteen bytes of the register.
#[inline]
#[target_feature(enable = "sse2")]
unsafe fn tau_lanes(a: __m128i) -> __m128i {
    let mut bytes = [0u8; 16];
    _mm_storeu_si128(bytes.as_mut_ptr() as *mut __m128i, a);
    for b in bytes.iter_mut() {
        *b = SBOX[*b as usize];
    }
    _mm_loadu_si128(bytes.as_ptr() as *const __m128i)
}

/// Round linear transform on four words at once.
#[inline]
#[target_feature(enable = "sse2")]
unsafe fn l_lanes(b: __m128i) -> __m128i {
    let r = _mm_xor_si128(rotl!(b, 2, 30), rotl!(b, 10, 22));
    let r = _mm_xor_si128(r, _mm_xor_si128(rotl!(b, 18, 14), rotl!(b, 24, 8)));
    _mm_xor_si128(b, r)
}

// ---------------------------------------------------------------------------
// Four-block encrypt / decrypt
// ---------------------------------------------------------------------------

/// Apply the block function to four consecutive blocks in place.
///
/// # Safety
/// The caller must ensure the CPU supports SSE2 and SSSE3.
#[target_feature(enable = "sse2,ssse3")]
pub(crate) unsafe fn crypt_4blocks(rk: &[u32; SM4_ROUNDS], blocks: &mut [u8; CHUNK]) {
    let mask = bswap_mask();
    let p = blocks.as_mut_ptr() as *mut __m128i;

    let r0 = _mm_shuffle_epi8(_mm_loadu_si128(p), mask);
    let r1 = _mm_shuffle_epi8(_mm_loadu_si128(p.add(1)), mask);
    let r2 = _mm_shuffle_epi8(_mm_loadu_si128(p.add(2)), mask);
    let r3 = _mm_shuffle_epi8(_mm_loadu_si128(p.add(3)), mask);
    let (mut x0, mut x1, mut x2, mut x3) = transpose(r0, r1, r2, r3);

    for &k in rk.iter() {
        let a = _mm_xor_si128(
            _mm_xor_si128(x1, x2),
            _mm_xor_si128(x3, _mm_set1_epi32(k as i32)),
        );
        let next = _mm_xor_si128(x0, l_lanes(tau_lanes(a)));
        x0 = x1;
        x1 = x2;
        x2 = x3;
        x3 = next;
    }

    // Output is (X35, X34, X33, X32) per block.
    let (o0, o1, o2, o3) = transpose(x3, x2, x1, x0);
    _mm_storeu_si128(p, _mm_shuffle_epi8(o0, mask));
    _mm_storeu_si128(p.add(1), _mm_shuffle_epi8(o1, mask));
    _mm_storeu_si128(p.add(2), _mm_shuffle_epi8(o2, mask));
    _mm_storeu_si128(p.add(3), _mm_shuffle_epi8(o3, mask));
}
