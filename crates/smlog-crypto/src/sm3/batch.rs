//! Multi-block SM3 driver.
//!
//! Whole blocks handed to [`Sm3::update`](super::Sm3::update) go through
//! [`compress_blocks`]. With at least [`BATCH_MIN_BLOCKS`] blocks and the
//! SSSE3 backend bound, the message words are loaded with a vector byte
//! swap and the next block is prefetched. Output is bit-identical to the
//! scalar path.

use smlog_types::CryptoError;

use super::compress::compress;
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
use super::compress::compress_words;
use super::SM3_BLOCK_SIZE;

/// Minimum number of whole blocks before the vector driver is used.
pub const BATCH_MIN_BLOCKS: usize = 4;

/// SM3 implementation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sm3Backend {
    /// Pick the fastest backend the CPU supports.
    Auto,
    /// Portable word loads.
    Scalar,
    /// SSSE3 byte-swap loads with prefetch for long inputs.
    Ssse3,
}

impl Sm3Backend {
    /// Short lowercase name, used in logs and errors.
    pub fn name(self) -> &'static str {
        match self {
            Sm3Backend::Auto => "auto",
            Sm3Backend::Scalar => "scalar",
            Sm3Backend::Ssse3 => "ssse3",
        }
    }

    /// Whether this backend can run on the current CPU and build.
    pub fn is_available(self) -> bool {
        match self {
            Sm3Backend::Auto | Sm3Backend::Scalar => true,
            Sm3Backend::Ssse3 => ssse3_supported(),
        }
    }

    /// The backend `Auto` resolves to on this machine.
    pub fn best() -> Self {
        if ssse3_supported() {
            Sm3Backend::Ssse3
        } else {
            Sm3Backend::Scalar
        }
    }

    pub(crate) fn resolve(self) -> Result<Self, CryptoError> {
        match self {
            Sm3Backend::Auto => Ok(Self::best()),
            b if b.is_available() => Ok(b),
            b => {
                log::warn!("sm3: {} backend requested but not supported", b.name());
                Err(CryptoError::BackendUnavailable(b.name()))
            }
        }
    }
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
fn ssse3_supported() -> bool {
    let f = crate::cpu::features();
    f.sse2 && f.ssse3
}

#[cfg(not(all(feature = "simd", target_arch = "x86_64")))]
fn ssse3_supported() -> bool {
    false
}

/// Compress every 64-byte block of `data` into `state`.
///
/// `data.len()` must be a multiple of 64.
pub(crate) fn compress_blocks(backend: Sm3Backend, state: &mut [u32; 8], data: &[u8]) {
    debug_assert_eq!(data.len() % SM3_BLOCK_SIZE, 0);

    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    if backend == Sm3Backend::Ssse3 && data.len() / SM3_BLOCK_SIZE >= BATCH_MIN_BLOCKS {
        // SAFETY: the Ssse3 backend is only bound after the CPU
        // reported SSE2 and SSSE3.
        unsafe { compress_blocks_ssse3(state, data) };
        return;
    }
    #[cfg(not(all(feature = "simd", target_arch = "x86_64")))]
    let _ = backend;

    for chunk in data.chunks_exact(SM3_BLOCK_SIZE) {
        if let Ok(block) = <&[u8; SM3_BLOCK_SIZE]>::try_from(chunk) {
            compress(state, block);
        }
    }
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
#[target_feature(enable = "sse2,ssse3")]
unsafe fn compress_blocks_ssse3(state: &mut [u32; 8], data: &[u8]) {
    use core::arch::x86_64::*;

    let mask = _mm_set_epi8(12, 13, 14, 15, 8, 9, 10, 11, 4, 5, 6, 7, 0, 1, 2, 3);
    let blocks = data.len() / SM3_BLOCK_SIZE;
    let base = data.as_ptr();
    let mut w = [0u32; 16];

    for i in 0..blocks {
        let blk = base.add(i * SM3_BLOCK_SIZE);
        if i + 1 < blocks {
            _mm_prefetch(blk.add(SM3_BLOCK_SIZE) as *const i8, _MM_HINT_T0);
        }
        for q in 0..4 {
            let v = _mm_loadu_si128(blk.add(16 * q) as *const __m128i);
            _mm_storeu_si128(
                w.as_mut_ptr().add(4 * q) as *mut __m128i,
                _mm_shuffle_epi8(v, mask),
            );
        }
        compress_words(state, &w);
    }
}
