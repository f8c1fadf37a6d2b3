//! Backend selection for SM4.
//!
//! A [`Sm4`] context resolves its backend exactly once, at construction,
//! from the cached CPU features. Every later call goes through a single match
//! on the stored [`Sm4Backend`]; there is no re-dispatch mid-stream.

use smlog_types::{CryptoError, Direction};

use super::{crypt_block_basic, table, Sm4Key, SM4_BLOCK_SIZE, SM4_KEY_SIZE};

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
use super::simd;

/// SM4 implementation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sm4Backend {
    /// Pick the fastest backend the CPU supports.
    Auto,
    /// One S-box lookup per byte plus the rotate-XOR linear map.
    Basic,
    /// Four fused 256-entry tables.
    Table,
    /// Four blocks per call in 128-bit lanes (SSSE3).
    Simd,
}

impl Sm4Backend {
    /// Short lowercase name, used in logs and errors.
    pub fn name(self) -> &'static str {
        match self {
            Sm4Backend::Auto => "auto",
            Sm4Backend::Basic => "basic",
            Sm4Backend::Table => "table",
            Sm4Backend::Simd => "simd",
        }
    }

    /// Whether this backend can run on the current CPU and build.
    pub fn is_available(self) -> bool {
        match self {
            Sm4Backend::Auto | Sm4Backend::Basic | Sm4Backend::Table => true,
            Sm4Backend::Simd => simd_supported(),
        }
    }

    /// The backend `Auto` resolves to on this machine.
    pub fn best() -> Self {
        if simd_supported() {
            Sm4Backend::Simd
        } else {
            Sm4Backend::Table
        }
    }

    fn resolve(self) -> Result<Self, CryptoError> {
        match self {
            Sm4Backend::Auto => Ok(Self::best()),
            b if b.is_available() => Ok(b),
            b => {
                log::warn!("sm4: {} backend requested but not supported", b.name());
                Err(CryptoError::BackendUnavailable(b.name()))
            }
        }
    }
}

#[cfg(all(feature = "simd", target_arch = "x86_64"))]
fn simd_supported() -> bool {
    let f = crate::cpu::features();
    f.sse2 && f.ssse3
}

#[cfg(not(all(feature = "simd", target_arch = "x86_64")))]
fn simd_supported() -> bool {
    false
}

/// An SM4 context bound to a backend.
#[derive(Clone)]
pub struct Sm4 {
    key: Sm4Key,
    backend: Sm4Backend,
}

impl Sm4 {
    /// Create a context on the best available backend.
    pub fn new(key: &[u8], direction: Direction) -> Result<Self, CryptoError> {
        Self::with_backend(key, direction, Sm4Backend::Auto)
    }

    /// Create a context on a specific backend.
    ///
    /// Fails with [`CryptoError::BackendUnavailable`] if the CPU cannot run it.
    pub fn with_backend(
        key: &[u8],
        direction: Direction,
        backend: Sm4Backend,
    ) -> Result<Self, CryptoError> {
        let backend = backend.resolve()?;
        let key = Sm4Key::with_direction(key, direction)?;
        if backend != Sm4Backend::Basic {
            table::warm_up();
        }
        log::debug!("sm4: {} backend bound ({direction:?})", backend.name());
        Ok(Self { key, backend })
    }

    /// The resolved backend. Never [`Sm4Backend::Auto`].
    pub fn backend(&self) -> Sm4Backend {
        self.backend
    }

    /// Direction of the underlying key schedule.
    pub fn direction(&self) -> Direction {
        self.key.direction()
    }

    /// The underlying portable key.
    pub fn key(&self) -> &Sm4Key {
        &self.key
    }

    /// Apply the block function to one block.
    pub fn crypt_block(&self, block: &mut [u8; SM4_BLOCK_SIZE]) {
        match self.backend {
            Sm4Backend::Basic => crypt_block_basic(self.key.round_keys(), block),
            _ => table::crypt_block(self.key.round_keys(), block),
        }
    }

    /// ECB over `data` in place. The length must be a multiple of 16.
    pub fn crypt_ecb(&self, data: &mut [u8]) -> Result<(), CryptoError> {
        if data.len() % SM4_BLOCK_SIZE != 0 {
            return Err(CryptoError::UnalignedLength {
                len: data.len(),
                block: SM4_BLOCK_SIZE,
            });
        }
        let rk = self.key.round_keys();
        match self.backend {
            Sm4Backend::Basic => for_each_block(data, |b| crypt_block_basic(rk, b)),
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            Sm4Backend::Simd => {
                let mut chunks = data.chunks_exact_mut(simd::CHUNK);
                for chunk in &mut chunks {
                    if let Ok(four) = <&mut [u8; simd::CHUNK]>::try_from(chunk) {
                        // SAFETY: the Simd backend is only bound after the
                        // CPU reported SSE2 and SSSE3.
                        unsafe { simd::crypt_4blocks(rk, four) };
                    }
                }
                for_each_block(chunks.into_remainder(), |b| table::crypt_block(rk, b));
            }
            _ => for_each_block(data, |b| table::crypt_block(rk, b)),
        }
        Ok(())
    }

    /// CTR over `input` into `output`, advancing `state`.
    #[cfg(feature = "modes")]
    pub fn crypt_ctr(
        &self,
        state: &mut crate::modes::ctr::CtrState,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<(), CryptoError> {
        crate::modes::ctr::ctr_crypt(self, state, input, output)
    }
}

fn for_each_block(data: &mut [u8], mut f: impl FnMut(&mut [u8; SM4_BLOCK_SIZE])) {
    for chunk in data.chunks_exact_mut(SM4_BLOCK_SIZE) {
        if let Ok(block) = <&mut [u8; SM4_BLOCK_SIZE]>::try_from(chunk) {
            f(block);
        }
    }
}

impl crate::provider::BlockCipher for Sm4 {
    fn block_size(&self) -> usize {
        SM4_BLOCK_SIZE
    }

    fn key_size(&self) -> usize {
        SM4_KEY_SIZE
    }

    fn direction(&self) -> Direction {
        self.key.direction()
    }

    fn crypt_block(&self, block: &mut [u8]) -> Result<(), CryptoError> {
        let len = block.len();
        let block: &mut [u8; SM4_BLOCK_SIZE] =
            block.try_into().map_err(|_| CryptoError::UnalignedLength {
                len,
                block: SM4_BLOCK_SIZE,
            })?;
        Sm4::crypt_block(self, block);
        Ok(())
    }

    fn crypt_blocks(&self, data: &mut [u8]) -> Result<(), CryptoError> {
        self.crypt_ecb(data)
    }
}
