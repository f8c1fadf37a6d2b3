//! CPU capability detection.
//!
//! Detected once per process and cached via OnceLock. Backends consult the
//! cached value when a context is created, never per call.

use std::sync::OnceLock;

/// Instruction-set extensions relevant to the SM3/SM4 backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuFeatures {
    pub sse2: bool,
    pub ssse3: bool,
    pub avx2: bool,
    pub aes: bool,
}

static CPU_FEATURES: OnceLock<CpuFeatures> = OnceLock::new();

#[cfg(target_arch = "x86_64")]
fn detect() -> CpuFeatures {
    CpuFeatures {
        sse2: is_x86_feature_detected!("sse2"),
        ssse3: is_x86_feature_detected!("ssse3"),
        avx2: is_x86_feature_detected!("avx2"),
        aes: is_x86_feature_detected!("aes"),
    }
}

#[cfg(not(target_arch = "x86_64"))]
fn detect() -> CpuFeatures {
    CpuFeatures::default()
}

/// The capabilities of the running CPU.
pub fn features() -> &'static CpuFeatures {
    CPU_FEATURES.get_or_init(|| {
        let f = detect();
        log::debug!(
            "cpu features: sse2={} ssse3={} avx2={} aes={}",
            f.sse2,
            f.ssse3,
            f.avx2,
            f.aes
        );
        f
    })
}
