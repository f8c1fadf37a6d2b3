#![doc = "SM3 / SM4 primitives and block cipher modes for smlog."]

// Core traits
pub mod provider;

// CPU capability detection shared by the accelerated backends
pub mod cpu;

// Hash algorithms
#[cfg(feature = "sm3")]
pub mod sm3;

pub mod hash;

// Symmetric ciphers
#[cfg(feature = "sm4")]
pub mod sm4;

// Modes of operation
#[cfg(feature = "modes")]
pub mod modes;

pub mod cipher {
    //! Unified symmetric cipher interface.
    pub use super::provider::BlockCipher;
}

// Random-byte collaborator
#[cfg(feature = "entropy")]
pub mod entropy;

// Known-answer self tests
#[cfg(feature = "selftest")]
pub mod selftest;
