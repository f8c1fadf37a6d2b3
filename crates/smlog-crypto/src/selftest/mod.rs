//! Power-on self tests.
//!
//! [`run_all_kat`] recomputes a fixed set of known answers and fails with
//! [`CryptoError::IntegrityFailed`](smlog_types::CryptoError::IntegrityFailed)
//! on the first mismatch.

mod kat;

pub use kat::run_all_kat;
