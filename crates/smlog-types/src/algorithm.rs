//! Algorithm identifiers and direction flags.

/// Hash algorithm identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgId {
    Sm3,
}

impl HashAlgId {
    /// Digest length in bytes.
    pub fn output_size(self) -> usize {
        match self {
            HashAlgId::Sm3 => 32,
        }
    }
}

/// Whether a key schedule encrypts or decrypts.
///
/// SM4 uses the same round function both ways; only the order of the
/// round keys differs, so a prepared key is bound to one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Encrypt,
    Decrypt,
}
