/// The three failure categories every operation reports through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A precondition on the inputs did not hold. Nothing was written.
    InvalidArgument,
    /// A recomputed value disagreed with the one it was checked against.
    IntegrityFailed,
    /// The random-number collaborator could not supply bytes.
    EntropyUnavailable,
}

/// Cryptographic operation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    // General errors
    #[error("invalid argument")]
    InvalidArg,
    #[error("buffer length not enough: need {need}, got {got}")]
    BufferTooSmall { need: usize, got: usize },
    #[error("backend not available on this cpu: {0}")]
    BackendUnavailable(&'static str),

    // Symmetric cipher errors
    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },
    #[error("length {len} is not a multiple of the block size {block}")]
    UnalignedLength { len: usize, block: usize },
    #[error("key schedule prepared for the other direction")]
    DirectionMismatch,
    #[error("ctr: keystream offset {0} outside 0..16")]
    StreamOffset(usize),

    // Merkle tree errors
    #[error("merkle: tree has no leaves")]
    EmptyTree,
    #[error("merkle: too many leaves: {0}")]
    TooManyLeaves(usize),
    #[error("merkle: leaf index {index} out of range for size {size}")]
    IndexOutOfRange { index: usize, size: usize },
    #[error("merkle: proof has {got} nodes, expected {expected}")]
    PathLength { expected: usize, got: usize },
    #[error("merkle: leaves are not in hash order")]
    UnorderedTree,
    #[error("merkle: target is present in the tree")]
    TargetPresent,
    #[error("merkle: target lies outside the leaf range")]
    TargetOutOfRange,

    // Verification and entropy
    #[error("integrity check failed")]
    IntegrityFailed,
    #[error("entropy source unavailable")]
    EntropyUnavailable,
}

impl CryptoError {
    /// Collapse the detailed error into its category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CryptoError::IntegrityFailed => ErrorKind::IntegrityFailed,
            CryptoError::EntropyUnavailable => ErrorKind::EntropyUnavailable,
            _ => ErrorKind::InvalidArgument,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(CryptoError::InvalidArg.kind(), ErrorKind::InvalidArgument);
        let short_path = CryptoError::PathLength {
            expected: 3,
            got: 2,
        };
        assert_eq!(short_path.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            CryptoError::StreamOffset(16).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            CryptoError::IntegrityFailed.kind(),
            ErrorKind::IntegrityFailed
        );
        assert_eq!(
            CryptoError::EntropyUnavailable.kind(),
            ErrorKind::EntropyUnavailable
        );
    }

    #[test]
    fn test_display() {
        let e = CryptoError::InvalidKeyLength {
            expected: 16,
            got: 15,
        };
        assert_eq!(e.to_string(), "invalid key length: expected 16, got 15");
        let e = CryptoError::IndexOutOfRange { index: 5, size: 5 };
        assert_eq!(
            e.to_string(),
            "merkle: leaf index 5 out of range for size 5"
        );
    }
}
