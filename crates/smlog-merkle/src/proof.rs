//! Audit paths and inclusion verification (RFC 6962 section 2.1.1).

use smlog_types::CryptoError;
use subtle::ConstantTimeEq;

use crate::hash::{leaf_hash, node_hash, split_point, Hash};
use crate::tree::MAX_LEAVES;

/// Which side of the running hash a sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

/// One level of an audit path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStep {
    pub sibling: Hash,
    pub side: Side,
}

/// Inclusion proof for one leaf, closest sibling first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditPath {
    leaf_index: usize,
    tree_size: usize,
    steps: Vec<PathStep>,
}

impl AuditPath {
    pub fn new(leaf_index: usize, tree_size: usize, steps: Vec<PathStep>) -> Self {
        Self {
            leaf_index,
            tree_size,
            steps,
        }
    }

    pub fn leaf_index(&self) -> usize {
        self.leaf_index
    }

    pub fn tree_size(&self) -> usize {
        self.tree_size
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Mutable access to the siblings, for building tampered proofs in tests.
    pub fn steps_mut(&mut self) -> &mut [PathStep] {
        &mut self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Fold the path over `leaf_hash` and return the resulting root.
    ///
    /// Fails if the path's shape is impossible for its index and size.
    /// Returns `None` if a step's side disagrees with the shape.
    pub fn root_from_leaf_hash(&self, leaf_hash: &Hash) -> Result<Option<Hash>, CryptoError> {
        let shape = expected_sides(self.leaf_index, self.tree_size)?;
        if shape.len() != self.steps.len() {
            return Err(CryptoError::PathLength {
                expected: shape.len(),
                got: self.steps.len(),
            });
        }
        let mut h = *leaf_hash;
        for (i, step) in self.steps.iter().enumerate() {
            if step.side != shape.side(i) {
                return Ok(None);
            }
            h = match step.side {
                Side::Left => node_hash(&step.sibling, &h)?,
                Side::Right => node_hash(&h, &step.sibling)?,
            };
        }
        Ok(Some(h))
    }
}

/// Sibling sides of an audit path packed into a bitmask, closest first.
///
/// Bit `i` set means step `i` has its sibling on the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PathShape {
    left: u32,
    len: usize,
}

impl PathShape {
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn side(&self, step: usize) -> Side {
        if (self.left >> step) & 1 == 1 {
            Side::Left
        } else {
            Side::Right
        }
    }
}

/// Sibling sides implied by `(index, size)`.
pub(crate) fn expected_sides(index: usize, size: usize) -> Result<PathShape, CryptoError> {
    if size == 0 {
        return Err(CryptoError::EmptyTree);
    }
    if size > MAX_LEAVES {
        return Err(CryptoError::TooManyLeaves(size));
    }
    if index >= size {
        return Err(CryptoError::IndexOutOfRange { index, size });
    }
    // The split recursion visits the root end first: record those sides,
    // then mirror them so bit 0 is the step next to the leaf.
    let (mut n, mut m) = (size, index);
    let (mut root_first, mut len) = (0u32, 0usize);
    while n > 1 {
        let k = split_point(n);
        if m < k {
            n = k;
        } else {
            root_first |= 1 << len;
            m -= k;
            n -= k;
        }
        len += 1;
    }
    let left = (0..len)
        .filter(|&i| (root_first >> (len - 1 - i)) & 1 == 1)
        .fold(0u32, |acc, i| acc | 1 << i);
    Ok(PathShape { left, len })
}

/// Check that `leaf` is committed to by `root` through `path`.
///
/// `Ok(false)` means the path is well formed but leads elsewhere.
pub fn verify_inclusion(leaf: &[u8], path: &AuditPath, root: &Hash) -> Result<bool, CryptoError> {
    verify_inclusion_hash(&leaf_hash(leaf)?, path, root)
}

/// As [`verify_inclusion`], starting from a precomputed leaf hash.
pub fn verify_inclusion_hash(
    leaf_hash: &Hash,
    path: &AuditPath,
    root: &Hash,
) -> Result<bool, CryptoError> {
    Ok(match path.root_from_leaf_hash(leaf_hash)? {
        Some(computed) => bool::from(computed.ct_eq(root)),
        None => false,
    })
}

/// As [`verify_inclusion`], mapping a negative answer to
/// [`CryptoError::IntegrityFailed`].
pub fn ensure_inclusion(leaf: &[u8], path: &AuditPath, root: &Hash) -> Result<(), CryptoError> {
    if verify_inclusion(leaf, path, root)? {
        Ok(())
    } else {
        Err(CryptoError::IntegrityFailed)
    }
}
