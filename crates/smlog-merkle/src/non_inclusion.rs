//! Non-inclusion proofs over hash-ordered trees.
//!
//! A target hash is absent when two adjacent leaves bracket it:
//! `leaf_hash(L_i) < target < leaf_hash(L_{i+1})`. The witness carries both
//! boundary leaves and their audit paths.

use smlog_types::CryptoError;

use crate::hash::{leaf_hash, Hash};
use crate::proof::{verify_inclusion_hash, AuditPath};
use crate::tree::MerkleTree;

/// Proof that a hash is not a leaf of a hash-ordered tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonInclusionWitness {
    pub left_leaf: Vec<u8>,
    pub left_path: AuditPath,
    pub right_leaf: Vec<u8>,
    pub right_path: AuditPath,
}

impl MerkleTree {
    /// Witness that no leaf hashes to `target`.
    ///
    /// Refused on trees whose leaves are not in hash order, when `target` is
    /// a leaf hash, and when no leaf hash lies on each side of `target`.
    pub fn non_inclusion(&self, target: &Hash) -> Result<NonInclusionWitness, CryptoError> {
        if !self.is_hash_ordered() {
            log::warn!("merkle: non-inclusion requested on a tree not in hash order");
            return Err(CryptoError::UnorderedTree);
        }
        let right = match self.leaf_hashes().binary_search(target) {
            Ok(_) => return Err(CryptoError::TargetPresent),
            Err(pos) if pos == 0 || pos == self.len() => {
                return Err(CryptoError::TargetOutOfRange)
            }
            Err(pos) => pos,
        };
        let left = right - 1;
        Ok(NonInclusionWitness {
            left_leaf: self.leaf(left).unwrap_or_default().to_vec(),
            left_path: self.inclusion(left)?,
            right_leaf: self.leaf(right).unwrap_or_default().to_vec(),
            right_path: self.inclusion(right)?,
        })
    }
}

/// Check that `witness` proves `target` absent from the tree with head `root`.
pub fn verify_non_inclusion(
    target: &Hash,
    witness: &NonInclusionWitness,
    root: &Hash,
) -> Result<bool, CryptoError> {
    let lh = leaf_hash(&witness.left_leaf)?;
    let rh = leaf_hash(&witness.right_leaf)?;
    let left_ok = verify_inclusion_hash(&lh, &witness.left_path, root)?;
    let right_ok = verify_inclusion_hash(&rh, &witness.right_path, root)?;

    let same_tree = witness.left_path.tree_size() == witness.right_path.tree_size();
    let adjacent =
        witness.left_path.leaf_index().checked_add(1) == Some(witness.right_path.leaf_index());
    let bracketed = lh < *target && *target < rh;

    Ok(left_ok && right_ok && same_tree && adjacent && bracketed)
}
