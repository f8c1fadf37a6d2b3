//! Merkle tree construction (RFC 6962 section 2.1).
//!
//! `MTH(D[0:n]) = node_hash(MTH(D[0:k]), MTH(D[k:n]))` with `k` the largest
//! power of two below `n`. Building level by level and promoting an unpaired
//! last node unchanged yields the same tree, so every interior node is
//! cached: node `j` of level `l` is the root of leaves
//! `[j * 2^l, min((j + 1) * 2^l, n))`.

use smlog_types::CryptoError;

use crate::hash::{leaf_hashes, parent_level, split_point, Hash};
use crate::proof::{AuditPath, PathStep, Side};

/// Deepest tree supported.
pub const MAX_DEPTH: usize = 20;

/// Largest number of leaves a tree may hold.
pub const MAX_LEAVES: usize = 1 << MAX_DEPTH;

/// An immutable Merkle tree owning copies of its leaves.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    leaves: Vec<Vec<u8>>,
    /// `levels[0]` holds the leaf hashes, the last level holds the root.
    levels: Vec<Vec<Hash>>,
    hash_ordered: bool,
}

impl MerkleTree {
    /// Build a tree over `leaves` in the given order.
    pub fn build<I, L>(leaves: I) -> Result<Self, CryptoError>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        let leaves: Vec<Vec<u8>> = leaves.into_iter().map(|l| l.as_ref().to_vec()).collect();
        check_size(leaves.len())?;
        let hashes = leaf_hashes(&leaves)?;
        Self::from_parts(leaves, hashes)
    }

    /// Build a tree whose leaves are re-ordered by leaf hash.
    ///
    /// Leaves with equal bytes collapse to one. Only hash-ordered trees
    /// answer non-inclusion queries.
    pub fn build_sorted<I, L>(leaves: I) -> Result<Self, CryptoError>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[u8]>,
    {
        let leaves: Vec<Vec<u8>> = leaves.into_iter().map(|l| l.as_ref().to_vec()).collect();
        let hashes = leaf_hashes(&leaves)?;
        let mut pairs: Vec<(Hash, Vec<u8>)> = hashes.into_iter().zip(leaves).collect();
        pairs.sort_unstable_by_key(|p| p.0);
        pairs.dedup_by(|a, b| a.0 == b.0);
        check_size(pairs.len())?;
        let (hashes, leaves) = pairs.into_iter().unzip();
        Self::from_parts(leaves, hashes)
    }

    fn from_parts(leaves: Vec<Vec<u8>>, hashes: Vec<Hash>) -> Result<Self, CryptoError> {
        let hash_ordered = hashes.windows(2).all(|w| w[0] < w[1]);
        let mut levels = vec![hashes];
        while let Some(last) = levels.last().filter(|l| l.len() > 1) {
            let next = parent_level(last)?;
            levels.push(next);
        }
        log::debug!(
            "merkle: built tree of {} leaves, depth {}, hash-ordered {}",
            leaves.len(),
            levels.len() - 1,
            hash_ordered
        );
        Ok(Self {
            leaves,
            levels,
            hash_ordered,
        })
    }

    /// The 32-byte tree head.
    pub fn root(&self) -> Hash {
        // from_parts guarantees at least one level with at least one node
        self.levels[self.levels.len() - 1][0]
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Always false; empty trees cannot be built.
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Number of levels above the leaves (0 for a single leaf).
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    /// Leaf bytes at `index`.
    pub fn leaf(&self, index: usize) -> Option<&[u8]> {
        self.leaves.get(index).map(Vec::as_slice)
    }

    /// Leaf hash at `index`.
    pub fn leaf_hash(&self, index: usize) -> Option<&Hash> {
        self.levels[0].get(index)
    }

    /// Whether leaf hashes are strictly ascending.
    pub fn is_hash_ordered(&self) -> bool {
        self.hash_ordered
    }

    /// Index of the leaf with hash `target`, if any.
    pub fn index_of_hash(&self, target: &Hash) -> Option<usize> {
        let hashes = &self.levels[0];
        if self.hash_ordered {
            hashes.binary_search(target).ok()
        } else {
            hashes.iter().position(|h| h == target)
        }
    }

    pub(crate) fn leaf_hashes(&self) -> &[Hash] {
        &self.levels[0]
    }

    /// Root of leaves `[start, end)`.
    ///
    /// The range must be one produced by the RFC 6962 recursion: `start` is
    /// aligned to the next power of two at or above its width, and the
    /// range is either full width or ends at the last leaf.
    pub(crate) fn subtree_root(&self, start: usize, end: usize) -> Hash {
        let width = end - start;
        let level = width.next_power_of_two().trailing_zeros() as usize;
        debug_assert_eq!(start % (1 << level), 0);
        debug_assert!(width == 1 << level || end == self.len());
        self.levels[level][start >> level]
    }

    /// Audit path for the leaf at `index`, closest sibling first.
    pub fn inclusion(&self, index: usize) -> Result<AuditPath, CryptoError> {
        let n = self.len();
        if index >= n {
            return Err(CryptoError::IndexOutOfRange { index, size: n });
        }
        let (mut lo, mut hi, mut m) = (0, n, index);
        let mut steps = Vec::with_capacity(self.depth());
        while hi - lo > 1 {
            let k = split_point(hi - lo);
            if m < k {
                steps.push(PathStep {
                    sibling: self.subtree_root(lo + k, hi),
                    side: Side::Right,
                });
                hi = lo + k;
            } else {
                steps.push(PathStep {
                    sibling: self.subtree_root(lo, lo + k),
                    side: Side::Left,
                });
                lo += k;
                m -= k;
            }
        }
        steps.reverse();
        Ok(AuditPath::new(index, n, steps))
    }
}

fn check_size(n: usize) -> Result<(), CryptoError> {
    if n == 0 {
        return Err(CryptoError::EmptyTree);
    }
    if n > MAX_LEAVES {
        return Err(CryptoError::TooManyLeaves(n));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{leaf_hash, node_hash};
    use crate::proof::verify_inclusion;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Direct transcription of the RFC 6962 recursion.
    fn mth(hashes: &[Hash]) -> Hash {
        if hashes.len() == 1 {
            return hashes[0];
        }
        let k = split_point(hashes.len());
        node_hash(&mth(&hashes[..k]), &mth(&hashes[k..])).unwrap()
    }

    fn letters(n: usize) -> Vec<Vec<u8>> {
        (0..n).map(|i| vec![b'A' + i as u8]).collect()
    }

    #[test]
    fn test_roots_of_letter_prefixes() {
        let expected = [
            "7369a1f16e9c4ad122591b63820b962ede9d6ca74ccf0e87dcbba39ce862a8b9",
            "bd1b6ca5c17d3ceb1906637f9e9efde6b98025deaeb426997583d019d9421ffb",
            "8d00da5c059df65cab920830e5f41bf7976871781a8af4b294556d93e38d93c2",
            "f8164a4e92117fbf33a6e0a7c467350497e5c823cd9532d1e3cdc4e4fd1b2427",
            "d71b4b916faf1d04eedd3344c0ed94cbe408c760cd18145b1a40d297099a9f06",
        ];
        for (n, root) in expected.iter().enumerate() {
            let tree = MerkleTree::build(letters(n + 1)).unwrap();
            assert_eq!(hex(&tree.root()), *root, "n = {}", n + 1);
        }
    }

    #[test]
    fn test_levels_match_recursive_definition() {
        for n in 1..=33 {
            let leaves: Vec<String> = (0..n).map(|i| format!("leaf_{i}")).collect();
            let tree = MerkleTree::build(&leaves).unwrap();
            let single: Vec<Hash> = leaves
                .iter()
                .map(|l| leaf_hash(l.as_bytes()).unwrap())
                .collect();
            assert_eq!(tree.leaf_hashes(), &single[..], "n = {n}");
            assert_eq!(tree.root(), mth(&single), "n = {n}");
        }
    }

    #[test]
    fn test_five_leaf_shape() {
        let tree = MerkleTree::build(letters(5)).unwrap();
        assert_eq!(tree.depth(), 3);

        // E hangs directly off the root; its only sibling is MTH(A..D).
        let path = tree.inclusion(4).unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(path.steps()[0].side, Side::Left);
        assert_eq!(path.steps()[0].sibling, mth(&tree.leaf_hashes()[..4]));

        // A: sibling B, then MTH(C, D), then E.
        let path = tree.inclusion(0).unwrap();
        let sides: Vec<Side> = path.steps().iter().map(|s| s.side).collect();
        assert_eq!(sides, [Side::Right, Side::Right, Side::Right]);
        assert_eq!(path.steps()[0].sibling, tree.leaf_hashes()[1]);
        assert_eq!(path.steps()[2].sibling, tree.leaf_hashes()[4]);
    }

    #[test]
    fn test_every_index_verifies() {
        for n in 1..=20 {
            let tree = MerkleTree::build((0..n).map(|i| format!("leaf_{i}"))).unwrap();
            for i in 0..n {
                let path = tree.inclusion(i).unwrap();
                assert!(verify_inclusion(tree.leaf(i).unwrap(), &path, &tree.root()).unwrap());
            }
        }
    }

    #[test]
    fn test_single_leaf_tree() {
        let tree = MerkleTree::build([b"only"]).unwrap();
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.root(), leaf_hash(b"only").unwrap());
        let path = tree.inclusion(0).unwrap();
        assert!(path.is_empty());
        assert!(verify_inclusion(b"only", &path, &tree.root()).unwrap());
    }

    #[test]
    fn test_empty_and_out_of_range() {
        let none: [&[u8]; 0] = [];
        assert!(matches!(MerkleTree::build(none), Err(CryptoError::EmptyTree)));
        let tree = MerkleTree::build(letters(3)).unwrap();
        assert!(matches!(
            tree.inclusion(3),
            Err(CryptoError::IndexOutOfRange { index: 3, size: 3 })
        ));
    }

    #[test]
    fn test_build_sorted_orders_and_dedups() {
        let tree = MerkleTree::build_sorted(["x", "a", "m", "a", "q"]).unwrap();
        assert_eq!(tree.len(), 4);
        assert!(tree.is_hash_ordered());
        let hashes = tree.leaf_hashes();
        assert!(hashes.windows(2).all(|w| w[0] < w[1]));
        for (i, h) in hashes.iter().enumerate() {
            assert_eq!(leaf_hash(tree.leaf(i).unwrap()).unwrap(), *h);
            assert_eq!(tree.index_of_hash(h), Some(i));
        }
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let a = MerkleTree::build(letters(7)).unwrap();
        let b = MerkleTree::build(letters(7)).unwrap();
        assert_eq!(a.root(), b.root());
        assert_eq!(
            a.index_of_hash(&leaf_hash(b"C").unwrap()),
            Some(2)
        );
        assert_eq!(a.index_of_hash(&[0u8; 32]), None);
    }
}
