//! Consistency proofs between two versions of an append-only tree
//! (RFC 6962 section 2.1.2, verified per RFC 9162 section 2.1.4.2).

use smlog_types::CryptoError;
use subtle::ConstantTimeEq;

use crate::hash::{node_hash, split_point, Hash};
use crate::tree::{MerkleTree, MAX_LEAVES};

/// Proof that the first `old_size` leaves of a `new_size` tree are unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyProof {
    pub old_size: usize,
    pub new_size: usize,
    pub nodes: Vec<Hash>,
}

impl MerkleTree {
    /// Consistency proof from the prefix of `old_size` leaves to this tree.
    pub fn consistency(&self, old_size: usize) -> Result<ConsistencyProof, CryptoError> {
        if old_size == 0 || old_size > self.len() {
            return Err(CryptoError::InvalidArg);
        }
        let mut nodes = Vec::new();
        self.subproof(old_size, 0, self.len(), true, &mut nodes);
        Ok(ConsistencyProof {
            old_size,
            new_size: self.len(),
            nodes,
        })
    }

    /// SUBPROOF(m, D[lo:hi], complete)
    fn subproof(&self, m: usize, lo: usize, hi: usize, complete: bool, out: &mut Vec<Hash>) {
        let n = hi - lo;
        if m == n {
            if !complete {
                out.push(self.subtree_root(lo, hi));
            }
            return;
        }
        let k = split_point(n);
        if m <= k {
            self.subproof(m, lo, lo + k, complete, out);
            out.push(self.subtree_root(lo + k, hi));
        } else {
            self.subproof(m - k, lo + k, hi, false, out);
            out.push(self.subtree_root(lo, lo + k));
        }
    }
}

/// Check that `new_root` extends `old_root` as described by `proof`.
pub fn verify_consistency(
    proof: &ConsistencyProof,
    old_root: &Hash,
    new_root: &Hash,
) -> Result<bool, CryptoError> {
    let (old, new) = (proof.old_size, proof.new_size);
    if old == 0 || old > new {
        return Err(CryptoError::InvalidArg);
    }
    if new > MAX_LEAVES {
        return Err(CryptoError::TooManyLeaves(new));
    }
    if old == new {
        let same_root = bool::from(old_root.ct_eq(new_root));
        return Ok(proof.nodes.is_empty() && same_root);
    }

    let mut nodes = proof.nodes.iter();
    let seed = if old.is_power_of_two() {
        *old_root
    } else {
        match nodes.next() {
            Some(h) => *h,
            None => return Ok(false),
        }
    };

    let mut fnode = old - 1;
    let mut snode = new - 1;
    while fnode & 1 == 1 {
        fnode >>= 1;
        snode >>= 1;
    }

    let mut fr = seed;
    let mut sr = seed;
    for c in nodes {
        if snode == 0 {
            return Ok(false);
        }
        if fnode & 1 == 1 || fnode == snode {
            fr = node_hash(c, &fr)?;
            sr = node_hash(c, &sr)?;
            while fnode & 1 == 0 && fnode != 0 {
                fnode >>= 1;
                snode >>= 1;
            }
        } else {
            sr = node_hash(&sr, c)?;
        }
        fnode >>= 1;
        snode >>= 1;
    }

    let roots_match = bool::from(fr.ct_eq(old_root) & sr.ct_eq(new_root));
    Ok(snode == 0 && roots_match)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(n: usize) -> MerkleTree {
        MerkleTree::build((0..n).map(|i| format!("leaf_{i}"))).unwrap()
    }

    #[test]
    fn test_all_prefixes_up_to_17() {
        let roots: Vec<Hash> = (1..=17).map(|n| tree(n).root()).collect();
        for new in 1..=17 {
            let t = tree(new);
            for old in 1..=new {
                let proof = t.consistency(old).unwrap();
                assert!(
                    verify_consistency(&proof, &roots[old - 1], &roots[new - 1]).unwrap(),
                    "{old} -> {new}"
                );
            }
        }
    }

    // RFC 6962 section 2.1.3 worked example: tree of 7 leaves d0..d6.
    #[test]
    fn test_rfc_example_shapes() {
        let t = tree(7);
        // PROOF(3, D[7]) = [c, d, g, l]
        assert_eq!(t.consistency(3).unwrap().nodes.len(), 4);
        // PROOF(4, D[7]) = [l]
        let p4 = t.consistency(4).unwrap();
        assert_eq!(p4.nodes, vec![t.subtree_root(4, 7)]);
        // PROOF(6, D[7]) = [i, j, k]
        assert_eq!(t.consistency(6).unwrap().nodes.len(), 3);
    }

    #[test]
    fn test_same_size_is_empty() {
        let t = tree(6);
        let proof = t.consistency(6).unwrap();
        assert!(proof.nodes.is_empty());
        assert!(verify_consistency(&proof, &t.root(), &t.root()).unwrap());
    }

    #[test]
    fn test_wrong_roots_fail() {
        let old = tree(5).root();
        let t = tree(11);
        let proof = t.consistency(5).unwrap();
        let mut bad_old = old;
        bad_old[0] ^= 1;
        let mut bad_new = t.root();
        bad_new[31] ^= 0x80;
        assert!(!verify_consistency(&proof, &bad_old, &t.root()).unwrap());
        assert!(!verify_consistency(&proof, &old, &bad_new).unwrap());
    }

    #[test]
    fn test_tampered_or_truncated_proof_fails() {
        let old = tree(6).root();
        let t = tree(13);
        let proof = t.consistency(6).unwrap();
        for i in 0..proof.nodes.len() {
            let mut bad = proof.clone();
            bad.nodes[i][7] ^= 0x04;
            assert!(!verify_consistency(&bad, &old, &t.root()).unwrap());
        }
        let mut short = proof.clone();
        short.nodes.pop();
        assert!(!verify_consistency(&short, &old, &t.root()).unwrap());
        let mut long = proof;
        long.nodes.push([0u8; 32]);
        assert!(!verify_consistency(&long, &old, &t.root()).unwrap());
    }

    #[test]
    fn test_modified_history_fails() {
        let mut leaves: Vec<String> = (0..9).map(|i| format!("leaf_{i}")).collect();
        let honest_old = MerkleTree::build(&leaves[..4]).unwrap().root();
        leaves[1] = "rewritten".into();
        let forked = MerkleTree::build(&leaves).unwrap();
        let proof = forked.consistency(4).unwrap();
        assert!(!verify_consistency(&proof, &honest_old, &forked.root()).unwrap());
    }

    #[test]
    fn test_invalid_sizes() {
        let t = tree(4);
        assert!(matches!(t.consistency(0), Err(CryptoError::InvalidArg)));
        assert!(matches!(t.consistency(5), Err(CryptoError::InvalidArg)));
        let bogus = ConsistencyProof {
            old_size: 5,
            new_size: 4,
            nodes: Vec::new(),
        };
        assert!(verify_consistency(&bogus, &[0; 32], &[0; 32]).is_err());
    }
}
