//! Domain-separated SM3 hashing (RFC 6962 section 2.1).

use smlog_crypto::sm3::{Sm3, SM3_LANES, SM3_OUTPUT_SIZE};
use smlog_types::CryptoError;

/// Size of every tree hash in bytes.
pub const HASH_SIZE: usize = SM3_OUTPUT_SIZE;

/// A leaf or interior node hash.
pub type Hash = [u8; HASH_SIZE];

/// Prefix byte for leaf hashing.
pub const LEAF_PREFIX: u8 = 0x00;

/// Prefix byte for interior node hashing.
pub const NODE_PREFIX: u8 = 0x01;

/// `SM3(0x00 || data)`
pub fn leaf_hash(data: &[u8]) -> Result<Hash, CryptoError> {
    let mut ctx = Sm3::new();
    ctx.update(&[LEAF_PREFIX])?;
    ctx.update(data)?;
    ctx.finish()
}

/// `SM3(0x01 || left || right)`
pub fn node_hash(left: &Hash, right: &Hash) -> Result<Hash, CryptoError> {
    let mut buf = [0u8; 1 + 2 * HASH_SIZE];
    buf[0] = NODE_PREFIX;
    buf[1..1 + HASH_SIZE].copy_from_slice(left);
    buf[1 + HASH_SIZE..].copy_from_slice(right);
    Sm3::digest(&buf)
}

/// Leaf hashes of `leaves`, four messages per SM3 call.
pub(crate) fn leaf_hashes<L: AsRef<[u8]>>(leaves: &[L]) -> Result<Vec<Hash>, CryptoError> {
    let mut out = Vec::with_capacity(leaves.len());
    let mut groups = leaves.chunks_exact(SM3_LANES);
    let tag: &[u8] = &[LEAF_PREFIX];
    for g in &mut groups {
        let parts: [[&[u8]; 2]; SM3_LANES] = [
            [tag, g[0].as_ref()],
            [tag, g[1].as_ref()],
            [tag, g[2].as_ref()],
            [tag, g[3].as_ref()],
        ];
        let digests = Sm3::digest_parts_x4([&parts[0], &parts[1], &parts[2], &parts[3]])?;
        out.extend(digests);
    }
    for leaf in groups.remainder() {
        out.push(leaf_hash(leaf.as_ref())?);
    }
    Ok(out)
}

/// The level above `level`: adjacent pairs hashed, four pairs per SM3
/// call, an unpaired last node promoted unchanged.
pub(crate) fn parent_level(level: &[Hash]) -> Result<Vec<Hash>, CryptoError> {
    let mut out = Vec::with_capacity(level.len().div_ceil(2));
    let mut groups = level.chunks_exact(2 * SM3_LANES);
    let tag: &[u8] = &[NODE_PREFIX];
    for g in &mut groups {
        let parts: [[&[u8]; 3]; SM3_LANES] = [
            [tag, &g[0], &g[1]],
            [tag, &g[2], &g[3]],
            [tag, &g[4], &g[5]],
            [tag, &g[6], &g[7]],
        ];
        let digests = Sm3::digest_parts_x4([&parts[0], &parts[1], &parts[2], &parts[3]])?;
        out.extend(digests);
    }
    for pair in groups.remainder().chunks(2) {
        out.push(match pair {
            [l, r] => node_hash(l, r)?,
            [only] => *only,
            _ => return Err(CryptoError::InvalidArg),
        });
    }
    Ok(out)
}

/// Largest power of two strictly less than `n`. `n` must be at least 2.
pub(crate) fn split_point(n: usize) -> usize {
    debug_assert!(n >= 2);
    1 << (usize::BITS - 1 - (n - 1).leading_zeros())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn test_leaf_hash_prefix() {
        assert_eq!(
            hex(&leaf_hash(b"A").unwrap()),
            "7369a1f16e9c4ad122591b63820b962ede9d6ca74ccf0e87dcbba39ce862a8b9"
        );
        assert_eq!(
            hex(&leaf_hash(b"").unwrap()),
            "2daef60e7a0b8f5e024c81cd2ab3109f2b4f155cf83adeb2ae5532f74a157fdf"
        );
        assert_eq!(leaf_hash(b"").unwrap(), Sm3::digest(&[0x00]).unwrap());
    }

    #[test]
    fn test_leaf_and_node_domains_differ() {
        let a = leaf_hash(b"A").unwrap();
        let b = leaf_hash(b"B").unwrap();
        let mut raw = Vec::new();
        raw.extend_from_slice(&a);
        raw.extend_from_slice(&b);
        // A leaf whose bytes equal a node's children must not collide with the node.
        assert_ne!(leaf_hash(&raw).unwrap(), node_hash(&a, &b).unwrap());
        assert_ne!(node_hash(&a, &b).unwrap(), node_hash(&b, &a).unwrap());
    }

    #[test]
    fn test_batched_leaf_hashes_match_single() {
        for n in 0..=11 {
            let leaves: Vec<Vec<u8>> = (0..n).map(|i| vec![b'x'; i * 13]).collect();
            let batched = leaf_hashes(&leaves).unwrap();
            assert_eq!(batched.len(), n);
            for (h, leaf) in batched.iter().zip(&leaves) {
                assert_eq!(*h, leaf_hash(leaf).unwrap());
            }
        }
    }

    #[test]
    fn test_parent_level_matches_node_hash() {
        for n in 1usize..=19 {
            let level: Vec<Hash> = (0..n).map(|i| leaf_hash(&[i as u8]).unwrap()).collect();
            let parents = parent_level(&level).unwrap();
            assert_eq!(parents.len(), n.div_ceil(2));
            for (j, p) in parents.iter().enumerate() {
                match level.get(2 * j + 1) {
                    Some(r) => assert_eq!(*p, node_hash(&level[2 * j], r).unwrap()),
                    None => assert_eq!(*p, level[2 * j]),
                }
            }
        }
    }

    #[test]
    fn test_split_point() {
        assert_eq!(split_point(2), 1);
        assert_eq!(split_point(3), 2);
        assert_eq!(split_point(4), 2);
        assert_eq!(split_point(5), 4);
        assert_eq!(split_point(8), 4);
        assert_eq!(split_point(9), 8);
        assert_eq!(split_point(100_000), 65_536);
    }
}
