//! Known-answer self test for the tree hashing rules.

use smlog_types::CryptoError;

use crate::consistency::verify_consistency;
use crate::hash::{leaf_hash, Hash};
use crate::proof::verify_inclusion;
use crate::tree::MerkleTree;

const LEAF_A: &str = "7369a1f16e9c4ad122591b63820b962ede9d6ca74ccf0e87dcbba39ce862a8b9";
const ROOT_ABC: &str = "8d00da5c059df65cab920830e5f41bf7976871781a8af4b294556d93e38d93c2";
const ROOT_ABCDE: &str = "d71b4b916faf1d04eedd3344c0ed94cbe408c760cd18145b1a40d297099a9f06";

const LEAVES: [&[u8]; 5] = [b"A", b"B", b"C", b"D", b"E"];

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn check(name: &str, got: &Hash, expected: &str) -> Result<(), CryptoError> {
    if to_hex(got) != expected {
        log::warn!("merkle self test: {name} mismatch");
        return Err(CryptoError::IntegrityFailed);
    }
    Ok(())
}

/// Recompute the five-leaf reference tree and its proofs.
pub fn self_test() -> Result<(), CryptoError> {
    check("leaf A", &leaf_hash(b"A")?, LEAF_A)?;
    let abc = MerkleTree::build(&LEAVES[..3])?;
    check("root ABC", &abc.root(), ROOT_ABC)?;

    let tree = MerkleTree::build(LEAVES)?;
    let root = tree.root();
    check("root ABCDE", &root, ROOT_ABCDE)?;

    for (i, leaf) in LEAVES.iter().enumerate() {
        if !verify_inclusion(leaf, &tree.inclusion(i)?, &root)? {
            log::warn!("merkle self test: inclusion of leaf {i} rejected");
            return Err(CryptoError::IntegrityFailed);
        }
    }

    let mut old_root = [0u8; 32];
    hex_into(ROOT_ABC, &mut old_root)?;
    if !verify_consistency(&tree.consistency(3)?, &old_root, &root)? {
        log::warn!("merkle self test: consistency 3 -> 5 rejected");
        return Err(CryptoError::IntegrityFailed);
    }
    Ok(())
}

fn hex_into(s: &str, out: &mut [u8]) -> Result<(), CryptoError> {
    if s.len() != out.len() * 2 {
        return Err(CryptoError::InvalidArg);
    }
    for (i, b) in out.iter_mut().enumerate() {
        *b = u8::from_str_radix(&s[2 * i..2 * i + 2], 16).map_err(|_| CryptoError::InvalidArg)?;
    }
    Ok(())
}
