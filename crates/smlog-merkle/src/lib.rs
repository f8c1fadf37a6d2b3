#![forbid(unsafe_code)]
#![doc = "RFC 6962 Merkle tree over SM3 for smlog."]

pub mod consistency;
pub mod hash;
pub mod kat;
pub mod non_inclusion;
pub mod proof;
pub mod tree;

pub use consistency::{verify_consistency, ConsistencyProof};
pub use hash::{leaf_hash, node_hash, Hash, HASH_SIZE, LEAF_PREFIX, NODE_PREFIX};
pub use non_inclusion::{verify_non_inclusion, NonInclusionWitness};
pub use proof::{
    ensure_inclusion, verify_inclusion, verify_inclusion_hash, AuditPath, PathStep, Side,
};
pub use tree::{MerkleTree, MAX_DEPTH, MAX_LEAVES};
