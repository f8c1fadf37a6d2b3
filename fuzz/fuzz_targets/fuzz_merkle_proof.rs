#![no_main]
use libfuzzer_sys::fuzz_target;
use smlog_merkle::{verify_inclusion, AuditPath, MerkleTree, PathStep, Side};

// Leaves are the input split on 0x00; trailing bytes of the input also drive
// an attacker-shaped path that must never verify a foreign leaf.
fuzz_target!(|data: &[u8]| {
    let leaves: Vec<&[u8]> = data.split(|b| *b == 0).take(64).collect();
    let Ok(tree) = MerkleTree::build(&leaves) else {
        return;
    };
    let root = tree.root();
    for (i, leaf) in leaves.iter().enumerate() {
        let path = tree.inclusion(i).unwrap();
        assert!(verify_inclusion(leaf, &path, &root).unwrap());
    }

    let steps = data
        .chunks_exact(33)
        .map(|c| PathStep {
            sibling: c[1..].try_into().unwrap(),
            side: if c[0] & 1 == 0 {
                Side::Left
            } else {
                Side::Right
            },
        })
        .collect();
    let forged = AuditPath::new(data.len() % 70, data.len() % 71 + 1, steps);
    if let Ok(true) = verify_inclusion(b"\x00not a leaf", &forged, &root) {
        panic!("forged path accepted");
    }
});
