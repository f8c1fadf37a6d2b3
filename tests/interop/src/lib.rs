//! Integration tests for smlog.
//! Cross-crate scenarios: SM4 and SM3 vectors, and Merkle logs over SM3.

#[cfg(test)]
mod tests {
    use smlog_crypto::modes::{cbc, ctr};
    use smlog_crypto::sm3::Sm3;
    use smlog_crypto::sm4::{Sm4, Sm4Backend, Sm4Key};
    use smlog_merkle::{
        ensure_inclusion, leaf_hash, verify_consistency, verify_inclusion, verify_non_inclusion,
        MerkleTree,
    };
    use smlog_types::{CryptoError, Direction, ErrorKind};

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    fn to_hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    fn block(s: &str) -> [u8; 16] {
        hex(s).try_into().unwrap()
    }

    // -------------------------------------------------------
    // S1. SM4 standard vector, every backend
    // -------------------------------------------------------
    #[test]
    fn test_sm4_standard_vector() {
        let key = hex("0123456789abcdeffedcba9876543210");
        for backend in [Sm4Backend::Auto, Sm4Backend::Basic, Sm4Backend::Table, Sm4Backend::Simd] {
            if !backend.is_available() {
                continue;
            }
            let enc = Sm4::with_backend(&key, Direction::Encrypt, backend).unwrap();
            let mut b = block("0123456789abcdeffedcba9876543210");
            enc.crypt_block(&mut b);
            assert_eq!(
                to_hex(&b),
                "681edf34d206965e86b3e94f536e4246",
                "{}",
                backend.name()
            );

            let dec = Sm4::with_backend(&key, Direction::Decrypt, backend).unwrap();
            dec.crypt_block(&mut b);
            assert_eq!(to_hex(&b), "0123456789abcdeffedcba9876543210");
        }
    }

    // -------------------------------------------------------
    // S2. SM4 alternate key vector
    // -------------------------------------------------------
    #[test]
    fn test_sm4_alternate_key_vector() {
        let key = Sm4Key::new(&hex("fedcba98765432100123456789abcdef")).unwrap();
        let mut b = block("000102030405060708090a0b0c0d0e0f");
        key.crypt_block(&mut b);
        assert_eq!(to_hex(&b), "f766678f13f01adeac1b3ea955adb594");
    }

    // -------------------------------------------------------
    // S3 / S4 / S5. SM3 digests, one-shot and streamed
    // -------------------------------------------------------
    #[test]
    fn test_sm3_vectors() {
        let cases: [(&[u8], &str); 3] = [
            (b"", "1ab21d8355cfa17f8e61194831e81a8f22bec8c728fefb747ed035eb5082aa2b"),
            (b"abc", "66c7f0f462eeedd9d1f2d46bdc10e4e24167c4875cf2f7a2297da02b8f4ba8e0"),
            (
                b"abcdabcdabcdabcdabcdabcdabcdabcdabcdabcdabcdabcdabcdabcdabcdabcd",
                "debe9ff92275b8a138604889c18e5a4d6fdb70e5387e5765293dcba39c0c5732",
            ),
        ];
        for (msg, expected) in cases {
            assert_eq!(to_hex(&Sm3::digest(msg).unwrap()), expected);

            let mut ctx = Sm3::new();
            for chunk in msg.chunks(7) {
                ctx.update(chunk).unwrap();
            }
            assert_eq!(to_hex(&ctx.finish().unwrap()), expected);
        }
    }

    // -------------------------------------------------------
    // S6. Five-leaf Merkle tree
    // -------------------------------------------------------
    #[test]
    fn test_merkle_five_leaves() {
        let leaves: [&[u8]; 5] = [b"A", b"B", b"C", b"D", b"E"];
        let tree = MerkleTree::build(leaves).unwrap();
        let root = tree.root();
        assert_eq!(
            to_hex(&root),
            "d71b4b916faf1d04eedd3344c0ed94cbe408c760cd18145b1a40d297099a9f06"
        );
        assert_eq!(MerkleTree::build(leaves).unwrap().root(), root);

        for (i, leaf) in leaves.iter().enumerate() {
            let path = tree.inclusion(i).unwrap();
            assert!(verify_inclusion(leaf, &path, &root).unwrap());

            for s in 0..path.len() {
                for byte in 0..32 {
                    let mut bad = path.clone();
                    bad.steps_mut()[s].sibling[byte] ^= 0x01;
                    assert!(!verify_inclusion(leaf, &bad, &root).unwrap());
                }
            }
        }

        let path = tree.inclusion(2).unwrap();
        let mut bad_root = root;
        bad_root[17] ^= 0x40;
        assert!(!verify_inclusion(b"C", &path, &bad_root).unwrap());
    }

    // -------------------------------------------------------
    // S7. 100,000-leaf tree, seeded sample of indices
    // -------------------------------------------------------
    #[test]
    fn test_merkle_large_tree() {
        const N: usize = 100_000;
        let leaves: Vec<String> = (0..N).map(|i| format!("leaf_{i}")).collect();
        let tree = MerkleTree::build(&leaves).unwrap();
        assert_eq!(tree.len(), N);
        assert_eq!(tree.depth(), 17);
        let root = tree.root();

        // 64-bit LCG (Knuth MMIX constants), fixed seed.
        let mut state: u64 = 0x5eed_0000_0000_0001;
        for _ in 0..10 {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let i = (state >> 33) as usize % N;
            let path = tree.inclusion(i).unwrap();
            assert!(path.len() <= 17, "index {i}: {} siblings", path.len());
            assert!(verify_inclusion(leaves[i].as_bytes(), &path, &root).unwrap());
        }
    }

    // -------------------------------------------------------
    // Encrypt records with SM4-CTR, commit ciphertexts to a log
    // -------------------------------------------------------
    #[test]
    fn test_encrypted_log_roundtrip() {
        let key = hex("0123456789abcdeffedcba9876543210");
        let sm4 = Sm4::new(&key, Direction::Encrypt).unwrap();
        let records: [&[u8]; 4] = [
            b"login alice",
            b"rotate key 7",
            b"",
            b"a considerably longer record spanning several cipher blocks of data",
        ];

        let mut state = ctr::CtrState::new([0u8; 16]);
        let mut sealed = Vec::new();
        for r in &records {
            let mut out = vec![0u8; r.len()];
            sm4.crypt_ctr(&mut state, r, &mut out).unwrap();
            sealed.push(out);
        }

        let tree = MerkleTree::build(&sealed).unwrap();
        for (i, ct) in sealed.iter().enumerate() {
            ensure_inclusion(ct, &tree.inclusion(i).unwrap(), &tree.root()).unwrap();
        }

        let mut state = ctr::CtrState::new([0u8; 16]);
        for (ct, pt) in sealed.iter().zip(&records) {
            let mut out = ct.clone();
            ctr::ctr_crypt_in_place(&sm4, &mut state, &mut out).unwrap();
            assert_eq!(&out[..], *pt);
        }

        let err = ensure_inclusion(b"forged", &tree.inclusion(0).unwrap(), &tree.root())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IntegrityFailed);
    }

    // -------------------------------------------------------
    // CBC-sealed snapshot, log grows, old head stays consistent
    // -------------------------------------------------------
    #[test]
    fn test_growing_log_consistency() {
        let key = hex("fedcba98765432100123456789abcdef");
        let enc = Sm4::new(&key, Direction::Encrypt).unwrap();
        let dec = Sm4::new(&key, Direction::Decrypt).unwrap();

        let mut entries: Vec<Vec<u8>> = Vec::new();
        let mut heads = Vec::new();
        for i in 0..12u8 {
            let mut data = [i; 32];
            let mut iv = [0xa5u8; 16];
            cbc::cbc_crypt_in_place(&enc, Direction::Encrypt, &mut iv, &mut data).unwrap();
            entries.push(data.to_vec());
            heads.push(MerkleTree::build(&entries).unwrap().root());
        }

        let latest = MerkleTree::build(&entries).unwrap();
        for old in 1..=entries.len() {
            let proof = latest.consistency(old).unwrap();
            assert!(verify_consistency(&proof, &heads[old - 1], &latest.root()).unwrap());
        }

        let mut iv = [0xa5u8; 16];
        let mut data = entries[3].clone();
        cbc::cbc_crypt_in_place(&dec, Direction::Decrypt, &mut iv, &mut data).unwrap();
        assert_eq!(data, vec![3u8; 32]);
    }

    // -------------------------------------------------------
    // Non-inclusion over a hash-ordered log
    // -------------------------------------------------------
    #[test]
    fn test_revocation_list_non_inclusion() {
        let revoked: Vec<String> = (0..50).map(|i| format!("serial:{i:04}")).collect();
        let tree = MerkleTree::build_sorted(&revoked).unwrap();
        let root = tree.root();

        let mut answered = 0;
        for i in 50..150 {
            let target = leaf_hash(format!("serial:{i:04}").as_bytes()).unwrap();
            match tree.non_inclusion(&target) {
                Ok(w) => {
                    assert!(verify_non_inclusion(&target, &w, &root).unwrap());
                    answered += 1;
                }
                Err(e) => assert_eq!(e, CryptoError::TargetOutOfRange),
            }
        }
        assert!(answered > 0);

        let present = leaf_hash(b"serial:0007").unwrap();
        assert_eq!(
            tree.non_inclusion(&present).unwrap_err(),
            CryptoError::TargetPresent
        );

        let unordered = MerkleTree::build(&revoked).unwrap();
        let err = unordered.non_inclusion(&present).unwrap_err();
        assert_eq!(err, CryptoError::UnorderedTree);
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    // -------------------------------------------------------
    // Power-on self tests of both crates
    // -------------------------------------------------------
    #[test]
    fn test_self_tests_pass() {
        smlog_crypto::selftest::run_all_kat().unwrap();
        smlog_merkle::kat::self_test().unwrap();
    }
}
