#![no_main]
use libfuzzer_sys::fuzz_target;
use smlog_crypto::modes::{cbc, ctr};
use smlog_crypto::sm4::Sm4;
use smlog_types::Direction;

fuzz_target!(|data: &[u8]| {
    if data.len() < 32 {
        return;
    }
    let (key, rest) = data.split_at(16);
    let (iv, msg) = rest.split_at(16);
    let iv: [u8; 16] = iv.try_into().unwrap();
    let enc = Sm4::new(key, Direction::Encrypt).unwrap();
    let dec = Sm4::new(key, Direction::Decrypt).unwrap();

    let mut state = ctr::CtrState::new(iv);
    let mut buf = msg.to_vec();
    ctr::ctr_crypt_in_place(&enc, &mut state, &mut buf).unwrap();
    let mut state = ctr::CtrState::new(iv);
    ctr::ctr_crypt_in_place(&enc, &mut state, &mut buf).unwrap();
    assert_eq!(buf, msg);

    let aligned = &msg[..msg.len() / 16 * 16];
    let mut buf = aligned.to_vec();
    let mut chain = iv;
    cbc::cbc_crypt_in_place(&enc, Direction::Encrypt, &mut chain, &mut buf).unwrap();
    let mut chain = iv;
    cbc::cbc_crypt_in_place(&dec, Direction::Decrypt, &mut chain, &mut buf).unwrap();
    assert_eq!(buf, aligned);

    if msg.len() % 16 != 0 {
        let mut buf = msg.to_vec();
        let mut chain = iv;
        assert!(cbc::cbc_crypt_in_place(&enc, Direction::Encrypt, &mut chain, &mut buf).is_err());
        assert_eq!(buf, msg);
    }
});
