#![no_main]
use libfuzzer_sys::fuzz_target;
use smlog_crypto::sm3::{Sm3, Sm3Backend};

fuzz_target!(|data: &[u8]| {
    let Some((&split, msg)) = data.split_first() else {
        return;
    };
    let expected = Sm3::digest(msg).unwrap();

    let step = usize::from(split).max(1);
    let mut ctx = Sm3::with_backend(Sm3Backend::Scalar).unwrap();
    for chunk in msg.chunks(step) {
        ctx.update(chunk).unwrap();
    }
    assert_eq!(ctx.finish().unwrap(), expected);
});
