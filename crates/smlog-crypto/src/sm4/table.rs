//! T-table SM4 path.
//!
//! `T_k[b] = L(S(b) << (24 - 8k))`, so one round costs four lookups and
//! four XORs. The tables are built on first use via OnceLock and are
//! read-only afterwards.

use std::sync::OnceLock;

use super::{l, load_words, store_words_reversed, SBOX, SM4_BLOCK_SIZE, SM4_ROUNDS};

struct Sm4Tables {
    t: [[u32; 256]; 4],
}

static SM4_TABLES: OnceLock<Sm4Tables> = OnceLock::new();

fn init_tables() -> Sm4Tables {
    let mut t = [[0u32; 256]; 4];
    for b in 0..256 {
        let s = SBOX[b] as u32;
        t[0][b] = l(s << 24);
        t[1][b] = l(s << 16);
        t[2][b] = l(s << 8);
        t[3][b] = l(s);
    }
    Sm4Tables { t }
}

fn tables() -> &'static Sm4Tables {
    SM4_TABLES.get_or_init(init_tables)
}

/// Force table construction. Safe to call from any number of threads.
pub(crate) fn warm_up() {
    let _ = tables();
}

#[inline(always)]
fn t_round(t: &[[u32; 256]; 4], a: u32) -> u32 {
    t[0][(a >> 24) as usize]
        ^ t[1][((a >> 16) & 0xff) as usize]
        ^ t[2][((a >> 8) & 0xff) as usize]
        ^ t[3][(a & 0xff) as usize]
}

/// Apply the block function using the fused tables.
pub(crate) fn crypt_block(rk: &[u32; SM4_ROUNDS], block: &mut [u8; SM4_BLOCK_SIZE]) {
    let t = &tables().t;
    let mut x = load_words(block);
    for &k in rk.iter() {
        let next = x[0] ^ t_round(t, x[1] ^ x[2] ^ x[3] ^ k);
        x = [x[1], x[2], x[3], next];
    }
    store_words_reversed(&x, block);
}
