//! SM3 compression function (GB/T 32905-2016, section 5.3).

use super::SM3_BLOCK_SIZE;

pub(crate) const IV: [u32; 8] = [
    0x7380166f, 0x4914b2b9, 0x172442d7, 0xda8a0600, 0xa96f30bc, 0x163138aa, 0xe38dee4d, 0xb0fb0e4e,
];

const T_LOW: u32 = 0x79cc4519;
const T_HIGH: u32 = 0x7a879d8a;

#[inline(always)]
fn p0(x: u32) -> u32 {
    x ^ x.rotate_left(9) ^ x.rotate_left(17)
}

#[inline(always)]
fn p1(x: u32) -> u32 {
    x ^ x.rotate_left(15) ^ x.rotate_left(23)
}

/// Load a block as sixteen big-endian words.
#[inline]
pub(crate) fn load_block(block: &[u8; SM3_BLOCK_SIZE]) -> [u32; 16] {
    let mut w = [0u32; 16];
    for (word, bytes) in w.iter_mut().zip(block.chunks_exact(4)) {
        *word = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    }
    w
}

/// Compress one block whose words are already loaded.
pub(crate) fn compress_words(state: &mut [u32; 8], m: &[u32; 16]) {
    let mut w = [0u32; 68];
    w[..16].copy_from_slice(m);
    for j in 16..68 {
        w[j] = p1(w[j - 16] ^ w[j - 9] ^ w[j - 3].rotate_left(15))
            ^ w[j - 13].rotate_left(7)
            ^ w[j - 6];
    }

    let [mut a, mut b, mut c, mut d, mut e, mut f, mut g, mut h] = *state;

    for j in 0..64 {
        let (t, ff, gg) = if j < 16 {
            (T_LOW, a ^ b ^ c, e ^ f ^ g)
        } else {
            (T_HIGH, (a & b) | (a & c) | (b & c), (e & f) | (!e & g))
        };
        let a12 = a.rotate_left(12);
        let ss1 = a12
            .wrapping_add(e)
            .wrapping_add(t.rotate_left(j as u32 % 32))
            .rotate_left(7);
        let ss2 = ss1 ^ a12;
        let tt1 = ff
            .wrapping_add(d)
            .wrapping_add(ss2)
            .wrapping_add(w[j] ^ w[j + 4]);
        let tt2 = gg.wrapping_add(h).wrapping_add(ss1).wrapping_add(w[j]);
        d = c;
        c = b.rotate_left(9);
        b = a;
        a = tt1;
        h = g;
        g = f.rotate_left(19);
        f = e;
        e = p0(tt2);
    }

    state[0] ^= a;
    state[1] ^= b;
    state[2] ^= c;
    state[3] ^= d;
    state[4] ^= e;
    state[5] ^= f;
    state[6] ^= g;
    state[7] ^= h;
}

/// Compress one 64-byte block.
#[inline]
pub(crate) fn compress(state: &mut [u32; 8], block: &[u8; SM3_BLOCK_SIZE]) {
    compress_words(state, &load_block(block));
}
