//! SHA-3 / Keccak-{224,256,384,512} (FIPS 202 sponge construction over
//! Keccak-f[1600]).

use crate::Engine;

const ROUNDS: usize = 24;

const RC: [u64; ROUNDS] = [
    0x0000000000000001,
    0x0000000000008082,
    0x800000000000808A,
    0x8000000080008000,
    0x000000000000808B,
    0x0000000080000001,
    0x8000000080008081,
    0x8000000000008009,
    0x000000000000008A,
    0x0000000000000088,
    0x0000000080008009,
    0x000000008000000A,
    0x000000008000808B,
    0x800000000000008B,
    0x8000000000008089,
    0x8000000000008003,
    0x8000000000008002,
    0x8000000000000080,
    0x000000000000800A,
    0x800000008000000A,
    0x8000000080008081,
    0x8000000000008080,
    0x0000000080000001,
    0x8000000080008008,
];

const ROTC: [u32; ROUNDS] =
    [1, 3, 6, 10, 15, 21, 28, 36, 45, 55, 2, 14, 27, 41, 56, 8, 25, 43, 62, 18, 39, 61, 20, 44];

const PILN: [usize; ROUNDS] =
    [10, 7, 11, 17, 18, 3, 5, 16, 8, 21, 24, 4, 15, 23, 19, 13, 12, 2, 20, 14, 22, 9, 6, 1];

fn keccak_f(state: &mut [u64; 25]) {
    for round in 0..ROUNDS {
        // Theta
        let mut bc = [0u64; 5];
        for i in 0..5 {
            bc[i] = state[i] ^ state[i + 5] ^ state[i + 10] ^ state[i + 15] ^ state[i + 20];
        }
        for i in 0..5 {
            let t = bc[(i + 4) % 5] ^ bc[(i + 1) % 5].rotate_left(1);
            let mut j = i;
            while j < 25 {
                state[j] ^= t;
                j += 5;
            }
        }

        // Rho + Pi
        let mut t = state[1];
        for i in 0..24 {
            let j = PILN[i];
            let tmp = state[j];
            state[j] = t.rotate_left(ROTC[i]);
            t = tmp;
        }

        // Chi
        let mut j = 0;
        while j < 25 {
            let mut row = [0u64; 5];
            row.copy_from_slice(&state[j..j + 5]);
            for i in 0..5 {
                state[j + i] ^= (!row[(i + 1) % 5]) & row[(i + 2) % 5];
            }
            j += 5;
        }

        // Iota
        state[0] ^= RC[round];
    }
}

pub struct Keccak {
    digest_bits: usize,
    rate_bytes: usize,
    state: [u64; 25],
    buf: Vec<u8>,
}

impl Keccak {
    pub fn new(digest_bits: usize) -> Self {
        let rate_bytes = (1600 - 2 * digest_bits) / 8;
        Keccak { digest_bits, rate_bytes, state: [0u64; 25], buf: Vec::with_capacity(rate_bytes) }
    }

    fn absorb_block(&mut self, block: &[u8]) {
        debug_assert_eq!(block.len(), self.rate_bytes);
        for (lane_idx, chunk) in block.chunks_exact(8).enumerate() {
            let lane = u64::from_le_bytes(chunk.try_into().unwrap());
            self.state[lane_idx] ^= lane;
        }
        keccak_f(&mut self.state);
    }

    fn drain_full_blocks(&mut self) {
        while self.buf.len() >= self.rate_bytes {
            let block: Vec<u8> = self.buf.drain(..self.rate_bytes).collect();
            self.absorb_block(&block);
        }
    }
}

impl Engine for Keccak {
    fn update(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
        self.drain_full_blocks();
    }

    fn finish(&mut self) -> Vec<u8> {
        let mut block = vec![0u8; self.rate_bytes];
        block[..self.buf.len()].copy_from_slice(&self.buf);
        block[self.buf.len()] ^= 0x06;
        block[self.rate_bytes - 1] ^= 0x80;
        self.buf.clear();
        self.absorb_block(&block);

        let digest_len = self.digest_bits / 8;
        let mut out = Vec::with_capacity(digest_len);
        for lane in self.state.iter() {
            if out.len() >= digest_len {
                break;
            }
            let bytes = lane.to_le_bytes();
            let take = (digest_len - out.len()).min(8);
            out.extend_from_slice(&bytes[..take]);
        }
        out
    }

    fn reset(&mut self) {
        self.state = [0u64; 25];
        self.buf.clear();
    }
}
