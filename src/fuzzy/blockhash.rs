//! Per-blocksize FNV-style accumulators that feed the digest.
//!
//! A [`FuzzyHasher`](super::FuzzyHasher) keeps several of these alive at
//! once, one per candidate block size, since the right block size for a
//! given input isn't known until hashing is done. `SSDEEP_BS(i) = 3 << i`
//! gives the block size for hash index `i`.

pub const MIN_BLOCKSIZE: u32 = 3;
pub const HASH_PRIME: u32 = 0x0100_0193;
pub const HASH_INIT: u32 = 0x2802_1967;
pub const NUM_BLOCKHASHES: usize = 31;
pub const SPAMSUM_LENGTH: usize = 64;

pub fn block_size(index: usize) -> u64 {
    (MIN_BLOCKSIZE as u64) << index
}

/// Non-rolling FNV-style hash step used to accumulate each block hash.
pub fn sum_hash(c: u8, h: u32) -> u32 {
    h.wrapping_mul(HASH_PRIME) ^ (c as u32)
}

/// Accumulator state for one candidate block size.
pub struct BlockHashContext {
    pub h: u32,
    pub halfh: u32,
    pub digest: Vec<u8>,
}

impl BlockHashContext {
    pub fn new() -> Self {
        Self { h: HASH_INIT, halfh: HASH_INIT, digest: Vec::with_capacity(SPAMSUM_LENGTH) }
    }
}
