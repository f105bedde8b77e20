//! Context-triggered piecewise hashing (ssdeep/spamsum-style) and its
//! signature comparator.
//!
//! [`FuzzyHasher`] walks an input once, maintaining a 7-byte rolling hash
//! ([`roll`]) alongside up to [`blockhash::NUM_BLOCKHASHES`] concurrent
//! FNV-style accumulators ([`blockhash`]), one per candidate block size.
//! Whenever the rolling hash hits a reset point for a given block size, that
//! accumulator emits a base64 digest character and restarts; [`compare`]
//! scores two such signatures using a common-substring filter plus a
//! weighted [`edit_dist`].

pub mod roll;
pub mod blockhash;
pub mod edit_dist;

use crate::Error;
use blockhash::{block_size, sum_hash, BlockHashContext, HASH_INIT, NUM_BLOCKHASHES, SPAMSUM_LENGTH};
use roll::{RollState, ROLLING_WINDOW};

const B64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

bitflags::bitflags! {
    /// Digest-emission tweaks. Neither is the default; both mirror optional
    /// flags the reference hasher accepts.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Flags: u32 {
        /// Collapse runs of more than 3 identical output characters to 3.
        const ELIMSEQ = 0x1;
        /// Don't halve-truncate the second signature half.
        const NOTRUNC = 0x2;
    }
}

/// Incremental piecewise hash state.
pub struct FuzzyHasher {
    bhstart: usize,
    bhend: usize,
    bh: Vec<BlockHashContext>,
    total_size: u64,
    roll: RollState,
}

impl FuzzyHasher {
    pub fn new() -> Self {
        let mut bh = Vec::with_capacity(NUM_BLOCKHASHES);
        for _ in 0..NUM_BLOCKHASHES {
            bh.push(BlockHashContext::new());
        }
        Self { bhstart: 0, bhend: 1, bh, total_size: 0, roll: RollState::new() }
    }

    fn try_fork_blockhash(&mut self) {
        if self.bhend >= NUM_BLOCKHASHES {
            return;
        }
        let (h, halfh) = {
            let prev = &self.bh[self.bhend - 1];
            (prev.h, prev.halfh)
        };
        let next = &mut self.bh[self.bhend];
        next.h = h;
        next.halfh = halfh;
        next.digest.clear();
        self.bhend += 1;
    }

    fn try_reduce_blockhash(&mut self) {
        if self.bhend - self.bhstart < 2 {
            return;
        }
        if block_size(self.bhstart) * SPAMSUM_LENGTH as u64 >= self.total_size {
            return;
        }
        if self.bh[self.bhstart + 1].digest.len() < SPAMSUM_LENGTH / 2 {
            return;
        }
        self.bhstart += 1;
    }

    fn step(&mut self, c: u8) {
        self.roll.hash(c);
        let h = self.roll.sum() as u64;

        for i in self.bhstart..self.bhend {
            self.bh[i].h = sum_hash(c, self.bh[i].h);
            self.bh[i].halfh = sum_hash(c, self.bh[i].halfh);
        }

        // bhend can grow inside this loop (a fork), and the reference
        // hasher re-checks it on every iteration rather than fixing the
        // bound up front, so a freshly forked slot can still fire on the
        // same input byte.
        let mut i = self.bhstart;
        while i < self.bhend {
            let bs = block_size(i);
            if h % bs != bs - 1 {
                break;
            }
            if self.bh[i].digest.is_empty() {
                self.try_fork_blockhash();
            }
            if self.bh[i].digest.len() < SPAMSUM_LENGTH - 1 {
                let ch = B64[(self.bh[i].h % 64) as usize];
                self.bh[i].digest.push(ch);
                self.bh[i].h = HASH_INIT;
                if self.bh[i].digest.len() < SPAMSUM_LENGTH / 2 {
                    self.bh[i].halfh = HASH_INIT;
                }
            } else {
                self.try_reduce_blockhash();
            }
            i += 1;
        }
    }

    /// Feeds more bytes into the hash. May be called repeatedly.
    pub fn update(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.total_size = self.total_size.checked_add(bytes.len() as u64).ok_or(Error::Overflow)?;
        for &c in bytes {
            self.step(c);
        }
        Ok(())
    }

    /// Renders the signature accumulated so far as `"blocksize:part1:part2"`.
    pub fn digest(&self, flags: Flags) -> Result<String, Error> {
        let mut bi = self.bhstart;
        while block_size(bi) * SPAMSUM_LENGTH as u64 < self.total_size {
            bi += 1;
            if bi >= NUM_BLOCKHASHES {
                return Err(Error::Overflow);
            }
        }
        while bi >= self.bhend {
            bi -= 1;
        }
        while bi > self.bhstart && self.bh[bi].digest.len() < SPAMSUM_LENGTH / 2 {
            bi -= 1;
        }

        let h = self.roll.sum();
        let mut out = String::new();
        out.push_str(&block_size(bi).to_string());
        out.push(':');

        let part1 = emit_part(&self.bh[bi].digest, flags, self.bh[bi].h, h);
        out.push_str(&part1);
        out.push(':');

        if bi + 1 < self.bhend {
            let ctx = &self.bh[bi + 1];
            let mut raw = ctx.digest.clone();
            if !flags.contains(Flags::NOTRUNC) && raw.len() > SPAMSUM_LENGTH / 2 - 1 {
                raw.truncate(SPAMSUM_LENGTH / 2 - 1);
            }
            let trailing_h = if flags.contains(Flags::NOTRUNC) { ctx.h } else { ctx.halfh };
            out.push_str(&emit_part(&raw, flags, trailing_h, h));
        } else if h != 0 {
            out.push(B64[(self.bh[bi].h % 64) as usize] as char);
        }

        Ok(out)
    }
}

/// Renders one digest half: the (optionally collapsed) stored characters,
/// plus a trailing character drawn from the live accumulator if it hasn't
/// been reset back to empty since the last emitted character.
fn emit_part(digest: &[u8], flags: Flags, trailing_h: u32, roll_sum: u32) -> String {
    let mut out = if flags.contains(Flags::ELIMSEQ) {
        eliminate_sequences(digest)
    } else {
        digest.to_vec()
    };
    if roll_sum != 0 {
        let c = B64[(trailing_h % 64) as usize];
        let n = out.len();
        let repeats_last_three =
            flags.contains(Flags::ELIMSEQ) && n >= 3 && out[n - 1] == c && out[n - 2] == c && out[n - 3] == c;
        if !repeats_last_three {
            out.push(c);
        }
    }
    String::from_utf8(out).expect("digest alphabet is ASCII")
}

/// Collapses runs of more than 3 identical bytes down to 3, operating
/// against the original run rather than an already-collapsed buffer — the
/// two approaches agree byte-for-byte since a run only ever collapses
/// against its own preceding members.
fn eliminate_sequences(input: &[u8]) -> Vec<u8> {
    if input.len() < 3 {
        return input.to_vec();
    }
    let mut out = Vec::with_capacity(input.len());
    out.extend_from_slice(&input[0..3]);
    for i in 3..input.len() {
        let c = input[i];
        if c != input[i - 1] || c != input[i - 2] || c != input[i - 3] {
            out.push(c);
        }
    }
    out
}

fn has_common_substring(s1: &[u8], s2: &[u8]) -> bool {
    if s1.len() < ROLLING_WINDOW || s2.len() < ROLLING_WINDOW {
        return false;
    }
    let mut hashes = vec![0u32; s1.len()];
    let mut state = RollState::new();
    for (i, &c) in s1.iter().enumerate() {
        state.hash(c);
        hashes[i] = state.sum();
    }

    let mut state2 = RollState::new();
    for i in 0..s2.len() {
        state2.hash(s2[i]);
        if i < ROLLING_WINDOW - 1 {
            continue;
        }
        let h = state2.sum();
        let s2_start = i + 1 - ROLLING_WINDOW;
        for (j, &hj) in hashes.iter().enumerate().skip(ROLLING_WINDOW - 1) {
            if hj == 0 || hj != h {
                continue;
            }
            let s1_start = j + 1 - ROLLING_WINDOW;
            if s2[s2_start..s2_start + ROLLING_WINDOW] == s1[s1_start..s1_start + ROLLING_WINDOW] {
                return true;
            }
        }
    }
    false
}

fn score_strings(s1: &[u8], s2: &[u8], blocksize: u64) -> u32 {
    if s1.len() > SPAMSUM_LENGTH || s2.len() > SPAMSUM_LENGTH {
        return 0;
    }
    if !has_common_substring(s1, s2) {
        return 0;
    }

    let raw = edit_dist::distance(s1, s2) as u64;
    let mut score = (raw * SPAMSUM_LENGTH as u64) / (s1.len() + s2.len()) as u64;
    score = (100 * score) / SPAMSUM_LENGTH as u64;
    if score >= 100 {
        return 0;
    }
    score = 100 - score;

    let cap = (blocksize / blockhash::MIN_BLOCKSIZE as u64) * s1.len().min(s2.len()) as u64;
    score.min(cap) as u32
}

fn parse_prefix(sig: &str) -> Result<(u64, &str), Error> {
    let (num, rest) = sig.split_once(':').ok_or(Error::BadSignature)?;
    let bs: u64 = num.parse().map_err(|_| Error::BadSignature)?;
    Ok((bs, rest))
}

fn split_halves(collapsed: &[u8]) -> Result<(&[u8], &[u8]), Error> {
    let idx = collapsed.iter().position(|&b| b == b':').ok_or(Error::BadSignature)?;
    let (part1, rest) = (&collapsed[..idx], &collapsed[idx + 1..]);
    let part2 = match rest.iter().position(|&b| b == b',') {
        Some(comma) => &rest[..comma],
        None => rest,
    };
    Ok((part1, part2))
}

/// Compares two signatures, returning a score from 0 (no match) to 100
/// (identical). Signatures whose block sizes aren't equal or a factor of
/// two apart can never match and score 0 rather than erroring.
pub fn compare(sig1: &str, sig2: &str) -> Result<u32, Error> {
    let (bs1, rest1) = parse_prefix(sig1)?;
    let (bs2, rest2) = parse_prefix(sig2)?;
    if bs1 != bs2 && bs1 != bs2 * 2 && bs2 != bs1 * 2 {
        return Ok(0);
    }

    let s1 = eliminate_sequences(rest1.as_bytes());
    let s2 = eliminate_sequences(rest2.as_bytes());
    let (s1_1, s1_2) = split_halves(&s1)?;
    let (s2_1, s2_2) = split_halves(&s2)?;

    let score = if bs1 == bs2 {
        score_strings(s1_1, s2_1, bs1).max(score_strings(s1_2, s2_2, bs1 * 2))
    } else if bs1 == bs2 * 2 {
        score_strings(s1_1, s2_2, bs1)
    } else {
        score_strings(s1_2, s2_1, bs2)
    };
    Ok(score)
}

/// Hashes a complete buffer in one call.
pub fn hash_buffer(bytes: &[u8]) -> Result<String, Error> {
    let mut hasher = FuzzyHasher::new();
    hasher.update(bytes)?;
    hasher.digest(Flags::empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_digest_is_bare() {
        assert_eq!(hash_buffer(b"").unwrap(), "3::");
    }

    #[test]
    fn digest_shape_is_blocksize_colon_part_colon_part() {
        let text: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        let sig = hash_buffer(&text).unwrap();
        let mut fields = sig.split(':');
        let bs: u64 = fields.next().unwrap().parse().unwrap();
        assert!(bs >= 3);
        let part1 = fields.next().unwrap();
        let part2 = fields.next().unwrap();
        assert!(part1.len() <= SPAMSUM_LENGTH);
        assert!(part2.len() <= SPAMSUM_LENGTH / 2);
        assert!(fields.next().is_none());
    }

    #[test]
    fn identical_buffers_compare_to_100() {
        let text: Vec<u8> = b"the quick brown fox jumps over the lazy dog repeatedly and at length "
            .iter()
            .cycle()
            .take(4000)
            .copied()
            .collect();
        let sig = hash_buffer(&text).unwrap();
        assert_eq!(compare(&sig, &sig).unwrap(), 100);
    }

    #[test]
    fn compare_is_symmetric() {
        let a: Vec<u8> = (0..3000u32).map(|i| (i % 97) as u8).collect();
        let mut b = a.clone();
        b[1500] ^= 0xFF;
        let sig_a = hash_buffer(&a).unwrap();
        let sig_b = hash_buffer(&b).unwrap();
        assert_eq!(compare(&sig_a, &sig_b).unwrap(), compare(&sig_b, &sig_a).unwrap());
    }

    #[test]
    fn unrelated_buffers_score_low() {
        let a: Vec<u8> = (0..3000u32).map(|i| (i % 97) as u8).collect();
        let b: Vec<u8> = (0..3000u32).map(|i| ((i * 37 + 11) % 251) as u8).collect();
        let sig_a = hash_buffer(&a).unwrap();
        let sig_b = hash_buffer(&b).unwrap();
        assert!(compare(&sig_a, &sig_b).unwrap() < 50);
    }

    #[test]
    fn mismatched_block_size_factor_scores_zero() {
        assert_eq!(compare("3:abc:def", "12:abc:def").unwrap(), 0);
    }

    #[test]
    fn malformed_signature_is_rejected() {
        assert!(compare("not-a-signature", "3:abc:def").is_err());
    }

    #[test]
    fn eliminate_sequences_collapses_long_runs() {
        assert_eq!(eliminate_sequences(b"aaaaaaa"), b"aaa");
        assert_eq!(eliminate_sequences(b"aaaaXaaaa"), b"aaaXaaa");
    }
}
