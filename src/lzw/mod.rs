//! LZW compression, byte-compatible with the classic Unix `compress(1)` `.Z` format.
//!
//! Variable code width from 9 up to `maxbits` bits, an open-addressed encoder
//! dictionary, and (in block mode) an adaptive compression-ratio monitor that
//! emits a CLEAR code and resets the dictionary when the ratio degrades.
//! See [`bitio`] for the bit-packing rules and [`dict`] for the dictionary
//! structures.

pub mod bitio;
pub mod dict;

use std::io::{Read, Write};
use bitio::{BitReader, BitWriter};
use dict::{DecoderDict, EncoderDict};
use crate::{DYNERR, Error};

const MAGIC_1: u8 = 0x1F;
const MAGIC_2: u8 = 0x9D;
const BIT_MASK: u8 = 0x1F;
const BLOCK_MODE_FLAG: u8 = 0x80;
const INIT_BITS: u32 = 9;
const CLEAR: u16 = 256;
const FIRST: u16 = 257;
const CHECK_GAP: u64 = 10_000;

/// Options controlling compression. `expand` reads its own copy back out of
/// the stream header, so only `compress` takes one.
#[derive(Clone, Copy)]
pub struct Options {
    /// Code width ceiling, valid range `9..=16`.
    pub maxbits: u8,
    /// Enables the adaptive-reset CLEAR code. Without it, the dictionary
    /// simply freezes once full.
    pub block_mode: bool,
}

pub const STD_OPTIONS: Options = Options { maxbits: 16, block_mode: true };

fn raw_maxcode(n_bits: u32) -> u32 {
    1u32 << n_bits
}

/// Compresses `r` into `w`, returning `(bytes_in, bytes_out)`.
pub fn compress<R: Read, W: Write>(r: &mut R, w: &mut W, opt: &Options) -> Result<(u64, u64), DYNERR> {
    if !(9..=16).contains(&opt.maxbits) {
        return Err(Box::new(Error::UnsupportedWidth));
    }
    let mut input = Vec::new();
    r.read_to_end(&mut input)?;

    let mut writer = BitWriter::new();
    let header_byte = opt.maxbits | if opt.block_mode { BLOCK_MODE_FLAG } else { 0 };
    writer.write_header(&[MAGIC_1, MAGIC_2, header_byte]);

    if input.is_empty() {
        log::debug!("compressing empty input, writing bare header");
        let out = writer.finish();
        let out_len = out.len() as u64;
        w.write_all(&out)?;
        return Ok((0, out_len));
    }

    let maxbits = opt.maxbits as u32;
    let mut n_bits = INIT_BITS;
    let mut free_ent: u32 = FIRST as u32;
    let mut extcode: u32 = raw_maxcode(n_bits) + 1;
    let mut stcode = true;
    let mut dict = EncoderDict::new();

    let mut ratio: i64 = 0;
    let mut checkpoint: u64 = CHECK_GAP;
    let mut bytes_in: u64 = 1;
    let mut prefix: u16 = input[0] as u16;

    for &byte in &input[1..] {
        bytes_in += 1;
        match dict.find(prefix, byte) {
            Ok(code) => prefix = code,
            Err(slot) => {
                writer.put_code(prefix as u32, n_bits);
                if stcode {
                    dict.insert(slot, prefix, byte, free_ent as u16);
                    free_ent += 1;
                }
                prefix = byte as u16;

                if free_ent >= extcode {
                    if n_bits < maxbits {
                        writer.pad_to_group_boundary(n_bits);
                        n_bits += 1;
                        extcode = if n_bits < maxbits { raw_maxcode(n_bits) + 1 } else { raw_maxcode(n_bits) };
                        log::trace!("grew code width to {n_bits} bits");
                    } else {
                        extcode = u32::MAX;
                        stcode = false;
                        log::debug!("dictionary full at {maxbits} bits, freezing");
                    }
                }

                if opt.block_mode && !stcode && bytes_in >= checkpoint {
                    checkpoint = bytes_in + CHECK_GAP;
                    let bytes_out = writer.bytes_written().max(1);
                    let rat = ((bytes_in as i64) << 8) / (bytes_out as i64);
                    if rat >= ratio {
                        ratio = rat;
                    } else {
                        log::debug!("compression ratio degraded, emitting CLEAR");
                        ratio = 0;
                        dict.clear();
                        writer.put_code(CLEAR as u32, n_bits);
                        writer.pad_to_group_boundary(n_bits);
                        n_bits = INIT_BITS;
                        extcode = raw_maxcode(n_bits) + 1;
                        free_ent = FIRST as u32;
                        stcode = true;
                    }
                }
            }
        }
    }
    writer.put_code(prefix as u32, n_bits);

    let out = writer.finish();
    let out_len = out.len() as u64;
    w.write_all(&out)?;
    Ok((bytes_in, out_len))
}

/// Expands a `.Z`-format stream, returning `(bytes_in, bytes_out)`.
pub fn expand<R: Read, W: Write>(r: &mut R, w: &mut W) -> Result<(u64, u64), DYNERR> {
    let mut input = Vec::new();
    r.read_to_end(&mut input)?;

    if input.len() < 3 || input[0] != MAGIC_1 || input[1] != MAGIC_2 {
        return Err(Box::new(Error::BadMagic));
    }
    let maxbits = (input[2] & BIT_MASK) as u32;
    let block_mode = (input[2] & BLOCK_MODE_FLAG) != 0;
    if !(9..=16).contains(&maxbits) {
        return Err(Box::new(Error::UnsupportedWidth));
    }
    let maxmaxcode = raw_maxcode(maxbits);

    if input.len() == 3 {
        return Ok((3, 0));
    }

    let mut reader = BitReader::new(&input, 3);
    let mut n_bits = INIT_BITS;
    let mut maxcode = raw_maxcode(n_bits) - 1;
    let mut free_ent: u32 = FIRST as u32;
    let mut dict = DecoderDict::new(maxmaxcode as usize);
    let mut oldcode: Option<u16> = None;
    let mut finchar: u8 = 0;
    let mut output = Vec::new();

    loop {
        if free_ent > maxcode {
            if n_bits < maxbits {
                reader.pad_to_group_boundary(n_bits);
                n_bits += 1;
                maxcode = if n_bits == maxbits { maxmaxcode } else { raw_maxcode(n_bits) - 1 };
                log::trace!("grew code width to {n_bits} bits");
                continue;
            }
        }
        if reader.bits_remaining() < n_bits as u64 {
            break;
        }
        let code = reader.get_code(n_bits) as u16;

        let Some(old) = oldcode else {
            if code >= 256 {
                return Err(Box::new(Error::CorruptInput));
            }
            output.push(code as u8);
            finchar = code as u8;
            oldcode = Some(code);
            continue;
        };

        if block_mode && code == CLEAR {
            log::debug!("CLEAR received, resetting dictionary");
            free_ent = FIRST as u32;
            oldcode = None;
            reader.pad_to_group_boundary(n_bits);
            n_bits = INIT_BITS;
            maxcode = raw_maxcode(n_bits) - 1;
            continue;
        }

        let mut stack = Vec::new();
        let mut work_code = code;
        if (work_code as u32) >= free_ent {
            if (work_code as u32) > free_ent {
                return Err(Box::new(Error::CorruptInput));
            }
            stack.push(finchar);
            work_code = old;
        }
        while work_code >= 256 {
            stack.push(dict.suffix_of(work_code));
            work_code = dict.prefix_of(work_code);
        }
        finchar = dict.suffix_of(work_code);
        stack.push(finchar);
        while let Some(b) = stack.pop() {
            output.push(b);
        }

        if free_ent < maxmaxcode {
            dict.set(free_ent as u16, old, finchar);
            free_ent += 1;
        }
        oldcode = Some(code);
    }

    let out_len = output.len() as u64;
    w.write_all(&output)?;
    Ok((input.len() as u64, out_len))
}

/// Compresses a byte slice in memory.
pub fn compress_slice(buf: &[u8], opt: &Options) -> Result<Vec<u8>, DYNERR> {
    let mut r = std::io::Cursor::new(buf);
    let mut out = Vec::new();
    compress(&mut r, &mut out, opt)?;
    Ok(out)
}

/// Expands a byte slice in memory.
pub fn expand_slice(buf: &[u8]) -> Result<Vec<u8>, DYNERR> {
    let mut r = std::io::Cursor::new(buf);
    let mut out = Vec::new();
    expand(&mut r, &mut out)?;
    Ok(out)
}
