//! Rice coding of zig-zag mapped quantizer levels.
//!
//! A value `v` with parameter `k` is written as `v >> k` one bits, a zero,
//! then the low `k` bits. Quotients of [`ESCAPE`] or more are written as
//! [`ESCAPE`] one bits followed by the raw value in [`RAW_BITS`] bits.

use crate::bitstream::{BitReader, BitSink};
use crate::error::Result;

/// Unary run length that switches to a raw value.
pub const ESCAPE: u32 = 20;
/// Width of an escaped raw value.
pub const RAW_BITS: u32 = 16;
/// Largest Rice parameter (fits the 4-bit field).
pub const MAX_K: u32 = 15;

/// Maps a signed level to an unsigned code: 0, -1, 1, -2, 2 ... -> 0, 1, 2, 3, 4 ...
pub fn zigzag(q: i32) -> u32 {
    ((q << 1) ^ (q >> 31)) as u32
}

pub fn unzigzag(v: u32) -> i32 {
    ((v >> 1) as i32) ^ -((v & 1) as i32)
}

/// Bits needed to code `v` with parameter `k`.
pub fn cost(v: u32, k: u32) -> usize {
    let q = v >> k;
    if q >= ESCAPE {
        (ESCAPE + RAW_BITS) as usize
    } else {
        (q + 1 + k) as usize
    }
}

/// Total bits to code `values` with parameter `k`.
pub fn total_cost(values: &[u32], k: u32) -> usize {
    values.iter().map(|&v| cost(v, k)).sum()
}

/// Picks the parameter with the smallest exact cost. Ties go to the smaller
/// parameter.
pub fn choose_k(values: &[u32]) -> u32 {
    let mut best_k = 0;
    let mut best_cost = total_cost(values, 0);
    for k in 1..=MAX_K {
        let c = total_cost(values, k);
        if c < best_cost {
            best_cost = c;
            best_k = k;
        }
    }
    best_k
}

/// Writes one value.
pub fn put<S: BitSink>(sink: &mut S, v: u32, k: u32) {
    let q = v >> k;
    if q >= ESCAPE {
        sink.put_ones(ESCAPE);
        sink.put_bits(v, RAW_BITS);
    } else {
        sink.put_ones(q);
        sink.put_bits(0, 1);
        if k > 0 {
            sink.put_bits(v, k);
        }
    }
}

/// Reads one value.
pub fn get(reader: &mut BitReader<'_>, k: u32) -> Result<u32> {
    let q = reader.read_unary(ESCAPE)?;
    if q >= ESCAPE {
        return reader.read_bits(RAW_BITS);
    }
    let low = if k > 0 { reader.read_bits(k)? } else { 0 };
    Ok((q << k) | low)
}
