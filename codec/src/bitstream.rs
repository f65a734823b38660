//! MSB-first bit packing.
//!
//! [`BitWriter`] and [`BitCounter`] both implement [`BitSink`], so the
//! quantizer can size a frame with exactly the code path that later writes
//! it.

use crate::error::{CodecError, Result};

/// Destination for a sequence of bit fields.
pub trait BitSink {
    /// Appends the low `width` bits of `value`, most significant first.
    /// `width` is at most 32.
    fn put_bits(&mut self, value: u32, width: u32);

    /// Appends `count` one bits.
    fn put_ones(&mut self, count: u32) {
        let mut remaining = count;
        while remaining > 0 {
            let n = remaining.min(32);
            self.put_bits(u32::MAX, n);
            remaining -= n;
        }
    }

    /// Total bits appended so far.
    fn bit_len(&self) -> usize;
}

/// Counts bits without storing them.
#[derive(Debug, Default, Clone, Copy)]
pub struct BitCounter {
    bits: usize,
}

impl BitCounter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BitSink for BitCounter {
    fn put_bits(&mut self, _value: u32, width: u32) {
        self.bits += width as usize;
    }

    fn bit_len(&self) -> usize {
        self.bits
    }
}

/// Packs bits into bytes, MSB-first.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    data: Vec<u8>,
    accumulator: u8,
    /// Bits already placed in `accumulator` (0..8).
    filled: u32,
    bits: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with room for `bits` bits.
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            data: Vec::with_capacity(bits.div_ceil(8)),
            ..Self::default()
        }
    }

    /// Flushes the partial byte (zero padded) and returns the bytes.
    pub fn finish(mut self) -> Vec<u8> {
        if self.filled > 0 {
            self.data.push(self.accumulator);
        }
        self.data
    }
}

impl BitSink for BitWriter {
    fn put_bits(&mut self, value: u32, width: u32) {
        let mut remaining = width;
        while remaining > 0 {
            let free = 8 - self.filled;
            let take = remaining.min(free);
            let shift = remaining - take;
            let chunk = ((value >> shift) & ((1u32 << take) - 1)) as u8;
            self.accumulator |= chunk << (free - take);
            self.filled += take;
            remaining -= take;
            if self.filled == 8 {
                self.data.push(self.accumulator);
                self.accumulator = 0;
                self.filled = 0;
            }
        }
        self.bits += width as usize;
    }

    fn bit_len(&self) -> usize {
        self.bits
    }
}

/// Reads bits MSB-first from a byte slice.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bits left before the end of the data.
    pub fn remaining(&self) -> usize {
        self.data.len() * 8 - self.pos
    }

    /// Reads a single bit.
    pub fn read_bit(&mut self) -> Result<u32> {
        if self.pos >= self.data.len() * 8 {
            return Err(CodecError::decode("bitstream exhausted"));
        }
        let byte = self.data[self.pos / 8];
        let bit = (byte >> (7 - (self.pos % 8))) & 1;
        self.pos += 1;
        Ok(bit as u32)
    }

    /// Reads `width` bits (at most 32) as an unsigned value.
    pub fn read_bits(&mut self, width: u32) -> Result<u32> {
        if self.remaining() < width as usize {
            return Err(CodecError::decode("bitstream exhausted"));
        }
        let mut value: u32 = 0;
        for _ in 0..width {
            value = (value << 1) | self.read_bit()?;
        }
        Ok(value)
    }

    /// Counts leading one bits, stopping after a zero or at `limit` ones.
    /// The terminating zero is consumed.
    pub fn read_unary(&mut self, limit: u32) -> Result<u32> {
        let mut count = 0;
        while count < limit {
            if self.read_bit()? == 0 {
                return Ok(count);
            }
            count += 1;
        }
        Ok(count)
    }
}
