//! Quantizer and entropy coder.
//!
//! Turns a [`SpectralBlock`] into a compact [`Bitstream`] and back. Bit
//! layout, MSB-first:
//!
//! ```text
//! step          6 bits   global step index, 0..=FLOOR_STEP
//! coded_bands   8 bits   bands transmitted per channel
//! scale         6 bits   per coded band, channel-major
//! per coded band with non-zero depth, channel-major:
//!   k           4 bits   Rice parameter
//!   levels      Rice codes, one per coefficient
//! ```
//!
//! Bands beyond `coded_bands`, and bands whose depth is zero, decode as
//! silence.

mod bands;
mod rice;

pub use bands::{BandLayout, FLOOR_STEP};

use crate::bitstream::{BitCounter, BitReader, BitSink, BitWriter};
use crate::error::{CodecError, Result};
use crate::transform::SpectralBlock;

use bands::{depth, max_level, scale_amplitude, scale_index};

const STEP_BITS: u32 = 6;
const BANDS_BITS: u32 = 8;
const SCALE_BITS: u32 = 6;
const K_BITS: u32 = 4;

/// Quantizer output: packed bytes plus the exact number of meaningful bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitstream {
    data: Vec<u8>,
    bit_len: usize,
}

impl Bitstream {
    pub fn new(data: Vec<u8>, bit_len: usize) -> Self {
        Self { data, bit_len }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Length in bytes, including the zero padding of the last byte.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }
}

/// Band quantizer for a fixed frame shape.
///
/// Holds only the band layout and limits, so one instance can serve any
/// number of threads.
#[derive(Debug, Clone)]
pub struct Quantizer {
    frame_size: usize,
    channels: usize,
    layout: BandLayout,
    max_payload: usize,
}

impl Quantizer {
    /// Creates a quantizer whose payloads never exceed `max_payload` bytes.
    pub fn new(frame_size: usize, channels: usize, max_payload: usize) -> Self {
        Self {
            frame_size,
            channels,
            layout: BandLayout::new(frame_size),
            max_payload,
        }
    }

    pub fn layout(&self) -> &BandLayout {
        &self.layout
    }

    /// Payload limit in bits.
    pub fn max_payload_bits(&self) -> usize {
        self.max_payload * 8
    }

    /// Quantizes `block` as finely as `target_bits` allows.
    ///
    /// Picks the smallest step whose coded size fits the target, or the
    /// fidelity floor when none does. If the result still exceeds the
    /// payload limit, the highest band of every channel is dropped until it
    /// fits.
    pub fn quantize(&self, block: &SpectralBlock, target_bits: usize) -> Result<Bitstream> {
        self.check_block(block)?;
        let scales = self.scales(block);
        let step = self.search_step(block, &scales, target_bits);

        let nbands = self.layout.len();
        let limit = self.max_payload_bits();
        let mut coded = nbands;
        let mut needed = self.measure(block, &scales, step, coded);
        while needed > limit {
            if coded == 0 {
                return Err(CodecError::BitBudgetExceeded { needed, limit });
            }
            coded -= 1;
            needed = self.measure(block, &scales, step, coded);
        }
        if coded < nbands {
            tracing::warn!(
                dropped = nbands - coded,
                needed,
                limit,
                "dropping high bands to fit packet size"
            );
        }
        tracing::trace!(step, coded_bands = coded, bits = needed, target_bits, "rate control");

        Ok(self.write(block, &scales, step, coded, needed))
    }

    /// Quantizes `block` at a fixed step with the lowest `coded_bands` bands
    /// of each channel. Arguments beyond their ranges are clamped.
    pub fn quantize_with(
        &self,
        block: &SpectralBlock,
        step: u32,
        coded_bands: usize,
    ) -> Result<Bitstream> {
        self.check_block(block)?;
        let scales = self.scales(block);
        let step = step.min(FLOOR_STEP);
        let coded = coded_bands.min(self.layout.len());

        let needed = self.measure(block, &scales, step, coded);
        let limit = self.max_payload_bits();
        if needed > limit {
            return Err(CodecError::BitBudgetExceeded { needed, limit });
        }
        Ok(self.write(block, &scales, step, coded, needed))
    }

    /// Reconstructs spectral coefficients from a payload.
    pub fn dequantize(&self, payload: &[u8]) -> Result<SpectralBlock> {
        let nbands = self.layout.len();
        let mut reader = BitReader::new(payload);

        let step = reader.read_bits(STEP_BITS)?;
        if step > FLOOR_STEP {
            return Err(CodecError::decode(format!("step index {} out of range", step)));
        }
        let coded = reader.read_bits(BANDS_BITS)? as usize;
        if coded > nbands {
            return Err(CodecError::decode(format!(
                "{} coded bands, layout has {}",
                coded, nbands
            )));
        }

        let mut scales = vec![0u32; self.channels * coded];
        for s in scales.iter_mut() {
            *s = reader.read_bits(SCALE_BITS)?;
        }

        let mut block = SpectralBlock::zeros(self.channels, self.frame_size);
        for ch in 0..self.channels {
            let out = block.channel_mut(ch);
            for band in 0..coded {
                let s = scales[ch * coded + band];
                let b = depth(s, self.layout.effective_step(band, step));
                if b == 0 {
                    continue;
                }
                let k = reader.read_bits(K_BITS)?;
                let q_max = max_level(b);
                let unit = scale_amplitude(s) / q_max as f64;
                for c in out[self.layout.band(band)].iter_mut() {
                    let q = rice::unzigzag(rice::get(&mut reader, k)?);
                    if q.abs() > q_max {
                        return Err(CodecError::decode(format!(
                            "level {} exceeds ±{} in band {}",
                            q, q_max, band
                        )));
                    }
                    *c = q as f64 * unit;
                }
            }
        }

        if reader.remaining() >= 8 {
            return Err(CodecError::decode(format!(
                "{} unused bits after bitstream",
                reader.remaining()
            )));
        }
        Ok(block)
    }

    fn check_block(&self, block: &SpectralBlock) -> Result<()> {
        let expected = self.frame_size * self.channels;
        if block.channels() != self.channels || block.coeffs().len() != expected {
            return Err(CodecError::InvalidLength {
                expected,
                got: block.coeffs().len(),
            });
        }
        Ok(())
    }

    /// Scale index of every band, channel-major.
    fn scales(&self, block: &SpectralBlock) -> Vec<u32> {
        let mut scales = Vec::with_capacity(self.channels * self.layout.len());
        for ch in 0..self.channels {
            let coeffs = block.channel(ch);
            for band in self.layout.bands() {
                let peak = coeffs[band].iter().fold(0.0f64, |m, c| m.max(c.abs()));
                scales.push(scale_index(peak));
            }
        }
        scales
    }

    /// Binary search for the finest step that fits `target_bits`.
    fn search_step(&self, block: &SpectralBlock, scales: &[u32], target_bits: usize) -> u32 {
        let nbands = self.layout.len();
        let (mut lo, mut hi) = (0, FLOOR_STEP);
        while lo < hi {
            let mid = (lo + hi) / 2;
            if self.measure(block, scales, mid, nbands) <= target_bits {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        lo
    }

    fn measure(&self, block: &SpectralBlock, scales: &[u32], step: u32, coded: usize) -> usize {
        let mut counter = BitCounter::new();
        self.encode_into(&mut counter, block, scales, step, coded);
        counter.bit_len()
    }

    fn write(
        &self,
        block: &SpectralBlock,
        scales: &[u32],
        step: u32,
        coded: usize,
        bits: usize,
    ) -> Bitstream {
        let mut writer = BitWriter::with_capacity(bits);
        self.encode_into(&mut writer, block, scales, step, coded);
        let bit_len = writer.bit_len();
        Bitstream::new(writer.finish(), bit_len)
    }

    fn encode_into<S: BitSink>(
        &self,
        sink: &mut S,
        block: &SpectralBlock,
        scales: &[u32],
        step: u32,
        coded: usize,
    ) {
        let nbands = self.layout.len();
        sink.put_bits(step, STEP_BITS);
        sink.put_bits(coded as u32, BANDS_BITS);
        for ch in 0..self.channels {
            for &s in &scales[ch * nbands..ch * nbands + coded] {
                sink.put_bits(s, SCALE_BITS);
            }
        }

        let mut levels = Vec::new();
        for ch in 0..self.channels {
            let coeffs = block.channel(ch);
            for band in 0..coded {
                let s = scales[ch * nbands + band];
                let b = depth(s, self.layout.effective_step(band, step));
                if b == 0 {
                    continue;
                }
                let q_max = max_level(b);
                let gain = q_max as f64 / scale_amplitude(s);
                levels.clear();
                levels.extend(
                    coeffs[self.layout.band(band)]
                        .iter()
                        .map(|&c| rice::zigzag(quantize_level(c, gain, q_max))),
                );
                let k = rice::choose_k(&levels);
                sink.put_bits(k, K_BITS);
                for &v in &levels {
                    rice::put(sink, v, k);
                }
            }
        }
    }
}

/// Rounds `c * gain` to the nearest level, saturating at `±q_max`.
fn quantize_level(c: f64, gain: f64, q_max: i32) -> i32 {
    ((c * gain).round() as i32).clamp(-q_max, q_max)
}
