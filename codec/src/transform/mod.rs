//! Block transform between PCM frames and spectral coefficients.
//!
//! Each channel of a frame is transformed independently with an orthonormal
//! DCT-II (inverse: DCT-III) spanning the whole frame. There is no overlap
//! and no state carried between frames, so any frame can be decoded on its
//! own. Orthonormality keeps quantization error the same size in both
//! domains.
//!
//! The DCT runs through an N-point FFT using Makhoul's even/odd reordering:
//!
//! ```text
//! v[j]       = x[2j]        j < ceil(N/2)
//! v[N-1-j]   = x[2j+1]      j < floor(N/2)
//! X[k]       = s_k * Re(V[k] * e^(-i pi k / 2N))
//! ```

mod fft;

pub use fft::{Complex, Fft};

use std::f64::consts::PI;

use crate::error::{CodecError, Result};
use crate::pcm::PcmFrame;

/// Spectral coefficients of one frame, channel-major.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralBlock {
    channels: usize,
    coeffs: Vec<f64>,
}

impl SpectralBlock {
    /// Creates a block from channel-major coefficients.
    pub fn new(channels: usize, coeffs: Vec<f64>) -> Self {
        Self { channels, coeffs }
    }

    /// Creates an all-zero block.
    pub fn zeros(channels: usize, frame_size: usize) -> Self {
        Self::new(channels, vec![0.0; channels * frame_size])
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Coefficients per channel.
    pub fn frame_size(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.coeffs.len() / self.channels
    }

    /// Coefficients of one channel, lowest frequency first.
    pub fn channel(&self, ch: usize) -> &[f64] {
        let n = self.frame_size();
        &self.coeffs[ch * n..(ch + 1) * n]
    }

    pub fn channel_mut(&mut self, ch: usize) -> &mut [f64] {
        let n = self.frame_size();
        &mut self.coeffs[ch * n..(ch + 1) * n]
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// Sum of squared coefficients.
    pub fn energy(&self) -> f64 {
        self.coeffs.iter().map(|c| c * c).sum()
    }
}

/// Forward and inverse transform for a fixed frame shape.
#[derive(Debug, Clone)]
pub struct Transform {
    frame_size: usize,
    channels: usize,
    fft: Fft,
    /// `e^(-i pi k / 2N)` for `k < N`.
    rotation: Vec<Complex>,
    /// Orthonormal scale for bin 0 and for every other bin.
    scale_dc: f64,
    scale_ac: f64,
}

impl Transform {
    pub fn new(frame_size: usize, channels: usize) -> Self {
        let n = frame_size as f64;
        let rotation = (0..frame_size)
            .map(|k| Complex::from_angle(-PI * k as f64 / (2.0 * n)))
            .collect();
        Self {
            frame_size,
            channels,
            fft: Fft::new(frame_size),
            rotation,
            scale_dc: (1.0 / n).sqrt(),
            scale_ac: (2.0 / n).sqrt(),
        }
    }

    /// Transforms a PCM frame into spectral coefficients.
    pub fn forward(&self, frame: &PcmFrame) -> Result<SpectralBlock> {
        if frame.channels() != self.channels {
            return Err(CodecError::InvalidConfig(format!(
                "frame has {} channel(s), transform expects {}",
                frame.channels(),
                self.channels
            )));
        }
        let expected = self.frame_size * self.channels;
        if frame.samples().len() != expected {
            return Err(CodecError::InvalidLength {
                expected: expected * 2,
                got: frame.samples().len() * 2,
            });
        }

        let mut block = SpectralBlock::zeros(self.channels, self.frame_size);
        let mut input = vec![0.0f64; self.frame_size];
        for ch in 0..self.channels {
            for (dst, &s) in input.iter_mut().zip(frame.channel(ch).iter()) {
                *dst = s as f64;
            }
            self.dct(&input, block.channel_mut(ch));
        }
        Ok(block)
    }

    /// Reconstructs a PCM frame, rounding and saturating to 16 bits.
    pub fn inverse(&self, block: &SpectralBlock) -> Result<PcmFrame> {
        if block.channels() != self.channels || block.frame_size() != self.frame_size {
            return Err(CodecError::decode(format!(
                "spectral block shape {}x{} does not match {}x{}",
                block.channels(),
                block.frame_size(),
                self.channels,
                self.frame_size
            )));
        }
        if block.coeffs().iter().any(|c| !c.is_finite()) {
            return Err(CodecError::decode("non-finite spectral coefficient"));
        }

        let mut samples = vec![0i16; self.frame_size * self.channels];
        let mut output = vec![0.0f64; self.frame_size];
        for ch in 0..self.channels {
            self.idct(block.channel(ch), &mut output);
            for (i, &v) in output.iter().enumerate() {
                samples[i * self.channels + ch] = to_pcm(v);
            }
        }
        Ok(PcmFrame::from_samples(self.channels, samples))
    }

    /// Orthonormal DCT-II of `input` into `output`.
    fn dct(&self, input: &[f64], output: &mut [f64]) {
        let n = self.frame_size;
        let mut v = vec![Complex::ZERO; n];
        for j in 0..n.div_ceil(2) {
            v[j] = Complex::new(input[2 * j], 0.0);
        }
        for j in 0..n / 2 {
            v[n - 1 - j] = Complex::new(input[2 * j + 1], 0.0);
        }

        self.fft.forward(&mut v);

        for k in 0..n {
            let scale = if k == 0 { self.scale_dc } else { self.scale_ac };
            output[k] = (v[k] * self.rotation[k]).re * scale;
        }
    }

    /// Orthonormal DCT-III (inverse of [`dct`](Self::dct)).
    fn idct(&self, input: &[f64], output: &mut [f64]) {
        let n = self.frame_size;
        let raw = |k: usize| -> f64 {
            if k == 0 {
                input[0] / self.scale_dc
            } else if k < n {
                input[k] / self.scale_ac
            } else {
                0.0
            }
        };

        // V[k] = (X[k] - i X[N-k]) * e^(i pi k / 2N)
        let mut v: Vec<Complex> = (0..n)
            .map(|k| {
                let mirror = if k == 0 { 0.0 } else { raw(n - k) };
                Complex::new(raw(k), -mirror) * self.rotation[k].conj()
            })
            .collect();

        self.fft.inverse(&mut v);

        for j in 0..n.div_ceil(2) {
            output[2 * j] = v[j].re;
        }
        for j in 0..n / 2 {
            output[2 * j + 1] = v[n - 1 - j].re;
        }
    }
}

fn to_pcm(v: f64) -> i16 {
    v.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_dct(x: &[f64]) -> Vec<f64> {
        let n = x.len();
        (0..n)
            .map(|k| {
                let sum: f64 = x
                    .iter()
                    .enumerate()
                    .map(|(j, &v)| v * (PI * (2 * j + 1) as f64 * k as f64 / (2 * n) as f64).cos())
                    .sum();
                let scale = if k == 0 { (1.0 / n as f64).sqrt() } else { (2.0 / n as f64).sqrt() };
                sum * scale
            })
            .collect()
    }

    fn sine_frame(frame_size: usize, channels: usize, freq: f64, amp: f64) -> PcmFrame {
        let mut samples = Vec::with_capacity(frame_size * channels);
        for i in 0..frame_size {
            for ch in 0..channels {
                let t = i as f64 / 48000.0;
                let phase = ch as f64 * 0.5;
                samples.push((amp * (2.0 * PI * freq * t + phase).sin()) as i16);
            }
        }
        PcmFrame::from_samples(channels, samples)
    }

    #[test]
    fn test_dct_matches_naive() {
        for n in [1usize, 2, 7, 12, 15, 16, 30] {
            let t = Transform::new(n, 1);
            let x: Vec<f64> = (0..n).map(|i| ((i * 7 + 3) % 11) as f64 - 5.0).collect();
            let mut out = vec![0.0; n];
            t.dct(&x, &mut out);
            let expected = naive_dct(&x);
            for k in 0..n {
                assert!(
                    (out[k] - expected[k]).abs() < 1e-9,
                    "n={} k={}: {} != {}",
                    n,
                    k,
                    out[k],
                    expected[k]
                );
            }
        }
    }

    #[test]
    fn test_idct_inverts_dct() {
        for n in [5usize, 12, 960] {
            let t = Transform::new(n, 1);
            let x: Vec<f64> = (0..n).map(|i| (i as f64 * 0.731).sin() * 1000.0).collect();
            let mut spec = vec![0.0; n];
            let mut back = vec![0.0; n];
            t.dct(&x, &mut spec);
            t.idct(&spec, &mut back);
            for (a, b) in x.iter().zip(back.iter()) {
                assert!((a - b).abs() < 1e-6, "n={}: {} != {}", n, a, b);
            }
        }
    }

    #[test]
    fn test_forward_zeros() {
        let t = Transform::new(960, 1);
        let frame = PcmFrame::from_samples(1, vec![0; 960]);
        let block = t.forward(&frame).unwrap();
        assert_eq!(block.coeffs().len(), 960);
        assert!(block.coeffs().iter().all(|&c| c == 0.0));
    }

    #[test]
    fn test_dc_concentrates_in_bin_zero() {
        let t = Transform::new(960, 1);
        let frame = PcmFrame::from_samples(1, vec![1000; 960]);
        let block = t.forward(&frame).unwrap();
        assert!((block.channel(0)[0] - 1000.0 * 960f64.sqrt()).abs() < 1e-6);
        assert!(block.channel(0)[1..].iter().all(|c| c.abs() < 1e-6));
    }

    #[test]
    fn test_energy_preserved() {
        let t = Transform::new(960, 2);
        let frame = sine_frame(960, 2, 440.0, 12000.0);
        let time_energy: f64 = frame.samples().iter().map(|&s| (s as f64) * (s as f64)).sum();
        let block = t.forward(&frame).unwrap();
        let rel = (block.energy() - time_energy).abs() / time_energy;
        assert!(rel < 1e-9, "relative energy error {}", rel);
    }

    #[test]
    fn test_roundtrip_exact_after_rounding() {
        for channels in [1usize, 2] {
            let t = Transform::new(960, channels);
            let frame = sine_frame(960, channels, 1000.0, 30000.0);
            let back = t.inverse(&t.forward(&frame).unwrap()).unwrap();
            assert_eq!(back, frame);
        }
    }

    #[test]
    fn test_inverse_saturates() {
        let t = Transform::new(4, 1);
        // DC bin far beyond 16-bit range
        let block = SpectralBlock::new(1, vec![1.0e7, 0.0, 0.0, 0.0]);
        let frame = t.inverse(&block).unwrap();
        assert!(frame.samples().iter().all(|&s| s == i16::MAX));
    }

    #[test]
    fn test_forward_rejects_bad_frame() {
        let t = Transform::new(4, 1);
        let short = PcmFrame::from_samples(1, vec![1, 2, 3]);
        assert!(matches!(
            t.forward(&short),
            Err(CodecError::InvalidLength { expected: 8, got: 6 })
        ));
        let long = PcmFrame::from_samples(1, vec![0; 5]);
        assert!(matches!(t.forward(&long), Err(CodecError::InvalidLength { .. })));
        let stereo = PcmFrame::from_samples(2, vec![0; 4]);
        assert!(matches!(t.forward(&stereo), Err(CodecError::InvalidConfig(_))));
    }

    #[test]
    fn test_prime_length_roundtrip() {
        // 4999 is prime and takes the chirp-z path
        let t = Transform::new(4999, 1);
        let samples: Vec<i16> = (0..4999)
            .map(|i| ((i as f64 * 0.05).sin() * 20000.0) as i16)
            .collect();
        let frame = PcmFrame::from_samples(1, samples);
        let back = t.inverse(&t.forward(&frame).unwrap()).unwrap();
        assert_eq!(back, frame);
    }

    #[test]
    fn test_inverse_rejects_bad_block() {
        let t = Transform::new(4, 1);
        assert!(matches!(
            t.inverse(&SpectralBlock::zeros(2, 4)),
            Err(CodecError::Decode(_))
        ));
        let block = SpectralBlock::new(1, vec![f64::NAN, 0.0, 0.0, 0.0]);
        assert!(matches!(t.inverse(&block), Err(CodecError::Decode(_))));
    }
}
