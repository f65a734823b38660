//! Band layout and per-band bit allocation.
//!
//! Each channel's coefficients are split into contiguous bands whose width
//! grows by a quarter per band, so low frequencies get fine resolution. A
//! band is described on the wire by a scale index `s`, its peak amplitude
//! rounded up to a half-octave grid, and gets a bit depth derived from `s`
//! and the effective step.

use std::f64::consts::SQRT_2;
use std::ops::Range;

/// Largest scale index (6-bit field).
pub const MAX_SCALE: u32 = 63;

/// Largest bit depth per coefficient.
pub const MAX_DEPTH: u32 = 15;

/// Step index of the fidelity floor: the coarsest step the encoder uses.
pub const FLOOR_STEP: u32 = 38;

/// Extra step applied to the highest band.
pub const TILT_MAX: u32 = 8;

/// Smallest band width.
const MIN_WIDTH: usize = 4;

/// Band boundaries of one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandLayout {
    /// `edges[i]..edges[i + 1]` is band `i`.
    edges: Vec<usize>,
}

impl BandLayout {
    /// Builds the layout for `frame_size` coefficients.
    pub fn new(frame_size: usize) -> Self {
        let mut edges = vec![0];
        let mut start = 0;
        let mut width = MIN_WIDTH.max(frame_size / 240);
        while start < frame_size {
            let next = width + (width / 4).max(1);
            let mut end = (start + width).min(frame_size);
            // A short tail is folded into the last band.
            if frame_size - end < next / 2 {
                end = frame_size;
            }
            edges.push(end);
            start = end;
            width = next;
        }
        Self { edges }
    }

    pub fn len(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coefficient range of band `i`.
    pub fn band(&self, i: usize) -> Range<usize> {
        self.edges[i]..self.edges[i + 1]
    }

    pub fn bands(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.edges.windows(2).map(|w| w[0]..w[1])
    }

    /// Step offset of band `i`, growing linearly from 0 to [`TILT_MAX`].
    pub fn tilt(&self, i: usize) -> u32 {
        let n = self.len();
        if n <= 1 {
            return 0;
        }
        (TILT_MAX as usize * i / (n - 1)) as u32
    }

    /// Effective step index of band `i` at global step `step`.
    pub fn effective_step(&self, i: usize, step: u32) -> u32 {
        (step + self.tilt(i)).min(FLOOR_STEP)
    }
}

/// Amplitude represented by scale index `s`: `2^(s/2)`.
pub fn scale_amplitude(s: u32) -> f64 {
    let base = 2f64.powi((s / 2) as i32);
    if s % 2 == 1 { base * SQRT_2 } else { base }
}

/// Smallest scale index whose amplitude covers `peak`, saturating at
/// [`MAX_SCALE`].
pub fn scale_index(peak: f64) -> u32 {
    if peak.is_nan() || peak <= 1.0 {
        return 0;
    }
    let mut s = ((2.0 * peak.log2()).ceil() as u32).min(MAX_SCALE);
    while s > 0 && scale_amplitude(s - 1) >= peak {
        s -= 1;
    }
    while s < MAX_SCALE && scale_amplitude(s) < peak {
        s += 1;
    }
    s
}

/// Bits per coefficient for a band with scale `s` at effective step `d`.
///
/// Zero means the band is not transmitted and decodes as silence.
pub fn depth(s: u32, d: u32) -> u32 {
    if s == 0 {
        return 0;
    }
    let e = 2 * s as i32 - d as i32;
    if e < -4 {
        return 0;
    }
    (e.div_euclid(4) + 1).clamp(1, MAX_DEPTH as i32) as u32
}

/// Largest level magnitude at depth `b`.
pub fn max_level(b: u32) -> i32 {
    (1i32 << b) - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_covers_frame() {
        for n in [1usize, 3, 4, 10, 160, 320, 480, 960, 1920, 32768] {
            let layout = BandLayout::new(n);
            assert!(!layout.is_empty());
            assert!(layout.len() <= 255, "n={} bands={}", n, layout.len());
            let mut next = 0;
            for band in layout.bands() {
                assert_eq!(band.start, next);
                assert!(band.end > band.start);
                next = band.end;
            }
            assert_eq!(next, n);
        }
    }

    #[test]
    fn test_layout_960() {
        let layout = BandLayout::new(960);
        assert_eq!(layout.band(0), 0..4);
        assert_eq!(layout.band(1), 4..9);
        assert_eq!(layout.band(2), 9..15);
        // Widths never shrink
        let widths: Vec<usize> = layout.bands().map(|b| b.len()).collect();
        assert!(widths.windows(2).all(|w| w[1] >= w[0]), "{:?}", widths);
    }

    #[test]
    fn test_tilt() {
        let layout = BandLayout::new(960);
        let last = layout.len() - 1;
        assert_eq!(layout.tilt(0), 0);
        assert_eq!(layout.tilt(last), TILT_MAX);
        assert_eq!(layout.effective_step(last, FLOOR_STEP - 2), FLOOR_STEP);
        assert_eq!(BandLayout::new(2).tilt(0), 0);
    }

    #[test]
    fn test_scale_amplitude() {
        assert_eq!(scale_amplitude(0), 1.0);
        assert_eq!(scale_amplitude(2), 2.0);
        assert_eq!(scale_amplitude(20), 1024.0);
        assert!((scale_amplitude(3) - 2.0 * SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_scale_index() {
        assert_eq!(scale_index(0.0), 0);
        assert_eq!(scale_index(1.0), 0);
        assert_eq!(scale_index(f64::NAN), 0);
        assert_eq!(scale_index(1.1), 1);
        assert_eq!(scale_index(2.0), 2);
        assert_eq!(scale_index(1024.0), 20);
        assert_eq!(scale_index(1025.0), 21);
        assert_eq!(scale_index(1.0e12), MAX_SCALE);
        for peak in [3.7, 99.0, 12345.6, 1.0e6] {
            let s = scale_index(peak);
            assert!(scale_amplitude(s) >= peak);
            assert!(scale_amplitude(s - 1) < peak);
        }
    }

    #[test]
    fn test_depth() {
        assert_eq!(depth(0, 0), 0);
        // e = 2*10 - 38 = -18
        assert_eq!(depth(10, 38), 0);
        // e = -4 is the last coded value
        assert_eq!(depth(17, 38), 1);
        assert_eq!(depth(33, 38), 8);
        assert_eq!(depth(63, 0), MAX_DEPTH);
        // Louder bands never get fewer bits
        for d in 0..=FLOOR_STEP {
            for s in 1..MAX_SCALE {
                assert!(depth(s + 1, d) >= depth(s, d));
            }
        }
    }

    #[test]
    fn test_max_level() {
        assert_eq!(max_level(1), 1);
        assert_eq!(max_level(8), 255);
        assert_eq!(max_level(MAX_DEPTH), 32767);
    }
}
