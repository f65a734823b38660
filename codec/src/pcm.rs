//! PCM frame slicing and reassembly.
//!
//! Samples are signed 16-bit little-endian, interleaved by channel. Frame
//! sizes are fixed per configuration, so every buffer is allocated once at
//! its final size.

use crate::error::{CodecError, Result};

/// One frame of interleaved PCM samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmFrame {
    channels: usize,
    samples: Vec<i16>,
}

impl PcmFrame {
    /// Creates a frame from interleaved samples.
    pub fn from_samples(channels: usize, samples: Vec<i16>) -> Self {
        Self { channels, samples }
    }

    /// Creates a frame from little-endian bytes. A trailing odd byte is ignored.
    pub fn from_le_bytes(channels: usize, bytes: &[u8]) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        Self { channels, samples }
    }

    /// Returns the interleaved samples.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Returns the number of channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the number of samples per channel.
    pub fn samples_per_channel(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels
    }

    /// Returns a de-interleaved copy of one channel.
    pub fn channel(&self, ch: usize) -> Vec<i16> {
        self.samples
            .iter()
            .skip(ch)
            .step_by(self.channels.max(1))
            .copied()
            .collect()
    }

    /// Returns the frame as little-endian bytes.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.samples.len() * 2);
        self.write_le_bytes(&mut data);
        data
    }

    fn write_le_bytes(&self, out: &mut Vec<u8>) {
        for sample in &self.samples {
            out.extend_from_slice(&sample.to_le_bytes());
        }
    }
}

/// Validates and slices raw PCM bytes into frames of a fixed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBuffer {
    frame_size: usize,
    channels: usize,
}

impl FrameBuffer {
    /// Creates a frame buffer for `frame_size` samples per channel.
    pub fn new(frame_size: usize, channels: usize) -> Self {
        Self { frame_size, channels }
    }

    /// Samples per channel in one frame.
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Interleaved samples in one frame.
    pub fn frame_samples(&self) -> usize {
        self.frame_size * self.channels
    }

    /// Exact byte length of one frame.
    pub fn frame_bytes(&self) -> usize {
        self.frame_samples() * 2
    }

    /// Slices exactly one frame out of `bytes[offset..offset + length]`.
    ///
    /// `length` must equal [`frame_bytes`](Self::frame_bytes) and the range
    /// must lie inside `bytes`.
    pub fn slice_frame(&self, bytes: &[u8], offset: usize, length: usize) -> Result<PcmFrame> {
        let expected = self.frame_bytes();
        if length != expected {
            return Err(CodecError::InvalidLength {
                expected,
                got: length,
            });
        }
        let available = bytes.len().saturating_sub(offset);
        if available < length {
            return Err(CodecError::InvalidLength {
                expected,
                got: available,
            });
        }
        Ok(PcmFrame::from_le_bytes(
            self.channels,
            &bytes[offset..offset + length],
        ))
    }

    /// Slices a superframe of 1 to `max_frames` whole frames.
    pub fn split_frames(&self, bytes: &[u8], max_frames: usize) -> Result<Vec<PcmFrame>> {
        let frame_bytes = self.frame_bytes();
        if frame_bytes == 0 {
            return Err(CodecError::InvalidLength {
                expected: 0,
                got: bytes.len(),
            });
        }
        let count = bytes.len() / frame_bytes;
        if bytes.is_empty() || bytes.len() % frame_bytes != 0 || count > max_frames {
            // Report the nearest acceptable length.
            let expected = (count.clamp(1, max_frames.max(1))) * frame_bytes;
            return Err(CodecError::InvalidLength {
                expected,
                got: bytes.len(),
            });
        }
        (0..count)
            .map(|i| self.slice_frame(bytes, i * frame_bytes, frame_bytes))
            .collect()
    }

    /// Concatenates frames in order.
    pub fn join_frames(&self, frames: &[PcmFrame]) -> Vec<u8> {
        let total: usize = frames.iter().map(|f| f.samples.len() * 2).sum();
        let mut out = Vec::with_capacity(total);
        for frame in frames {
            frame.write_le_bytes(&mut out);
        }
        out
    }
}
