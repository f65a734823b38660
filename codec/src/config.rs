//! Codec configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};
use crate::packet::HEADER_LEN;

/// Number of frames a superframe may hold.
pub const SUPERFRAME_FRAMES: usize = 6;

/// Largest accepted frame size, in samples per channel.
pub const MAX_FRAME_SAMPLES: usize = 32768;

/// Fixed parameters of one codec instance.
///
/// Missing fields take the default 48 kHz mono configuration when
/// deserialized, so a config can be embedded in a larger document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels (1 or 2).
    pub channels: u32,
    /// Samples per channel in one frame.
    pub frame_size: usize,
    /// Target bitrate in bits per second.
    pub bitrate: u32,
    /// Largest packet the encoder may emit, header included.
    pub max_packet_size: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 1,
            frame_size: 960,
            bitrate: 64000,
            max_packet_size: 3 * 1276,
        }
    }
}

impl CodecConfig {
    /// Creates a config with the default maximum packet size.
    pub fn new(sample_rate: u32, channels: u32, frame_size: usize, bitrate: u32) -> Self {
        Self {
            sample_rate,
            channels,
            frame_size,
            bitrate,
            ..Self::default()
        }
    }

    /// Returns a copy with a different maximum packet size.
    pub fn with_max_packet_size(mut self, max_packet_size: usize) -> Self {
        self.max_packet_size = max_packet_size;
        self
    }

    /// Samples per channel in the largest superframe.
    pub fn max_frame_size(&self) -> usize {
        SUPERFRAME_FRAMES * self.frame_size
    }

    /// Exact PCM byte length of one frame.
    pub fn frame_bytes(&self) -> usize {
        self.frame_size * self.channels as usize * 2
    }

    /// Bit budget of one frame at the target bitrate.
    pub fn target_bits(&self) -> usize {
        (self.bitrate as u64 * self.frame_size as u64 / self.sample_rate.max(1) as u64) as usize
    }

    /// Playback duration of one frame.
    pub fn frame_duration(&self) -> Duration {
        Duration::from_nanos(
            self.frame_size as u64 * 1_000_000_000 / self.sample_rate.max(1) as u64,
        )
    }

    /// Checks every field, returning the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(CodecError::InvalidConfig("sample_rate must be positive".into()));
        }
        if self.channels != 1 && self.channels != 2 {
            return Err(CodecError::InvalidConfig(format!(
                "channels must be 1 or 2, got {}",
                self.channels
            )));
        }
        if self.frame_size == 0 || self.frame_size > MAX_FRAME_SAMPLES {
            return Err(CodecError::InvalidConfig(format!(
                "frame_size must be in 1..={}, got {}",
                MAX_FRAME_SAMPLES, self.frame_size
            )));
        }
        if self.bitrate == 0 {
            return Err(CodecError::InvalidConfig("bitrate must be positive".into()));
        }
        let max_payload = u16::MAX as usize;
        if self.max_packet_size <= HEADER_LEN || self.max_packet_size > HEADER_LEN + max_payload {
            return Err(CodecError::InvalidConfig(format!(
                "max_packet_size must be in {}..={}, got {}",
                HEADER_LEN + 1,
                HEADER_LEN + max_payload,
                self.max_packet_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = CodecConfig::default();
        assert_eq!(cfg.sample_rate, 48000);
        assert_eq!(cfg.channels, 1);
        assert_eq!(cfg.frame_size, 960);
        assert_eq!(cfg.bitrate, 64000);
        assert_eq!(cfg.max_frame_size(), 6 * 960);
        assert_eq!(cfg.max_packet_size, 3 * 1276);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_derived_sizes() {
        let cfg = CodecConfig::default();
        assert_eq!(cfg.frame_bytes(), 1920);
        // 64 kbps over 20ms
        assert_eq!(cfg.target_bits(), 1280);
        assert_eq!(cfg.frame_duration(), Duration::from_millis(20));

        let stereo = CodecConfig::new(16000, 2, 320, 24000);
        assert_eq!(stereo.frame_bytes(), 1280);
        assert_eq!(stereo.target_bits(), 480);
        assert_eq!(stereo.max_frame_size(), 1920);
    }

    #[test]
    fn test_validate_rejects() {
        let base = CodecConfig::default();

        let cfg = CodecConfig { sample_rate: 0, ..base };
        assert!(matches!(cfg.validate(), Err(CodecError::InvalidConfig(_))));

        let cfg = CodecConfig { channels: 3, ..base };
        assert!(matches!(cfg.validate(), Err(CodecError::InvalidConfig(_))));

        let cfg = CodecConfig { channels: 0, ..base };
        assert!(cfg.validate().is_err());

        let cfg = CodecConfig { frame_size: 0, ..base };
        assert!(cfg.validate().is_err());

        let cfg = CodecConfig { frame_size: MAX_FRAME_SAMPLES + 1, ..base };
        assert!(cfg.validate().is_err());

        let cfg = CodecConfig { bitrate: 0, ..base };
        assert!(cfg.validate().is_err());

        assert!(base.with_max_packet_size(HEADER_LEN).validate().is_err());
        assert!(base.with_max_packet_size(HEADER_LEN + 1).validate().is_ok());
        assert!(base.with_max_packet_size(HEADER_LEN + 65536).validate().is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let cfg = CodecConfig::new(16000, 2, 320, 32000).with_max_packet_size(1000);
        let json = serde_json::to_string(&cfg).unwrap();
        let back: CodecConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }

    #[test]
    fn test_serde_partial_uses_defaults() {
        let cfg: CodecConfig = serde_json::from_str(r#"{"channels": 2}"#).unwrap();
        assert_eq!(cfg.channels, 2);
        assert_eq!(cfg.sample_rate, 48000);
        assert_eq!(cfg.frame_size, 960);
        assert_eq!(cfg.max_packet_size, 3828);
    }
}
