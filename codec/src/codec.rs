//! Frame encoder/decoder facade.

use std::time::Duration;

use crate::config::{CodecConfig, SUPERFRAME_FRAMES};
use crate::error::{CodecError, Result};
use crate::packet::{self, Packet, PacketCodec};
use crate::pcm::{FrameBuffer, PcmFrame};
use crate::quant::Quantizer;
use crate::transform::Transform;

/// Encodes PCM frames into packets and back.
///
/// A `Codec` holds only plans derived from its [`CodecConfig`]; every call
/// is independent, so one instance can be shared across threads by
/// reference.
///
/// # Example
///
/// ```
/// use framecodec::{Codec, CodecConfig};
///
/// let codec = Codec::new(CodecConfig::default()).unwrap();
/// let pcm = vec![0u8; codec.frame_bytes()];
/// let packet = codec.encode_frame(&pcm).unwrap();
/// assert!(packet.len() <= codec.max_packet_size());
///
/// let decoded = codec.decode_frame(packet.as_bytes()).unwrap();
/// assert_eq!(decoded, pcm);
/// ```
#[derive(Debug, Clone)]
pub struct Codec {
    config: CodecConfig,
    frames: FrameBuffer,
    transform: Transform,
    quantizer: Quantizer,
    packets: PacketCodec,
}

impl Codec {
    /// Validates `config` and builds the transform and band plans.
    pub fn new(config: CodecConfig) -> Result<Self> {
        config.validate()?;
        let channels = config.channels as usize;
        let packets = PacketCodec::new(config.max_packet_size, channels);
        let quantizer = Quantizer::new(config.frame_size, channels, packets.max_payload());

        tracing::debug!(
            sample_rate = config.sample_rate,
            channels,
            frame_size = config.frame_size,
            bitrate = config.bitrate,
            max_packet_size = config.max_packet_size,
            bands = quantizer.layout().len(),
            "codec created"
        );

        Ok(Self {
            config,
            frames: FrameBuffer::new(config.frame_size, channels),
            transform: Transform::new(config.frame_size, channels),
            quantizer,
            packets,
        })
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Samples per channel in one frame.
    pub fn frame_size(&self) -> usize {
        self.config.frame_size
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    pub fn channels(&self) -> u32 {
        self.config.channels
    }

    pub fn bitrate(&self) -> u32 {
        self.config.bitrate
    }

    /// Samples per channel in the largest superframe.
    pub fn max_frame_size(&self) -> usize {
        self.config.max_frame_size()
    }

    pub fn max_packet_size(&self) -> usize {
        self.config.max_packet_size
    }

    /// Exact PCM byte length accepted by [`encode_frame`](Self::encode_frame).
    pub fn frame_bytes(&self) -> usize {
        self.frames.frame_bytes()
    }

    pub fn target_bits(&self) -> usize {
        self.config.target_bits()
    }

    pub fn frame_duration(&self) -> Duration {
        self.config.frame_duration()
    }

    /// Encodes one frame of little-endian 16-bit PCM.
    ///
    /// `pcm` must hold exactly [`frame_bytes`](Self::frame_bytes) bytes.
    pub fn encode_frame(&self, pcm: &[u8]) -> Result<Packet> {
        self.encode_frame_at(pcm, 0, pcm.len())
    }

    /// Encodes the frame stored at `pcm[offset..offset + length]`.
    pub fn encode_frame_at(&self, pcm: &[u8], offset: usize, length: usize) -> Result<Packet> {
        let frame = self.frames.slice_frame(pcm, offset, length)?;
        self.encode_pcm(&frame)
    }

    /// Decodes one packet into little-endian 16-bit PCM.
    pub fn decode_frame(&self, packet: &[u8]) -> Result<Vec<u8>> {
        Ok(self.decode_pcm(packet)?.to_le_bytes())
    }

    /// Encodes a superframe of 1 to 6 whole frames, one packet per frame.
    pub fn encode_frames(&self, pcm: &[u8]) -> Result<Vec<Packet>> {
        self.frames
            .split_frames(pcm, SUPERFRAME_FRAMES)?
            .iter()
            .map(|frame| self.encode_pcm(frame))
            .collect()
    }

    /// Decodes 1 to 6 concatenated packets into one PCM buffer.
    pub fn decode_frames(&self, data: &[u8]) -> Result<Vec<u8>> {
        let packets = packet::split(data)?;
        if packets.is_empty() || packets.len() > SUPERFRAME_FRAMES {
            return Err(CodecError::malformed(format!(
                "superframe holds {} packets, expected 1..={}",
                packets.len(),
                SUPERFRAME_FRAMES
            )));
        }
        let frames = packets
            .into_iter()
            .map(|p| self.decode_pcm(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.frames.join_frames(&frames))
    }

    fn encode_pcm(&self, frame: &PcmFrame) -> Result<Packet> {
        let block = self.transform.forward(frame)?;
        let bitstream = self.quantizer.quantize(&block, self.config.target_bits())?;
        let packet = self.packets.pack(&bitstream)?;
        tracing::trace!(bytes = packet.len(), bits = bitstream.bit_len(), "encoded frame");
        Ok(packet)
    }

    fn decode_pcm(&self, packet: &[u8]) -> Result<PcmFrame> {
        let payload = self.packets.unpack(packet)?;
        let block = self.quantizer.dequantize(payload)?;
        self.transform.inverse(&block)
    }
}
