//! Stateless lossy codec for 16-bit PCM frames.
//!
//! Each frame of little-endian interleaved PCM is turned into one
//! self-delimited packet and back:
//!
//! ```text
//! PCM bytes -> FrameBuffer -> Transform (DCT) -> Quantizer (bands + Rice) -> PacketCodec -> packet
//! ```
//!
//! Frames are coded independently, so packets may be decoded in any order
//! and one [`Codec`] can be shared by any number of threads.
//!
//! # Usage
//!
//! ```
//! use framecodec::{Codec, CodecConfig, CodecError};
//!
//! // 48 kHz mono, 20 ms frames, 64 kbps target
//! let codec = Codec::new(CodecConfig::default()).unwrap();
//!
//! let pcm: Vec<u8> = (0..codec.frame_size())
//!     .flat_map(|i| (((i % 100) as i16 - 50) * 200).to_le_bytes())
//!     .collect();
//! let packet = codec.encode_frame(&pcm).unwrap();
//! let decoded = codec.decode_frame(packet.as_bytes()).unwrap();
//! assert_eq!(decoded.len(), pcm.len());
//!
//! // Input must be exactly one frame
//! assert!(matches!(
//!     codec.encode_frame(&pcm[1..]),
//!     Err(CodecError::InvalidLength { expected: 1920, got: 1919 })
//! ));
//! ```
//!
//! # Quality
//!
//! The encoder aims at the configured bitrate but never quantizes coarser
//! than a fixed fidelity floor. Frames that cannot reach the target at the
//! floor produce larger packets, bounded by
//! [`CodecConfig::max_packet_size`].

mod bitstream;
mod codec;
mod config;
mod error;
mod packet;
mod pcm;
mod quant;
mod transform;

pub use bitstream::{BitCounter, BitReader, BitSink, BitWriter};
pub use codec::Codec;
pub use config::{CodecConfig, MAX_FRAME_SAMPLES, SUPERFRAME_FRAMES};
pub use error::{CodecError, Result};
pub use packet::{HEADER_LEN, Packet, PacketCodec, PacketReader, Toc, split as split_packets};
pub use pcm::{FrameBuffer, PcmFrame};
pub use quant::{BandLayout, Bitstream, FLOOR_STEP, Quantizer};
pub use transform::{SpectralBlock, Transform};
