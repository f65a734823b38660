//! Self-delimited packet framing.
//!
//! ```text
//! +-----+----------------+-------------------+
//! | TOC | length (u16be) | payload           |
//! +-----+----------------+-------------------+
//!   1B        2B           `length` bytes
//! ```
//!
//! Packets carry no state from one to the next, so any packet decodes on its
//! own and concatenated packets can be split without decoding payloads.

mod toc;

pub use toc::{Toc, VERSION};

use crate::error::{CodecError, Result};
use crate::quant::Bitstream;

/// Bytes before the payload: TOC plus payload length.
pub const HEADER_LEN: usize = 3;

/// One encoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet(pub Vec<u8>);

impl Packet {
    /// Creates a new packet from bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    /// Creates a packet from a byte slice.
    pub fn from_slice(data: &[u8]) -> Self {
        Self(data.to_vec())
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Returns the length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the packet is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the TOC byte of this packet.
    pub fn toc(&self) -> Toc {
        Toc::new(self.0.first().copied().unwrap_or(0))
    }

    /// Returns true if this packet contains stereo audio.
    pub fn is_stereo(&self) -> bool {
        self.toc().is_stereo()
    }

    /// Returns the bytes after the header, or an empty slice if the packet
    /// is shorter than a header.
    pub fn payload(&self) -> &[u8] {
        self.0.get(HEADER_LEN..).unwrap_or(&[])
    }
}

impl AsRef<[u8]> for Packet {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Packet {
    fn from(data: Vec<u8>) -> Self {
        Self(data)
    }
}

impl From<&[u8]> for Packet {
    fn from(data: &[u8]) -> Self {
        Self(data.to_vec())
    }
}

/// Frames quantizer output into packets and validates incoming ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketCodec {
    max_packet_size: usize,
    stereo: bool,
}

impl PacketCodec {
    pub fn new(max_packet_size: usize, channels: usize) -> Self {
        Self {
            max_packet_size,
            stereo: channels == 2,
        }
    }

    pub fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }

    /// Largest payload that fits in a packet.
    pub fn max_payload(&self) -> usize {
        self.max_packet_size
            .saturating_sub(HEADER_LEN)
            .min(u16::MAX as usize)
    }

    /// Wraps a bitstream in a packet header.
    pub fn pack(&self, bitstream: &Bitstream) -> Result<Packet> {
        let payload = bitstream.as_bytes();
        if payload.len() > self.max_payload() {
            return Err(CodecError::BitBudgetExceeded {
                needed: (HEADER_LEN + payload.len()) * 8,
                limit: self.max_packet_size * 8,
            });
        }

        let mut data = Vec::with_capacity(HEADER_LEN + payload.len());
        data.push(Toc::for_channels(self.stereo).0);
        data.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        data.extend_from_slice(payload);
        Ok(Packet(data))
    }

    /// Validates a packet and returns its payload.
    pub fn unpack<'a>(&self, packet: &'a [u8]) -> Result<&'a [u8]> {
        if packet.len() < HEADER_LEN {
            return Err(reject(format!(
                "packet of {} bytes is shorter than the header",
                packet.len()
            )));
        }
        if packet.len() > self.max_packet_size {
            return Err(reject(format!(
                "packet of {} bytes exceeds maximum of {}",
                packet.len(),
                self.max_packet_size
            )));
        }

        let toc = Toc::new(packet[0]);
        if toc.version() != VERSION {
            return Err(reject(format!("unsupported version {}", toc.version())));
        }
        if toc.reserved() != 0 {
            return Err(reject(format!("reserved bits set: {}", toc)));
        }
        if toc.is_stereo() != self.stereo {
            return Err(reject(format!(
                "packet has {} channel(s), codec expects {}",
                toc.channels(),
                if self.stereo { 2 } else { 1 }
            )));
        }

        let declared = declared_len(packet);
        let actual = packet.len() - HEADER_LEN;
        if declared != actual {
            return Err(reject(format!(
                "declared payload length {} does not match {}",
                declared, actual
            )));
        }
        Ok(&packet[HEADER_LEN..])
    }
}

fn declared_len(packet: &[u8]) -> usize {
    u16::from_be_bytes([packet[1], packet[2]]) as usize
}

fn reject(reason: String) -> CodecError {
    tracing::debug!(%reason, "rejecting packet");
    CodecError::MalformedPacket(reason)
}

/// Iterates over concatenated packets using their length fields.
///
/// Only framing is checked here; each packet still goes through
/// [`PacketCodec::unpack`] before its payload is used.
#[derive(Debug, Clone)]
pub struct PacketReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> PacketReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl<'a> Iterator for PacketReader<'a> {
    type Item = Result<&'a [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.data[self.pos..];
        if rest.is_empty() {
            return None;
        }
        if rest.len() < HEADER_LEN {
            self.pos = self.data.len();
            return Some(Err(reject(format!(
                "{} trailing bytes at offset {}",
                rest.len(),
                self.data.len() - rest.len()
            ))));
        }
        let total = HEADER_LEN + declared_len(rest);
        if total > rest.len() {
            let offset = self.pos;
            self.pos = self.data.len();
            return Some(Err(reject(format!(
                "packet at offset {} needs {} bytes, {} available",
                offset,
                total,
                rest.len()
            ))));
        }
        self.pos += total;
        Some(Ok(&rest[..total]))
    }
}

/// Splits concatenated packets.
pub fn split(data: &[u8]) -> Result<Vec<&[u8]>> {
    PacketReader::new(data).collect()
}
