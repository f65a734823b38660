//! Packet TOC (Table of Contents) byte.

/// Current bitstream version.
pub const VERSION: u8 = 1;

/// First byte of every packet.
///
/// Layout:
/// ```text
///          0 1 2 3 4 5 6 7
///         +-+-+-+-+-+-+-+-+
///         | ver |s|  rsv  |
///         +-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toc(pub u8);

impl Toc {
    /// Creates a TOC from a byte.
    pub const fn new(byte: u8) -> Self {
        Self(byte)
    }

    /// Builds the TOC of the current version.
    pub const fn for_channels(stereo: bool) -> Self {
        let s = if stereo { 0b0001_0000 } else { 0 };
        Self((VERSION << 5) | s)
    }

    /// Returns the version number (0-7).
    pub fn version(&self) -> u8 {
        self.0 >> 5
    }

    /// Returns true if the TOC indicates stereo audio.
    pub fn is_stereo(&self) -> bool {
        (self.0 & 0b0001_0000) != 0
    }

    /// Returns the reserved bits, which must be zero.
    pub fn reserved(&self) -> u8 {
        self.0 & 0b0000_1111
    }

    /// Returns the channel count this TOC describes.
    pub fn channels(&self) -> usize {
        if self.is_stereo() { 2 } else { 1 }
    }
}

impl std::fmt::Display for Toc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "toc: version={}, stereo={}, reserved={:#06b}",
            self.version(),
            self.is_stereo(),
            self.reserved()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toc_layout() {
        let mono = Toc::for_channels(false);
        assert_eq!(mono.0, 0b0010_0000);
        assert_eq!(mono.version(), VERSION);
        assert!(!mono.is_stereo());
        assert_eq!(mono.channels(), 1);
        assert_eq!(mono.reserved(), 0);

        let stereo = Toc::for_channels(true);
        assert_eq!(stereo.0, 0b0011_0000);
        assert!(stereo.is_stereo());
        assert_eq!(stereo.channels(), 2);
    }

    #[test]
    fn test_toc_fields() {
        let toc = Toc::new(0xFF);
        assert_eq!(toc.version(), 7);
        assert!(toc.is_stereo());
        assert_eq!(toc.reserved(), 0x0F);
    }

    #[test]
    fn test_toc_display() {
        let s = Toc::for_channels(true).to_string();
        assert_eq!(s, "toc: version=1, stereo=true, reserved=0b0000");
    }
}
