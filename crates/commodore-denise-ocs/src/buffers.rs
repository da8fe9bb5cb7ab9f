//! Per-line working buffers.
//!
//! All buffers are indexed in hires pixels: one colour clock covers four
//! of them. Writes that land past the end of a buffer are dropped, so a
//! sprite or bitplane slice hanging off the right edge is simply clipped.

/// Colour clocks per line times four.
pub const HPIXELS: usize = 4 * 227;
/// Room for the widest slice drawn at the last colour clock plus the
/// scroll and sprite trigger offsets.
pub const LINE_LEN: usize = HPIXELS + 4 * 16 + 6;

/// `border` value meaning "not a border pixel".
pub const NO_BORDER: u8 = 0xFF;

#[derive(Debug, Clone)]
pub struct LineBuffers {
    /// Raw bitplane bits, bit n = plane n+1.
    pub raw_bits: Vec<u8>,
    /// Border palette index, or [`NO_BORDER`].
    pub border: Vec<u8>,
    /// Playfield colour index before sprites are mixed in.
    pub color_index: Vec<u8>,
    /// Colour index after playfield and sprite multiplexing.
    pub multiplexed: Vec<u8>,
    /// Depth tags (see [`crate::depth`]).
    pub depth: Vec<u16>,
}

impl LineBuffers {
    #[must_use]
    pub fn new() -> Self {
        Self {
            raw_bits: vec![0; LINE_LEN],
            border: vec![NO_BORDER; LINE_LEN],
            color_index: vec![0; LINE_LEN],
            multiplexed: vec![0; LINE_LEN],
            depth: vec![0; LINE_LEN],
        }
    }

    /// Forget all bitplane data of the finished line.
    pub fn clear_raw_bits(&mut self) {
        self.raw_bits.fill(0);
    }
}

impl Default for LineBuffers {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert a buffer position to an index, or `None` when out of range.
#[must_use]
pub fn index(pixel: isize) -> Option<usize> {
    usize::try_from(pixel).ok().filter(|&i| i < LINE_LEN)
}
