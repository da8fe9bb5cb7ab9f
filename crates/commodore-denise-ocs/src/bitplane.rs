//! Bitplane shift registers and BPLCON0 decoding.
//!
//! BPLxDAT writes fill holding latches. A write to BPL1DAT copies all six
//! latches into the pipe and arms both halves of the shifter. The
//! sequencer then calls the odd and even draw routines, which spread one
//! 16-bit word per plane across the raw-bits buffer.

use crate::buffers;

/// Display resolution selected by BPLCON0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    #[default]
    Lores,
    Hires,
    Shres,
}

impl Resolution {
    /// SHRES (bit 6) only exists on ECS Denise.
    #[must_use]
    pub const fn from_bplcon0(bplcon0: u16, ecs: bool) -> Self {
        if ecs && bplcon0 & 0x0040 != 0 {
            Self::Shres
        } else if bplcon0 & 0x8000 != 0 {
            Self::Hires
        } else {
            Self::Lores
        }
    }
}

/// BPU field as written, 0..=7.
#[must_use]
pub const fn raw_bpu(bplcon0: u16) -> u8 {
    ((bplcon0 >> 12) & 7) as u8
}

/// Number of bitplanes Denise actually shifts out.
///
/// Lores clamps 7 to 6. In hires more than 4 and in SHRES more than 2
/// planes disable bitplane output entirely.
#[must_use]
pub const fn bpu(bplcon0: u16, res: Resolution) -> u8 {
    let bpu = raw_bpu(bplcon0);
    match res {
        Resolution::Lores => {
            if bpu < 7 {
                bpu
            } else {
                6
            }
        }
        Resolution::Hires => {
            if bpu < 5 {
                bpu
            } else {
                0
            }
        }
        Resolution::Shres => {
            if bpu < 3 {
                bpu
            } else {
                0
            }
        }
    }
}

/// Whether BPU is one of the values [`bpu`] has to clamp.
#[must_use]
pub const fn is_irregular_bpu(bplcon0: u16, res: Resolution) -> bool {
    bpu(bplcon0, res) != raw_bpu(bplcon0)
}

#[must_use]
pub const fn is_ham(bplcon0: u16) -> bool {
    let bpu = raw_bpu(bplcon0);
    bplcon0 & 0x8C00 == 0x0800 && (bpu == 5 || bpu == 6)
}

#[must_use]
pub const fn is_dual_playfield(bplcon0: u16) -> bool {
    bplcon0 & 0x0400 != 0
}

#[must_use]
pub const fn is_interlaced(bplcon0: u16) -> bool {
    bplcon0 & 0x0004 != 0
}

/// ECSENA: enables the BPLCON3 extras.
#[must_use]
pub const fn is_ecs_enabled(bplcon0: u16) -> bool {
    bplcon0 & 0x0001 != 0
}

/// BRDRBLNK: border is drawn black instead of COLOR00.
#[must_use]
pub const fn is_border_blank(bplcon3: u16) -> bool {
    bplcon3 & 0x0020 != 0
}

/// Scroll offset of the odd planes in hires pixels.
#[must_use]
pub const fn pixel_offset_odd(bplcon1: u16) -> isize {
    ((bplcon1 & 0x0001) << 1) as isize
}

/// Scroll offset of the even planes in hires pixels.
#[must_use]
pub const fn pixel_offset_even(bplcon1: u16) -> isize {
    ((bplcon1 & 0x0010) >> 3) as isize
}

// Planes a BPU value enables, split into the odd (1,3,5) and even (2,4,6)
// halves. Indexed by BPU.
const ODD_MASK: [u8; 7] = [0x00, 0x01, 0x01, 0x05, 0x05, 0x15, 0x15];
const EVEN_MASK: [u8; 7] = [0x00, 0x00, 0x02, 0x02, 0x0A, 0x0A, 0x2A];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Half {
    Odd,
    Even,
}

impl Half {
    const fn planes(self) -> [usize; 3] {
        match self {
            Self::Odd => [0, 2, 4],
            Self::Even => [1, 3, 5],
        }
    }

    const fn mask(self, bpu: u8) -> u8 {
        let bpu = if bpu > 6 { 6 } else { bpu } as usize;
        match self {
            Self::Odd => ODD_MASK[bpu],
            Self::Even => EVEN_MASK[bpu],
        }
    }

    /// Bits of the other half that survive a write.
    const fn keep(self) -> u8 {
        match self {
            Self::Odd => 0b10_1010,
            Self::Even => 0b01_0101,
        }
    }

    /// SHRES packs two sub-pixels per buffer entry: the first goes into
    /// bits 2..3, the second into bits 0..1.
    const fn keep_shres(self, first: bool) -> u8 {
        match (self, first) {
            (Self::Odd, true) => 0b11_1011,
            (Self::Even, true) => 0b11_0111,
            (Self::Odd, false) => 0b11_1110,
            (Self::Even, false) => 0b11_1101,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BitplaneShifter {
    /// Holding latches, written by DMA or the CPU.
    pub bpldat: [u16; 6],
    pipe: [u16; 6],
    shift: [u16; 6],
    armed_odd: bool,
    armed_even: bool,
}

impl BitplaneShifter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write BPLxDAT. Returns `true` if the write was to BPL1DAT, which
    /// transfers the latches into the pipe.
    pub fn write(&mut self, plane: usize, value: u16) -> bool {
        let Some(latch) = self.bpldat.get_mut(plane) else {
            return false;
        };
        *latch = value;
        if plane != 0 {
            return false;
        }
        self.pipe = self.bpldat;
        self.armed_odd = true;
        self.armed_even = true;
        true
    }

    #[must_use]
    pub fn is_armed_odd(&self) -> bool {
        self.armed_odd
    }

    #[must_use]
    pub fn is_armed_even(&self) -> bool {
        self.armed_even
    }

    /// Shift out the odd planes starting at buffer position `pixel`.
    pub fn draw_odd(&mut self, raw_bits: &mut [u8], pixel: isize, res: Resolution, bpu: u8) {
        if !self.armed_odd {
            return;
        }
        self.armed_odd = false;
        self.draw_half(Half::Odd, raw_bits, pixel, res, bpu);
    }

    /// Shift out the even planes starting at buffer position `pixel`.
    pub fn draw_even(&mut self, raw_bits: &mut [u8], pixel: isize, res: Resolution, bpu: u8) {
        if !self.armed_even {
            return;
        }
        self.armed_even = false;
        self.draw_half(Half::Even, raw_bits, pixel, res, bpu);
    }

    fn load_shift(&mut self, half: Half, bpu: u8) {
        let mask = half.mask(bpu);
        for plane in half.planes() {
            if mask & (1 << plane) != 0 {
                self.shift[plane] = self.pipe[plane];
            }
        }
    }

    fn draw_half(&mut self, half: Half, raw_bits: &mut [u8], pixel: isize, res: Resolution, bpu: u8) {
        self.load_shift(half, bpu);

        let mask = half.mask(bpu);
        let planes = half.planes();
        let keep = half.keep();
        let mut pos = pixel;

        for i in 0..16 {
            let bit = 15 - i;
            let mut index = 0u8;
            for plane in planes {
                index |= (((self.shift[plane] >> bit) & 1) as u8) << plane;
            }
            index &= mask;

            match res {
                Resolution::Lores => {
                    put(raw_bits, pos, keep, index);
                    put(raw_bits, pos + 1, keep, index);
                    pos += 2;
                }
                Resolution::Hires => {
                    put(raw_bits, pos, keep, index);
                    pos += 1;
                }
                Resolution::Shres => {
                    // Only planes 1 and 2 exist here, so the index is a
                    // single bit in position 0 or 1.
                    if i % 2 == 0 {
                        put(raw_bits, pos, half.keep_shres(true), index << 2);
                    } else {
                        put(raw_bits, pos, half.keep_shres(false), index);
                        pos += 1;
                    }
                }
            }
        }

        for plane in planes {
            self.shift[plane] = 0;
        }
    }
}

fn put(raw_bits: &mut [u8], pos: isize, keep: u8, bits: u8) {
    if let Some(slot) = buffers::index(pos).and_then(|i| raw_bits.get_mut(i)) {
        *slot = (*slot & keep) | bits;
    }
}
