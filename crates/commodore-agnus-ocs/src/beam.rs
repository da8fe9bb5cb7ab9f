//! Beam position bookkeeping.
//!
//! Everything in the scheduler is measured in master crystal cycles. One
//! colour clock (CCK) is eight master cycles, and every raster line has a
//! fixed number of CCKs. The mapping between an absolute cycle count and a
//! (frame, line, column) triple is therefore a pure function of the region.

use serde::{Deserialize, Serialize};

/// Master cycles per colour clock.
pub const TICKS_PER_CCK: i64 = 8;
/// Colour clocks per raster line (PAL and NTSC short lines alike).
pub const CCKS_PER_LINE: u16 = 227;
pub const PAL_LINES_PER_FRAME: u16 = 312;
pub const NTSC_LINES_PER_FRAME: u16 = 262;

/// Convert colour clocks to master cycles.
#[must_use]
pub const fn dma_cycles(ccks: i64) -> i64 {
    ccks * TICKS_PER_CCK
}

/// Video region (affects frame length).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Region {
    /// PAL: 312 lines.
    #[default]
    Pal,
    /// NTSC: 262 lines.
    Ntsc,
}

impl Region {
    #[must_use]
    pub const fn lines_per_frame(self) -> u16 {
        match self {
            Self::Pal => PAL_LINES_PER_FRAME,
            Self::Ntsc => NTSC_LINES_PER_FRAME,
        }
    }
}

/// A (frame, vpos, hpos) triple. `hpos` counts colour clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Beam {
    pub frame: i64,
    pub vpos: u16,
    pub hpos: u16,
}

impl Beam {
    #[must_use]
    pub const fn new(frame: i64, vpos: u16, hpos: u16) -> Self {
        Self { frame, vpos, hpos }
    }
}

impl std::fmt::Display for Beam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "frame {} ({},{})", self.frame, self.vpos, self.hpos)
    }
}

/// Maps absolute master-cycle counts to beam positions and back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeamMap {
    lines_per_frame: u16,
    ccks_per_line: u16,
}

impl BeamMap {
    /// Both dimensions must be non-zero; [`BeamMap::for_region`] is the
    /// public way in.
    const fn new(lines_per_frame: u16, ccks_per_line: u16) -> Self {
        Self {
            lines_per_frame,
            ccks_per_line,
        }
    }

    #[must_use]
    pub const fn for_region(region: Region) -> Self {
        Self::new(region.lines_per_frame(), CCKS_PER_LINE)
    }

    #[must_use]
    pub const fn lines_per_frame(&self) -> u16 {
        self.lines_per_frame
    }

    #[must_use]
    pub const fn ccks_per_line(&self) -> u16 {
        self.ccks_per_line
    }

    #[must_use]
    pub const fn cycles_per_line(&self) -> i64 {
        dma_cycles(self.ccks_per_line as i64)
    }

    #[must_use]
    pub const fn cycles_per_frame(&self) -> i64 {
        self.cycles_per_line() * self.lines_per_frame as i64
    }

    /// Whether `vpos`/`hpos` addresses a position inside a frame.
    #[must_use]
    pub const fn is_valid(&self, vpos: u16, hpos: u16) -> bool {
        vpos < self.lines_per_frame && hpos < self.ccks_per_line
    }

    #[must_use]
    pub fn cycle_to_beam(&self, cycle: i64) -> Beam {
        let frame = cycle.div_euclid(self.cycles_per_frame());
        let ccks = cycle.rem_euclid(self.cycles_per_frame()) / TICKS_PER_CCK;
        let per_line = i64::from(self.ccks_per_line);

        Beam {
            frame,
            vpos: (ccks / per_line) as u16,
            hpos: (ccks % per_line) as u16,
        }
    }

    #[must_use]
    pub fn beam_to_cycle(&self, beam: Beam) -> i64 {
        beam.frame * self.cycles_per_frame()
            + dma_cycles(
                i64::from(beam.vpos) * i64::from(self.ccks_per_line) + i64::from(beam.hpos),
            )
    }

    /// First cycle of the frame `cycle` belongs to.
    #[must_use]
    pub fn start_of_frame(&self, cycle: i64) -> i64 {
        cycle.div_euclid(self.cycles_per_frame()) * self.cycles_per_frame()
    }

    #[must_use]
    pub fn start_of_next_frame(&self, cycle: i64) -> i64 {
        self.start_of_frame(cycle) + self.cycles_per_frame()
    }

    /// Whether `cycle` falls into the same frame as `now`.
    #[must_use]
    pub fn belongs_to_current_frame(&self, now: i64, cycle: i64) -> bool {
        cycle >= self.start_of_frame(now) && cycle < self.start_of_next_frame(now)
    }

    /// Advance a beam position by `ccks` colour clocks, wrapping columns into
    /// lines and lines into frames.
    #[must_use]
    pub fn add_to_beam(&self, beam: Beam, ccks: i64) -> Beam {
        self.cycle_to_beam(self.beam_to_cycle(beam) + dma_cycles(ccks))
    }
}

impl Default for BeamMap {
    fn default() -> Self {
        Self::for_region(Region::Pal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pal_frame_length_in_master_cycles() {
        let map = BeamMap::for_region(Region::Pal);
        assert_eq!(map.cycles_per_line(), 1816);
        assert_eq!(map.cycles_per_frame(), 566_592);
    }

    #[test]
    fn every_region_maps_cycles_without_dividing_by_zero() {
        for region in [Region::Pal, Region::Ntsc] {
            let map = BeamMap::for_region(region);
            assert!(map.lines_per_frame() > 0 && map.ccks_per_line() > 0);
            let last = map.cycles_per_frame() - 1;
            assert_eq!(
                map.cycle_to_beam(last),
                Beam::new(0, map.lines_per_frame() - 1, CCKS_PER_LINE - 1)
            );
            assert_eq!(map.cycle_to_beam(-1).frame, -1);
        }
    }

    #[test]
    fn ntsc_has_fewer_lines() {
        let map = BeamMap::for_region(Region::Ntsc);
        assert_eq!(map.lines_per_frame(), 262);
        assert_eq!(map.cycles_per_frame(), 262 * 1816);
    }

    #[test]
    fn cycle_to_beam_and_back() {
        let map = BeamMap::default();
        let beam = Beam::new(3, 44, 0x38);
        let cycle = map.beam_to_cycle(beam);
        assert_eq!(map.cycle_to_beam(cycle), beam);
        // Sub-CCK offsets round down to the same colour clock.
        assert_eq!(map.cycle_to_beam(cycle + 7), beam);
        assert_eq!(map.cycle_to_beam(cycle + 8).hpos, 0x39);
    }

    #[test]
    fn cycle_100_is_on_the_first_line() {
        let map = BeamMap::default();
        assert_eq!(map.cycle_to_beam(100), Beam::new(0, 0, 12));
    }

    #[test]
    fn add_to_beam_wraps_lines_and_frames() {
        let map = BeamMap::default();
        let beam = map.add_to_beam(Beam::new(0, 10, 226), 1);
        assert_eq!(beam, Beam::new(0, 11, 0));

        let beam = map.add_to_beam(Beam::new(0, 311, 226), 1);
        assert_eq!(beam, Beam::new(1, 0, 0));
    }

    #[test]
    fn frame_membership() {
        let map = BeamMap::default();
        let now = map.beam_to_cycle(Beam::new(2, 100, 5));
        assert!(map.belongs_to_current_frame(now, map.beam_to_cycle(Beam::new(2, 0, 0))));
        assert!(!map.belongs_to_current_frame(now, map.beam_to_cycle(Beam::new(3, 0, 0))));
        assert!(!map.belongs_to_current_frame(now, map.beam_to_cycle(Beam::new(1, 311, 226))));
        assert_eq!(map.start_of_next_frame(now), 3 * map.cycles_per_frame());
    }
}
