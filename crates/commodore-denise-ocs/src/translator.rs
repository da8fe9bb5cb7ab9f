//! Playfield translation: raw bitplane bits to colour indices and depth.
//!
//! Runs once per line over the whole raw-bits buffer. BPLCON0 and BPLCON2
//! writes recorded during the line split it into chunks, each translated
//! with the playfield state in effect at that point.

use crate::bitplane::{is_dual_playfield, is_ham};
use crate::buffers::{LINE_LEN, LineBuffers};
use crate::depth::{Z_DPF, Z_PF1, Z_PF2, z_pf1, z_pf2};
use crate::error::DeniseError;
use crate::reg_change::{RegisterChangeKind, RegisterChangeQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlayfieldState {
    dual: bool,
    ham: bool,
    /// PF2PRI: playfield 2 in front of playfield 1.
    prio: bool,
    zpf1: u16,
    zpf2: u16,
}

impl PlayfieldState {
    fn new(bplcon0: u16, bplcon2: u16) -> Self {
        let mut state = Self {
            dual: false,
            ham: false,
            prio: false,
            zpf1: 0,
            zpf2: 0,
        };
        state.set_bplcon0(bplcon0);
        state.set_bplcon2(bplcon2);
        state
    }

    fn set_bplcon0(&mut self, value: u16) {
        self.dual = is_dual_playfield(value);
        self.ham = is_ham(value);
    }

    fn set_bplcon2(&mut self, value: u16) {
        self.prio = value & 0x0040 != 0;
        self.zpf1 = z_pf1(value);
        self.zpf2 = z_pf2(value);
    }
}

/// Translate the line and snapshot the playfield indices into
/// `color_index` for the HAM decoder.
///
/// # Errors
///
/// [`DeniseError::UnexpectedChange`] if the queue holds anything but
/// BPLCON0/BPLCON2 changes.
pub fn translate(
    buffers: &mut LineBuffers,
    changes: &mut RegisterChangeQueue,
    bplcon0: u16,
    bplcon2: u16,
    hidden_bitplanes: u8,
) -> Result<(), DeniseError> {
    if hidden_bitplanes != 0 {
        for bits in &mut buffers.raw_bits {
            *bits &= !hidden_bitplanes;
        }
    }

    let mut state = PlayfieldState::new(bplcon0, bplcon2);
    let mut from = 0usize;

    changes.terminate(LINE_LEN as isize);
    let replay: Vec<_> = changes.drain().collect();

    for change in replay {
        let to = usize::try_from(change.pixel).unwrap_or(0).clamp(from, LINE_LEN);
        if state.dual {
            translate_dpf(buffers, from, to, state);
        } else {
            translate_spf(buffers, from, to, state);
        }
        from = to;

        match change.kind {
            RegisterChangeKind::Bplcon0 => state.set_bplcon0(change.value),
            RegisterChangeKind::Bplcon2 => state.set_bplcon2(change.value),
            RegisterChangeKind::None => {}
            kind => return Err(changes.unexpected(kind)),
        }
    }

    buffers.color_index.copy_from_slice(&buffers.multiplexed);
    Ok(())
}

fn translate_spf(buffers: &mut LineBuffers, from: usize, to: usize, state: PlayfieldState) {
    let raw = &buffers.raw_bits[from..to];
    let out = &mut buffers.multiplexed[from..to];
    let depth = &mut buffers.depth[from..to];

    // With an undefined PF2 priority, Denise drops planes 1-4 wherever
    // plane 5 is set. HAM lines are not affected.
    if state.zpf2 == 0 && !state.ham {
        for ((&s, m), z) in raw.iter().zip(out).zip(depth) {
            *m = if s & 0x10 != 0 { s & 0x30 } else { s };
            *z = 0;
        }
        return;
    }

    for ((&s, m), z) in raw.iter().zip(out).zip(depth) {
        *m = s;
        *z = if s != 0 { state.zpf2 } else { 0 };
    }
}

fn translate_dpf(buffers: &mut LineBuffers, from: usize, to: usize, state: PlayfieldState) {
    // An undefined priority makes that playfield fully transparent.
    let mask1 = if state.zpf1 != 0 { 0x0F } else { 0x00 };
    let mask2 = if state.zpf2 != 0 { 0x0F } else { 0x00 };

    let raw = &buffers.raw_bits[from..to];
    let out = &mut buffers.multiplexed[from..to];
    let depth = &mut buffers.depth[from..to];

    for ((&s, m), z) in raw.iter().zip(out).zip(depth) {
        let index1 = (s & 1) | ((s & 4) >> 1) | ((s & 16) >> 2);
        let index2 = ((s & 2) >> 1) | ((s & 8) >> 2) | ((s & 32) >> 3);
        let color1 = index1 & mask1;
        let color2 = (index2 | 0b1000) & mask2;

        (*m, *z) = match (index1 != 0, index2 != 0) {
            (true, true) if state.prio => (color2, state.zpf2 | Z_DPF | Z_PF1 | Z_PF2),
            (true, true) => (color1, state.zpf1 | Z_DPF | Z_PF1 | Z_PF2),
            (true, false) => (color1, state.zpf1 | Z_DPF | Z_PF1),
            (false, true) => (color2, state.zpf2 | Z_DPF | Z_PF2),
            (false, false) => (0, Z_DPF),
        };
    }
}
