//! Custom chip register routing for the Denise side of the bus.
//!
//! Offsets are relative to the custom chip base at $DFF000.

use commodore_denise_ocs::{Denise, DeniseError};

pub const CLXDAT: u16 = 0x00E;
pub const DENISEID: u16 = 0x07C;
pub const DIWSTRT: u16 = 0x08E;
pub const DIWSTOP: u16 = 0x090;
pub const CLXCON: u16 = 0x098;
pub const BPLCON0: u16 = 0x100;
pub const BPLCON1: u16 = 0x102;
pub const BPLCON2: u16 = 0x104;
pub const BPLCON3: u16 = 0x106;
pub const BPL1DAT: u16 = 0x110;
pub const SPR0POS: u16 = 0x140;
pub const COLOR00: u16 = 0x180;
pub const DIWHIGH: u16 = 0x1E4;

/// Route a write to Denise. Returns `Ok(false)` for offsets Denise does not
/// decode.
pub(crate) fn write_denise_register(
    denise: &mut Denise,
    hpos: u16,
    offset: u16,
    val: u16,
) -> Result<bool, DeniseError> {
    match offset & 0x1FE {
        DIWSTRT => denise.poke_diwstrt(hpos, val)?,
        DIWSTOP => denise.poke_diwstop(hpos, val)?,
        CLXCON => denise.poke_clxcon(val),
        BPLCON0 => denise.poke_bplcon0(hpos, val)?,
        BPLCON1 => denise.poke_bplcon1(val),
        BPLCON2 => denise.poke_bplcon2(hpos, val)?,
        BPLCON3 => denise.poke_bplcon3(val),
        o @ 0x110..=0x11A => denise.poke_bpl_dat(usize::from((o - BPL1DAT) / 2), hpos, val),
        o @ 0x140..=0x17E => {
            let x = ((o - SPR0POS) / 8) as u8;
            match (o - SPR0POS) % 8 {
                0 => denise.poke_spr_pos(x, hpos, val)?,
                2 => denise.poke_spr_ctl(x, hpos, val)?,
                4 => denise.poke_spr_data(x, hpos, val)?,
                _ => denise.poke_spr_datb(x, hpos, val)?,
            }
        }
        o @ 0x180..=0x1BE => denise.poke_color(((o - COLOR00) / 2) as u8, hpos, val)?,
        DIWHIGH => denise.poke_diwhigh(hpos, val)?,
        _ => return Ok(false),
    }
    Ok(true)
}

/// Serve a read from Denise, or `None` for registers it does not drive.
pub(crate) fn read_denise_register(denise: &mut Denise, offset: u16) -> Option<u16> {
    match offset & 0x1FE {
        CLXDAT => Some(denise.peek_clxdat()),
        DENISEID => Some(denise.peek_deniseid()),
        _ => None,
    }
}
