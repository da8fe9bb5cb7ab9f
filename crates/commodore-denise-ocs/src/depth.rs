//! Depth tags.
//!
//! Every pixel carries a 16-bit tag describing what was drawn there. The
//! high bits form a priority ladder: playfield priority levels are
//! interleaved with the sprite pairs, so a plain numeric comparison
//! decides who is in front. The low bits flag which playfields are solid.

pub const Z_0: u16 = 0x8000;
pub const Z_SP0: u16 = 0x4000;
pub const Z_SP1: u16 = 0x2000;
pub const Z_1: u16 = 0x1000;
pub const Z_SP2: u16 = 0x0800;
pub const Z_SP3: u16 = 0x0400;
pub const Z_2: u16 = 0x0200;
pub const Z_SP4: u16 = 0x0100;
pub const Z_SP5: u16 = 0x0080;
pub const Z_3: u16 = 0x0040;
pub const Z_SP6: u16 = 0x0020;
pub const Z_SP7: u16 = 0x0010;
pub const Z_4: u16 = 0x0008;

pub const Z_PF1: u16 = 0x0004;
pub const Z_PF2: u16 = 0x0002;
pub const Z_DPF: u16 = 0x0001;

pub const Z_SP: [u16; 8] = [Z_SP0, Z_SP1, Z_SP2, Z_SP3, Z_SP4, Z_SP5, Z_SP6, Z_SP7];
pub const Z_SP_ALL: u16 = Z_SP0 | Z_SP1 | Z_SP2 | Z_SP3 | Z_SP4 | Z_SP5 | Z_SP6 | Z_SP7;

/// Depth of a playfield with priority code `prio` (BPLCON2 PFxP).
/// Codes 5..7 are undefined on real hardware and map to 0.
#[must_use]
pub const fn z_pf(prio: u16) -> u16 {
    match prio {
        0 => Z_0,
        1 => Z_1,
        2 => Z_2,
        3 => Z_3,
        4 => Z_4,
        _ => 0,
    }
}

#[must_use]
pub const fn z_pf1(bplcon2: u16) -> u16 {
    z_pf(bplcon2 & 7)
}

#[must_use]
pub const fn z_pf2(bplcon2: u16) -> u16 {
    z_pf((bplcon2 >> 3) & 7)
}

/// Whether the front-most object at this pixel is a sprite.
#[must_use]
pub const fn is_sprite_pixel(z: u16) -> bool {
    (z & Z_SP_ALL) > (z & !Z_SP_ALL)
}

/// Whether sprite `nr` is the front-most object at this pixel.
#[must_use]
pub const fn is_sprite_pixel_of(z: u16, nr: usize) -> bool {
    (z & Z_SP[nr]) > (z & !Z_SP[nr])
}

/// Which playfield (1 or 2) is visible at a non-sprite pixel.
#[must_use]
pub const fn upper_playfield(z: u16, multiplexed: u8) -> u8 {
    if z & Z_DPF != 0 && multiplexed & 8 != 0 {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_ladder_interleaves_sprite_pairs() {
        assert!(Z_0 > Z_SP0 && Z_SP1 > Z_1);
        assert!(Z_1 > Z_SP2 && Z_SP3 > Z_2);
        assert!(Z_2 > Z_SP4 && Z_SP5 > Z_3);
        assert!(Z_3 > Z_SP6 && Z_SP7 > Z_4);
        assert!(Z_4 > Z_PF1);
    }

    #[test]
    fn undefined_priority_codes_are_transparent() {
        assert_eq!(z_pf1(0x0005), 0);
        assert_eq!(z_pf2(0x0038), 0);
        assert_eq!(z_pf2(0x0010), Z_2);
    }

    #[test]
    fn sprite_in_front_of_playfield() {
        let z = Z_2 | Z_SP3 | Z_PF1;
        assert!(is_sprite_pixel(z));
        assert!(is_sprite_pixel_of(z, 3));
        assert!(!is_sprite_pixel(Z_1 | Z_SP3));
    }

    #[test]
    fn upper_playfield_needs_dual_playfield_tag() {
        assert_eq!(upper_playfield(Z_DPF | Z_PF2, 0x09), 2);
        assert_eq!(upper_playfield(Z_PF2, 0x09), 1);
        assert_eq!(upper_playfield(Z_DPF | Z_PF1, 0x01), 1);
    }
}
