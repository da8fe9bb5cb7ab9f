//! CLXCON/CLXDAT collision detection.
//!
//! Collisions are evaluated after a line has been composed, from the raw
//! bitplane bits and the depth tags. Bits accumulate in CLXDAT until the
//! CPU reads the register.

use crate::buffers::{HPIXELS, index};
use crate::depth::{Z_DPF, Z_SP, Z_SP_ALL, Z_SP0, Z_SP1, Z_SP2, Z_SP3, Z_SP4, Z_SP5, Z_SP6, Z_SP7};

#[derive(Debug, Clone, Default)]
pub struct Collisions {
    clxcon: u16,
    clxdat: u16,
}

impl Collisions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn poke_clxcon(&mut self, value: u16) {
        self.clxcon = value;
    }

    #[must_use]
    pub fn clxcon(&self) -> u16 {
        self.clxcon
    }

    /// Read CLXDAT. Bit 15 always reads as 1; the register clears.
    pub fn peek_clxdat(&mut self) -> u16 {
        let value = self.clxdat | 0x8000;
        self.clxdat = 0;
        value
    }

    /// Read CLXDAT without side effects.
    #[must_use]
    pub fn spypeek_clxdat(&self) -> u16 {
        self.clxdat | 0x8000
    }

    /// ENSPx: odd sprite `x` takes part in collisions.
    fn ensp(&self, x: usize) -> bool {
        self.clxcon & (1 << (12 + x / 2)) != 0
    }

    fn enbp1(&self) -> u8 {
        ((self.clxcon >> 6) & 0b01_0101) as u8
    }

    fn enbp2(&self) -> u8 {
        ((self.clxcon >> 6) & 0b10_1010) as u8
    }

    fn mvbp1(&self) -> u8 {
        (self.clxcon & 0b01_0101) as u8
    }

    fn mvbp2(&self) -> u8 {
        (self.clxcon & 0b10_1010) as u8
    }

    /// Sprite-sprite collisions of sprite `x` over buffer range `start..=end`.
    pub fn check_sprite_sprite(&mut self, x: usize, start: isize, end: isize, depth: &[u16]) {
        if x % 2 == 1 && !self.ensp(x) {
            return;
        }

        let pair = |even: u16, odd: u16, bit: u16| {
            even | if self.clxcon & (1 << bit) != 0 { odd } else { 0 }
        };
        let comp01 = pair(Z_SP0, Z_SP1, 12);
        let comp23 = pair(Z_SP2, Z_SP3, 13);
        let comp45 = pair(Z_SP4, Z_SP5, 14);
        let comp67 = pair(Z_SP6, Z_SP7, 15);

        let mut pos = end;
        while pos >= start {
            let z = index(pos).and_then(|i| depth.get(i)).copied().unwrap_or(0);
            pos -= 2;

            if z & (Z_SP_ALL ^ Z_SP[x]) == 0 || z & Z_SP[x] == 0 {
                continue;
            }

            let hit = |a: u16, b: u16| z & a != 0 && z & b != 0;
            for (bit, a, b) in [
                (14, comp45, comp67),
                (13, comp23, comp67),
                (12, comp23, comp45),
                (11, comp01, comp67),
                (10, comp01, comp45),
                (9, comp01, comp23),
            ] {
                if hit(a, b) {
                    self.clxdat |= 1 << bit;
                }
            }
        }
    }

    /// Sprite-playfield collisions of sprite `x` over `start..=end`.
    pub fn check_sprite_playfield(
        &mut self,
        x: usize,
        start: isize,
        end: isize,
        depth: &[u16],
        raw_bits: &[u8],
    ) {
        if x % 2 == 1 && !self.ensp(x) {
            return;
        }

        let enabled1 = self.enbp1();
        let enabled2 = self.enbp2();
        let compare1 = self.mvbp1() & enabled1;
        let compare2 = self.mvbp2() & enabled2;

        let mut pos = end;
        while pos >= start {
            let at = index(pos);
            pos -= 2;
            let Some(i) = at else { continue };
            let (Some(&z), Some(&bits)) = (depth.get(i), raw_bits.get(i)) else {
                continue;
            };

            if z & Z_SP[x] == 0 {
                continue;
            }

            if bits & enabled2 == compare2 {
                self.clxdat |= 1 << (5 + x / 2);
            } else if z & Z_DPF == 0 {
                // In single playfield mode a PF2 miss is also a PF1 miss.
                continue;
            }

            if bits & enabled1 == compare1 {
                self.clxdat |= 1 << (1 + x / 2);
            }
        }
    }

    /// Playfield-playfield collision (CLXDAT bit 0).
    pub fn check_playfield_playfield(&mut self, raw_bits: &[u8]) {
        if self.clxdat & 1 != 0 {
            return;
        }

        let enabled1 = self.enbp1();
        let enabled2 = self.enbp2();
        let compare1 = self.mvbp1() & enabled1;
        let compare2 = self.mvbp2() & enabled2;

        let hit = raw_bits
            .iter()
            .take(HPIXELS)
            .any(|&b| b & enabled1 == compare1 && b & enabled2 == compare2);
        if hit {
            self.clxdat |= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::LINE_LEN;

    #[test]
    fn peek_clears_and_spypeek_does_not() {
        let mut clx = Collisions::new();
        clx.clxdat = 0x0202;
        assert_eq!(clx.spypeek_clxdat(), 0x8202);
        assert_eq!(clx.spypeek_clxdat(), 0x8202);
        assert_eq!(clx.peek_clxdat(), 0x8202);
        assert_eq!(clx.peek_clxdat(), 0x8000);
    }

    #[test]
    fn overlapping_sprite_pairs_collide() {
        let mut clx = Collisions::new();
        let mut depth = vec![0u16; LINE_LEN];
        depth[100] = Z_SP0 | Z_SP2;

        clx.check_sprite_sprite(0, 70, 100, &depth);
        assert_eq!(clx.peek_clxdat(), 0x8000 | 1 << 9);
    }

    #[test]
    fn odd_sprites_need_ensp() {
        let mut clx = Collisions::new();
        let mut depth = vec![0u16; LINE_LEN];
        depth[100] = Z_SP1 | Z_SP2;

        clx.check_sprite_sprite(1, 70, 100, &depth);
        assert_eq!(clx.peek_clxdat(), 0x8000);

        clx.poke_clxcon(0x1000);
        clx.check_sprite_sprite(1, 70, 100, &depth);
        assert_eq!(clx.peek_clxdat(), 0x8000 | 1 << 9);
    }

    #[test]
    fn sprite_playfield_match_on_enabled_planes() {
        let mut clx = Collisions::new();
        let mut depth = vec![0u16; LINE_LEN];
        let mut raw = vec![0u8; LINE_LEN];
        depth[40] = Z_SP2;
        raw[40] = 0b01;

        // ENBP1 and MVBP1 set: sprite 2 over plane 1 hits PF1 (bit 2).
        // No even plane is enabled, so PF2 matches as well (bit 6).
        clx.poke_clxcon(0x0041);
        clx.check_sprite_playfield(2, 10, 40, &depth, &raw);
        assert_eq!(clx.peek_clxdat(), 0x8000 | 1 << 2 | 1 << 6);
    }

    #[test]
    fn single_playfield_pf2_miss_hides_pf1() {
        let mut clx = Collisions::new();
        let mut depth = vec![0u16; LINE_LEN];
        let mut raw = vec![0u8; LINE_LEN];
        depth[40] = Z_SP0;
        raw[40] = 0b01;

        // Require plane 2 set for PF2: misses, and without Z_DPF PF1 is skipped.
        clx.poke_clxcon(0x0081 | 0x0002);
        clx.check_sprite_playfield(0, 10, 40, &depth, &raw);
        assert_eq!(clx.peek_clxdat(), 0x8000);

        depth[40] |= Z_DPF;
        clx.check_sprite_playfield(0, 10, 40, &depth, &raw);
        assert_eq!(clx.peek_clxdat(), 0x8000 | 1 << 1);
    }

    #[test]
    fn playfield_collision_is_sticky() {
        let mut clx = Collisions::new();
        let mut raw = vec![0u8; LINE_LEN];
        clx.poke_clxcon(0x0FC0 | 0x0003);
        clx.check_playfield_playfield(&raw);
        assert_eq!(clx.spypeek_clxdat(), 0x8000);

        raw[300] = 0b11;
        clx.check_playfield_playfield(&raw);
        assert_eq!(clx.peek_clxdat(), 0x8001);
    }
}
