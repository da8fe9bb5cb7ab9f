//! Sprite engine.
//!
//! Sprite register writes are queued per sprite pair. At the end of a line
//! each pair replays its queue while walking the line, loading the shift
//! registers when the beam reaches a sprite's start position, and mixes
//! sprite pixels into the multiplexed buffer by comparing depth tags.
//! Pairs are drawn from 3 down to 0 so lower-numbered pairs end up in front.

use crate::bitplane::Resolution;
use crate::buffers::{HPIXELS, LINE_LEN, LineBuffers, index};
use crate::collision::Collisions;
use crate::depth::Z_SP;
use crate::error::DeniseError;
use crate::reg_change::{RegisterChangeKind, RegisterChangeQueue};

const QUEUE_NAMES: [&str; 4] = ["spr01", "spr23", "spr45", "spr67"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sprite {
    pub pos: u16,
    pub ctl: u16,
    pub data: u16,
    pub datb: u16,
    shift_a: u16,
    shift_b: u16,
}

impl Sprite {
    /// Horizontal start in lores pixels, SH8..SH0.
    #[must_use]
    pub const fn hstart(&self) -> u16 {
        ((self.pos & 0x00FF) << 1) | (self.ctl & 0x0001)
    }

    #[must_use]
    pub const fn vstart(&self) -> u16 {
        ((self.pos >> 8) & 0x00FF) | ((self.ctl & 0x0004) << 6)
    }

    #[must_use]
    pub const fn vstop(&self) -> u16 {
        ((self.ctl >> 8) & 0x00FF) | ((self.ctl & 0x0002) << 7)
    }

    /// ATT bit. Only meaningful on odd sprites.
    #[must_use]
    pub const fn attached(&self) -> bool {
        self.ctl & 0x0080 != 0
    }

    /// Buffer position the first sprite pixel lands on.
    #[must_use]
    pub fn start_pixel(&self, res: Resolution) -> isize {
        let pixel = 2 * self.hstart() as isize + 2;
        if res == Resolution::Shres { pixel } else { pixel & !1 }
    }

    fn load(&mut self) {
        self.shift_a = self.data;
        self.shift_b = self.datb;
    }

    fn is_shifting(&self) -> bool {
        self.shift_a | self.shift_b != 0
    }

    fn shift(&mut self) {
        self.shift_a <<= 1;
        self.shift_b <<= 1;
    }

    /// Colour code (0..=3) of the next pixel.
    fn code(&self) -> u8 {
        ((self.shift_a >> 15) as u8) | (((self.shift_b >> 14) & 2) as u8)
    }
}

#[derive(Debug, Clone)]
pub struct SpriteEngine {
    sprites: [Sprite; 8],
    /// Comparator armed (SPRxDATA written, SPRxCTL not since).
    armed: u8,
    /// Sprites that were armed at some point during the current line.
    was_armed: u8,
    changes: [RegisterChangeQueue; 4],
    clip_begin: isize,
    clip_end: isize,
}

impl Default for SpriteEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SpriteEngine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sprites: [Sprite::default(); 8],
            armed: 0,
            was_armed: 0,
            changes: QUEUE_NAMES.map(RegisterChangeQueue::new),
            clip_begin: HPIXELS as isize,
            clip_end: HPIXELS as isize + 32,
        }
    }

    #[must_use]
    pub fn sprite(&self, x: usize) -> Option<&Sprite> {
        self.sprites.get(x)
    }

    #[must_use]
    pub fn armed(&self) -> u8 {
        self.armed
    }

    #[must_use]
    pub fn was_armed(&self) -> u8 {
        self.was_armed
    }

    pub(crate) fn queues(&self) -> &[RegisterChangeQueue; 4] {
        &self.changes
    }

    /// Record a sprite register write taking effect at `pixel`.
    ///
    /// # Errors
    ///
    /// [`DeniseError::QueueOverflow`] if the pair's queue is full.
    pub fn record(&mut self, pixel: isize, kind: RegisterChangeKind, value: u16) -> Result<(), DeniseError> {
        let x = match kind {
            RegisterChangeKind::SprData(x) => {
                self.was_armed |= 1 << x;
                x
            }
            RegisterChangeKind::SprPos(x)
            | RegisterChangeKind::SprCtl(x)
            | RegisterChangeKind::SprDatb(x) => x,
            other => return Err(self.changes[0].unexpected(other)),
        };
        self.changes[usize::from(x / 2) & 3].insert(pixel, kind, value)
    }

    /// Bitplane DMA has started at `pixel`; sprites may be drawn from there on.
    pub fn open_clip(&mut self, pixel: isize) {
        self.clip_begin = self.clip_begin.min(pixel);
    }

    /// Compose all sprites into the line, or only replay their register
    /// changes when the line is not displayed.
    ///
    /// # Errors
    ///
    /// [`DeniseError::UnexpectedChange`] for non-sprite changes in a queue.
    pub fn draw(
        &mut self,
        buffers: &mut LineBuffers,
        res: Resolution,
        visible: bool,
        mut collisions: Option<(&mut Collisions, bool, bool)>,
    ) -> Result<(), DeniseError> {
        if visible && self.was_armed != 0 {
            for pair in (0..4).rev() {
                if self.was_armed & (0b11 << (2 * pair)) != 0 {
                    let (strt1, strt2) = self.draw_pair(pair, buffers, res)?;
                    if let Some((clx, spr_spr, spr_plf)) = collisions.as_mut() {
                        check_collisions(clx, *spr_spr, *spr_plf, pair, strt1, strt2, buffers);
                    }
                }
            }
        }

        for pair in (0..4).rev() {
            if !self.changes[pair].is_empty() {
                self.replay(pair)?;
            }
        }
        Ok(())
    }

    /// Finish the line: remember which sprites are armed and close the clip
    /// window again.
    pub fn end_of_line(&mut self) {
        self.was_armed = self.armed;
        self.clip_begin = HPIXELS as isize;
        self.clip_end = HPIXELS as isize + 32;
    }

    fn draw_pair(
        &mut self,
        pair: usize,
        buffers: &mut LineBuffers,
        res: Resolution,
    ) -> Result<(isize, isize), DeniseError> {
        let (s1, s2) = (2 * pair, 2 * pair + 1);
        let mut strt1 = self.sprites[s1].start_pixel(res);
        let mut strt2 = self.sprites[s2].start_pixel(res);
        let mut from = 0;

        let replay: Vec<_> = self.changes[pair].drain().collect();
        for change in replay {
            self.draw_range(pair, from, change.pixel, strt1, strt2, res, buffers);
            from = change.pixel;

            let x = self.apply(pair, change.kind, change.value)?;
            match change.kind {
                RegisterChangeKind::SprData(_) => self.armed |= 1 << x,
                RegisterChangeKind::SprCtl(_) => self.armed &= !(1 << x),
                _ => {}
            }
            if x == s1 {
                strt1 = self.sprites[s1].start_pixel(res);
            } else {
                strt2 = self.sprites[s2].start_pixel(res);
            }
        }

        self.draw_range(pair, from, LINE_LEN as isize - 1, strt1, strt2, res, buffers);
        Ok((strt1, strt2))
    }

    fn replay(&mut self, pair: usize) -> Result<(), DeniseError> {
        let replay: Vec<_> = self.changes[pair].drain().collect();
        for change in replay {
            self.apply(pair, change.kind, change.value)?;
        }
        Ok(())
    }

    /// Write a recorded value into the sprite registers. Returns the sprite.
    fn apply(&mut self, pair: usize, kind: RegisterChangeKind, value: u16) -> Result<usize, DeniseError> {
        let (x, field) = match kind {
            RegisterChangeKind::SprPos(x) => (x, &mut self.sprites[usize::from(x) & 7].pos),
            RegisterChangeKind::SprCtl(x) => (x, &mut self.sprites[usize::from(x) & 7].ctl),
            RegisterChangeKind::SprData(x) => (x, &mut self.sprites[usize::from(x) & 7].data),
            RegisterChangeKind::SprDatb(x) => (x, &mut self.sprites[usize::from(x) & 7].datb),
            other => return Err(self.changes[pair].unexpected(other)),
        };
        if usize::from(x) / 2 != pair {
            return Err(self.changes[pair].unexpected(kind));
        }
        *field = value;
        Ok(usize::from(x))
    }

    fn draw_range(
        &mut self,
        pair: usize,
        hstrt: isize,
        hstop: isize,
        strt1: isize,
        strt2: isize,
        res: Resolution,
        buffers: &mut LineBuffers,
    ) {
        let (s1, s2) = (2 * pair, 2 * pair + 1);
        let armed1 = self.armed & (1 << s1) != 0;
        let armed2 = self.armed & (1 << s2) != 0;
        let attached = self.sprites[s2].attached();
        let step = if res == Resolution::Shres { 1 } else { 2 };

        let mut hpos = hstrt;
        while hpos < hstop {
            if hpos == strt1 && armed1 {
                self.sprites[s1].load();
            }
            if hpos == strt2 && armed2 {
                self.sprites[s2].load();
            }

            if self.sprites[s1].is_shifting() || self.sprites[s2].is_shifting() {
                if hpos >= self.clip_begin && hpos < self.clip_end {
                    if attached {
                        self.draw_attached_pixel(s2, hpos, buffers);
                    } else {
                        self.draw_pixel(s1, hpos, res, buffers);
                        self.draw_pixel(s2, hpos, res, buffers);
                    }
                }
                self.sprites[s1].shift();
                self.sprites[s2].shift();
            }
            hpos += step;
        }
    }

    fn draw_pixel(&self, x: usize, hpos: isize, res: Resolution, buffers: &mut LineBuffers) {
        let col = self.sprites[x].code();
        if col == 0 {
            return;
        }

        let z = Z_SP[x];
        let color = (16 + 2 * (x as u8 & 6)) | col;
        let width = if res == Resolution::Shres { 1 } else { 2 };

        for pixel in hpos..hpos + width {
            let Some(i) = index(pixel) else { continue };
            if z > buffers.depth[i] {
                buffers.multiplexed[i] = color;
            }
            buffers.depth[i] |= z;
        }
    }

    /// Attached pairs form one 15-colour sprite; `x` is the odd sprite.
    fn draw_attached_pixel(&self, x: usize, hpos: isize, buffers: &mut LineBuffers) {
        let col = self.sprites[x - 1].code() | (self.sprites[x].code() << 2);
        if col == 0 {
            return;
        }

        let z = Z_SP[x];
        for pixel in hpos..hpos + 2 {
            let Some(i) = index(pixel) else { continue };
            if z > buffers.depth[i] {
                buffers.multiplexed[i] = 0b1_0000 | col;
                buffers.depth[i] |= z;
            }
        }
    }
}

fn check_collisions(
    clx: &mut Collisions,
    spr_spr: bool,
    spr_plf: bool,
    pair: usize,
    strt1: isize,
    strt2: isize,
    buffers: &LineBuffers,
) {
    for (x, strt) in [(2 * pair, strt1), (2 * pair + 1, strt2)] {
        if spr_spr {
            clx.check_sprite_sprite(x, strt, strt + 31, &buffers.depth);
        }
        if spr_plf {
            clx.check_sprite_playfield(x, strt, strt + 31, &buffers.depth, &buffers.raw_bits);
        }
    }
}
