//! Colour registers, palette lookup and frame buffer output.
//!
//! At the end of each displayed line the engine turns the multiplexed
//! colour indices into ARGB pixels, replaying COLORxx writes and colour
//! mode switches at the pixels they happened. The finished row is copied
//! into the working buffer of the frame buffer ring.

use std::sync::Arc;

use crate::bitplane::is_ham;
use crate::buffers::{HPIXELS, LineBuffers, NO_BORDER};
use crate::color::{AmigaColor, argb, color_space};
use crate::config::MonitorConfig;
use crate::depth::{is_sprite_pixel, is_sprite_pixel_of, upper_playfield};
use crate::error::{ConfigError, DeniseError};
use crate::frame_buffer::{FB_WIDTH, FrameBufferRing};
use crate::reg_change::{RegisterChangeKind, RegisterChangeQueue};

/// 32 registers, 32 half-brite shades, black and three debug colours.
pub const PALETTE_LEN: usize = 68;
pub const DEBUG_COLORS: [u32; 3] = [argb(0xD0, 0, 0), argb(0xA0, 0, 0), argb(0x90, 0, 0)];

#[derive(Debug)]
pub struct PixelEngine {
    monitor: MonitorConfig,
    color_space: Vec<u32>,
    color: [AmigaColor; 32],
    palette: [u32; PALETTE_LEN],
    ham_mode: bool,
    shres_mode: bool,
    changes: RegisterChangeQueue,
    row: Vec<u32>,
    frames: Arc<FrameBufferRing>,
}

impl PixelEngine {
    /// # Errors
    ///
    /// Rejects invalid monitor settings and rings with fewer than two
    /// buffers.
    pub fn new(monitor: MonitorConfig, frame_buffers: usize) -> Result<Self, ConfigError> {
        monitor.validate()?;
        let mut engine = Self {
            monitor,
            color_space: Vec::new(),
            color: [AmigaColor::default(); 32],
            palette: [0; PALETTE_LEN],
            ham_mode: false,
            shres_mode: false,
            changes: RegisterChangeQueue::new("color"),
            row: vec![0; FB_WIDTH],
            frames: Arc::new(FrameBufferRing::new(frame_buffers)?),
        };
        engine.update_rgba();
        Ok(engine)
    }

    #[must_use]
    pub fn monitor(&self) -> &MonitorConfig {
        &self.monitor
    }

    /// # Errors
    ///
    /// [`ConfigError::OutOfRange`] if a knob exceeds 100.
    pub fn set_monitor(&mut self, monitor: MonitorConfig) -> Result<(), ConfigError> {
        monitor.validate()?;
        self.monitor = monitor;
        self.update_rgba();
        Ok(())
    }

    #[must_use]
    pub fn frame_buffers(&self) -> Arc<FrameBufferRing> {
        Arc::clone(&self.frames)
    }

    #[must_use]
    pub fn color(&self, reg: usize) -> Option<AmigaColor> {
        self.color.get(reg).copied()
    }

    #[must_use]
    pub fn palette(&self) -> &[u32; PALETTE_LEN] {
        &self.palette
    }

    #[must_use]
    pub fn row(&self) -> &[u32] {
        &self.row
    }

    pub(crate) fn queue(&self) -> &RegisterChangeQueue {
        &self.changes
    }

    /// Rebuild the colour space and every cached palette entry.
    fn update_rgba(&mut self) {
        self.color_space = color_space(&self.monitor);
        self.palette[64] = argb(0, 0, 0);
        self.palette[65..].copy_from_slice(&DEBUG_COLORS);
        for reg in 0..32 {
            self.set_color(reg, self.color[reg].raw());
        }
    }

    fn lookup(&self, color: AmigaColor) -> u32 {
        self.color_space[usize::from(color.raw())]
    }

    fn set_color(&mut self, reg: usize, value: u16) {
        let color = AmigaColor::from_raw(value);
        self.color[reg] = color;
        self.palette[reg] = self.lookup(color);
        self.palette[reg + 32] = self.lookup(color.ehb());
    }

    /// Record a COLORxx write taking effect at `pixel`.
    ///
    /// # Errors
    ///
    /// [`DeniseError::QueueOverflow`] if the line is full.
    pub fn record_color(&mut self, pixel: isize, reg: u8, value: u16) -> Result<(), DeniseError> {
        self.changes
            .insert(pixel, RegisterChangeKind::Color(reg & 0x1F), value & 0x0FFF)
    }

    /// Record a HAM/SHRES switch. `bplcon0` must already have SHRES masked
    /// out on chips that lack it.
    ///
    /// # Errors
    ///
    /// [`DeniseError::QueueOverflow`] if the line is full.
    pub fn record_mode(&mut self, pixel: isize, bplcon0: u16) -> Result<(), DeniseError> {
        self.changes.insert(pixel, RegisterChangeKind::ColorMode, bplcon0)
    }

    fn apply(&mut self, kind: RegisterChangeKind, value: u16) -> Result<(), DeniseError> {
        match kind {
            RegisterChangeKind::Color(reg) => self.set_color(usize::from(reg & 0x1F), value),
            RegisterChangeKind::ColorMode => {
                self.ham_mode = is_ham(value);
                self.shres_mode = value & 0x0040 != 0;
            }
            RegisterChangeKind::None => {}
            other => return Err(self.changes.unexpected(other)),
        }
        Ok(())
    }

    /// Apply all recorded changes without drawing (lines in vertical blank).
    ///
    /// # Errors
    ///
    /// [`DeniseError::UnexpectedChange`] for foreign entries.
    pub fn replay(&mut self) -> Result<(), DeniseError> {
        let replay: Vec<_> = self.changes.drain().collect();
        for change in replay {
            self.apply(change.kind, change.value)?;
        }
        Ok(())
    }

    /// Turn the line into ARGB pixels in the scratch row.
    ///
    /// # Errors
    ///
    /// [`DeniseError::UnexpectedChange`] for foreign entries.
    pub fn colorize(&mut self, line: &LineBuffers) -> Result<(), DeniseError> {
        let mut hold = self.color[0];
        let mut from = 0usize;

        self.changes.terminate(HPIXELS as isize);
        let replay: Vec<_> = self.changes.drain().collect();

        for change in replay {
            let to = usize::try_from(change.pixel).unwrap_or(0).clamp(from, HPIXELS);
            if self.shres_mode {
                self.colorize_shres(line, from, to);
            } else if self.ham_mode {
                self.colorize_ham(line, from, to, &mut hold);
            } else {
                self.colorize_normal(line, from, to);
            }
            from = to;
            self.apply(change.kind, change.value)?;
        }
        Ok(())
    }

    fn put(&mut self, i: usize, left: u32, right: u32) {
        self.row[2 * i] = left;
        self.row[2 * i + 1] = right;
    }

    fn colorize_normal(&mut self, line: &LineBuffers, from: usize, to: usize) {
        for i in from..to {
            let b = line.border[i];
            let index = if b == NO_BORDER { line.multiplexed[i] } else { b };
            let texel = self.palette[usize::from(index)];
            self.put(i, texel, texel);
        }
    }

    fn colorize_shres(&mut self, line: &LineBuffers, from: usize, to: usize) {
        for i in from..to {
            let m = line.multiplexed[i];
            let b = line.border[i];
            if b != NO_BORDER {
                let texel = self.palette[usize::from(b)];
                self.put(i, texel, texel);
            } else if is_sprite_pixel(line.depth[i]) {
                let texel = self.palette[usize::from(m)];
                self.put(i, texel, texel);
            } else {
                let left = self.palette[usize::from(m >> 2)];
                let right = self.palette[usize::from(m & 3)];
                self.put(i, left, right);
            }
        }
    }

    fn colorize_ham(&mut self, line: &LineBuffers, from: usize, to: usize, hold: &mut AmigaColor) {
        for i in from..to {
            let b = line.border[i];
            if b != NO_BORDER {
                let texel = self.palette[usize::from(b)];
                self.put(i, texel, texel);
                continue;
            }

            let index = line.color_index[i];
            let value = index & 0x0F;
            match (line.raw_bits[i] >> 4) & 0b11 {
                0b00 => *hold = self.color[usize::from(index & 0x1F)],
                0b01 => hold.b = value,
                0b10 => hold.r = value,
                _ => hold.g = value,
            }

            let texel = if is_sprite_pixel(line.depth[i]) {
                self.palette[usize::from(line.multiplexed[i])]
            } else {
                self.lookup(*hold)
            };
            self.put(i, texel, texel);
        }
    }

    /// Blend hidden layers of the scratch row towards a checkerboard.
    pub fn hide(&mut self, vpos: usize, line: &LineBuffers, layers: u16, alpha: u8) {
        let scale = f64::from(alpha) / 255.0;

        for i in 0..HPIXELS {
            let z = line.depth[i];
            let hidden = if is_sprite_pixel(z) {
                (0..8).any(|nr| is_sprite_pixel_of(z, nr) && layers & (1 << nr) != 0)
            } else {
                match upper_playfield(z, line.multiplexed[i]) {
                    1 => layers & 0x100 != 0,
                    _ => layers & 0x200 != 0,
                }
            };
            if !hidden {
                continue;
            }

            let bg = if (vpos / 4) % 2 == (i / 8) % 2 { 0x22 } else { 0x44 };
            let blend = |c: u32| {
                let c = f64::from(c & 0xFF);
                (c * (1.0 - scale) + f64::from(bg) * scale) as u32
            };
            for texel in &mut self.row[2 * i..2 * i + 2] {
                let p = *texel;
                *texel = 0xFF00_0000
                    | blend(p >> 16) << 16
                    | blend(p >> 8) << 8
                    | blend(p);
            }
        }
    }

    /// Copy the scratch row into the working frame buffer.
    pub fn commit_line(&self, vpos: usize) {
        self.frames.write_line(vpos, &self.row);
    }

    pub fn end_of_frame(&self, frame: i64, lof: bool) {
        self.frames.swap(frame, lof);
    }
}
