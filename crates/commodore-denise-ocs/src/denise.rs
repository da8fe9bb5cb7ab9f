//! The Denise chip: register interface and end-of-line pipeline.

use std::sync::Arc;

use crate::bitplane::{
    self, BitplaneShifter, Resolution, is_border_blank, is_ecs_enabled, is_ham, is_interlaced,
    is_irregular_bpu, pixel_offset_even, pixel_offset_odd,
};
use crate::border::Border;
use crate::buffers::LineBuffers;
use crate::collision::Collisions;
use crate::config::{DeniseConfig, MonitorConfig};
use crate::error::{ConfigError, DeniseError};
use crate::frame_buffer::FrameBufferRing;
use crate::pixel_engine::PixelEngine;
use crate::reg_change::{RegisterChangeKind, RegisterChangeQueue};
use crate::sprite::{Sprite, SpriteEngine};
use crate::translator::translate;

/// First buffer position covered by colour clock `hpos`.
#[must_use]
pub const fn pixel(hpos: u16) -> isize {
    4 * hpos as isize
}

#[derive(Debug)]
pub struct Denise {
    config: DeniseConfig,

    bplcon0: u16,
    bplcon1: u16,
    bplcon2: u16,
    bplcon3: u16,
    /// BPLCON0/BPLCON2 as they were when the current line started.
    initial_bplcon0: u16,
    initial_bplcon2: u16,
    res: Resolution,
    pixel_offset_odd: isize,
    pixel_offset_even: isize,

    diwstrt: u16,
    diwstop: u16,
    diwhigh: u16,

    vpos: u16,

    shifter: BitplaneShifter,
    sprites: SpriteEngine,
    collisions: Collisions,
    border: Border,
    con_changes: RegisterChangeQueue,
    pixel_engine: PixelEngine,
    buffers: LineBuffers,
}

impl Denise {
    /// # Errors
    ///
    /// Rejects invalid monitor settings and frame buffer counts.
    pub fn new(
        config: DeniseConfig,
        monitor: MonitorConfig,
        frame_buffers: usize,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            config,
            bplcon0: 0,
            bplcon1: 0,
            bplcon2: 0,
            bplcon3: 0,
            initial_bplcon0: 0,
            initial_bplcon2: 0,
            res: Resolution::Lores,
            pixel_offset_odd: 0,
            pixel_offset_even: 0,
            diwstrt: 0,
            diwstop: 0,
            diwhigh: 0,
            vpos: 0,
            shifter: BitplaneShifter::new(),
            sprites: SpriteEngine::new(),
            collisions: Collisions::new(),
            border: Border::new(),
            con_changes: RegisterChangeQueue::new("con"),
            pixel_engine: PixelEngine::new(monitor, frame_buffers)?,
            buffers: LineBuffers::new(),
        })
    }

    #[must_use]
    pub fn config(&self) -> &DeniseConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: DeniseConfig) {
        self.config = config;
        self.res = Resolution::from_bplcon0(self.bplcon0, self.is_ecs());
        self.update_border_color();
    }

    /// # Errors
    ///
    /// [`ConfigError::OutOfRange`] if a knob exceeds 100.
    pub fn set_monitor(&mut self, monitor: MonitorConfig) -> Result<(), ConfigError> {
        self.pixel_engine.set_monitor(monitor)
    }

    fn is_ecs(&self) -> bool {
        self.config.variant.is_ecs()
    }

    #[must_use]
    pub fn bplcon0(&self) -> u16 {
        self.bplcon0
    }

    #[must_use]
    pub fn bplcon1(&self) -> u16 {
        self.bplcon1
    }

    #[must_use]
    pub fn bplcon2(&self) -> u16 {
        self.bplcon2
    }

    #[must_use]
    pub fn bplcon3(&self) -> u16 {
        self.bplcon3
    }

    #[must_use]
    pub fn resolution(&self) -> Resolution {
        self.res
    }

    /// LACE bit of BPLCON0.
    #[must_use]
    pub fn is_interlaced(&self) -> bool {
        is_interlaced(self.bplcon0)
    }

    /// Line announced by the last [`Denise::begin_of_line`].
    #[must_use]
    pub fn vpos(&self) -> u16 {
        self.vpos
    }

    #[must_use]
    pub fn sprite(&self, x: usize) -> Option<&Sprite> {
        self.sprites.sprite(x)
    }

    /// Line buffers of the most recently composed line.
    #[must_use]
    pub fn buffers(&self) -> &LineBuffers {
        &self.buffers
    }

    #[must_use]
    pub fn pixel_engine(&self) -> &PixelEngine {
        &self.pixel_engine
    }

    #[must_use]
    pub fn frame_buffers(&self) -> Arc<FrameBufferRing> {
        self.pixel_engine.frame_buffers()
    }

    fn update_border_color(&mut self) {
        let blank =
            self.is_ecs() && is_ecs_enabled(self.bplcon0) && is_border_blank(self.bplcon3);
        self.border.set_blank(blank);
    }

    // -- Bitplane control --------------------------------------------------

    /// # Errors
    ///
    /// [`DeniseError::QueueOverflow`] if the line holds too many changes.
    pub fn poke_bplcon0(&mut self, hpos: u16, value: u16) -> Result<(), DeniseError> {
        let ecs = self.is_ecs();
        let shres = |v: u16| ecs && v & 0x0040 != 0;
        let pixel = (pixel(hpos) - 4).max(0);
        let old = self.bplcon0;

        self.con_changes.insert(pixel, RegisterChangeKind::Bplcon0, value)?;
        if is_ham(old) != is_ham(value) || shres(old) != shres(value) {
            let mode = if ecs { value } else { value & !0x0040 };
            self.pixel_engine.record_mode(pixel, mode)?;
        }

        self.bplcon0 = value;
        self.res = Resolution::from_bplcon0(value, ecs);
        self.update_border_color();

        if is_irregular_bpu(value, self.res) {
            log::warn!(
                "BPLCON0: irregular BPU value {} in {:?}",
                bitplane::raw_bpu(value),
                self.res
            );
        }
        Ok(())
    }

    pub fn poke_bplcon1(&mut self, value: u16) {
        self.bplcon1 = value & 0x00FF;
        self.pixel_offset_odd = pixel_offset_odd(self.bplcon1);
        self.pixel_offset_even = pixel_offset_even(self.bplcon1);
    }

    /// # Errors
    ///
    /// [`DeniseError::QueueOverflow`] if the line holds too many changes.
    pub fn poke_bplcon2(&mut self, hpos: u16, value: u16) -> Result<(), DeniseError> {
        let pf1p = value & 7;
        let pf2p = (value >> 3) & 7;
        if pf1p > 4 {
            log::warn!("BPLCON2: PF1P = {pf1p}");
        }
        if pf2p > 4 {
            log::warn!("BPLCON2: PF2P = {pf2p}");
        }

        self.bplcon2 = value;
        self.con_changes
            .insert(pixel(hpos) + 4, RegisterChangeKind::Bplcon2, value)
    }

    pub fn poke_bplcon3(&mut self, value: u16) {
        self.bplcon3 = value;
        self.update_border_color();
    }

    /// Write BPLxDAT (`plane` 0..=5). Writing BPL1DAT starts a new slice
    /// and opens the sprite clip window.
    pub fn poke_bpl_dat(&mut self, plane: usize, hpos: u16, value: u16) {
        if self.shifter.write(plane, value) {
            self.sprites.open_clip(pixel(hpos) + 4);
        }
    }

    pub fn draw_odd(&mut self, hpos: u16) {
        let bpu = bitplane::bpu(self.bplcon0, self.res);
        let start = pixel(hpos) + self.pixel_offset_odd + 2;
        self.shifter.draw_odd(&mut self.buffers.raw_bits, start, self.res, bpu);
    }

    pub fn draw_even(&mut self, hpos: u16) {
        let bpu = bitplane::bpu(self.bplcon0, self.res);
        let start = pixel(hpos) + self.pixel_offset_even + 2;
        self.shifter.draw_even(&mut self.buffers.raw_bits, start, self.res, bpu);
    }

    /// Shift out the slice loaded by the last BPL1DAT write.
    pub fn draw(&mut self, hpos: u16) {
        self.draw_odd(hpos);
        self.draw_even(hpos);
    }

    // -- Sprites -----------------------------------------------------------

    /// # Errors
    ///
    /// [`DeniseError::QueueOverflow`] if the pair's queue is full.
    pub fn poke_spr_pos(&mut self, x: u8, hpos: u16, value: u16) -> Result<(), DeniseError> {
        self.sprites
            .record(pixel(hpos) + 6, RegisterChangeKind::SprPos(x & 7), value)
    }

    /// Writing SPRxCTL disarms the sprite.
    ///
    /// # Errors
    ///
    /// [`DeniseError::QueueOverflow`] if the pair's queue is full.
    pub fn poke_spr_ctl(&mut self, x: u8, hpos: u16, value: u16) -> Result<(), DeniseError> {
        self.sprites
            .record(pixel(hpos) + 6, RegisterChangeKind::SprCtl(x & 7), value)
    }

    /// Writing SPRxDATA arms the sprite.
    ///
    /// # Errors
    ///
    /// [`DeniseError::QueueOverflow`] if the pair's queue is full.
    pub fn poke_spr_data(&mut self, x: u8, hpos: u16, value: u16) -> Result<(), DeniseError> {
        let value = self.sprite_data(x, value);
        self.sprites
            .record(pixel(hpos) + 4, RegisterChangeKind::SprData(x & 7), value)
    }

    /// # Errors
    ///
    /// [`DeniseError::QueueOverflow`] if the pair's queue is full.
    pub fn poke_spr_datb(&mut self, x: u8, hpos: u16, value: u16) -> Result<(), DeniseError> {
        let value = self.sprite_data(x, value);
        self.sprites
            .record(pixel(hpos) + 4, RegisterChangeKind::SprDatb(x & 7), value)
    }

    fn sprite_data(&self, x: u8, value: u16) -> u16 {
        if self.config.hidden_sprites & (1 << (x & 7)) != 0 {
            0
        } else {
            value
        }
    }

    // -- Colours and display window ----------------------------------------

    /// # Errors
    ///
    /// [`DeniseError::QueueOverflow`] if the line holds too many changes.
    pub fn poke_color(&mut self, reg: u8, hpos: u16, value: u16) -> Result<(), DeniseError> {
        self.pixel_engine.record_color(pixel(hpos), reg, value)
    }

    /// # Errors
    ///
    /// [`DeniseError::QueueOverflow`] if the line holds too many changes.
    pub fn poke_diwstrt(&mut self, hpos: u16, value: u16) -> Result<(), DeniseError> {
        self.diwstrt = value;
        self.border.record_start(pixel(hpos), value & 0x00FF)
    }

    /// # Errors
    ///
    /// [`DeniseError::QueueOverflow`] if the line holds too many changes.
    pub fn poke_diwstop(&mut self, hpos: u16, value: u16) -> Result<(), DeniseError> {
        self.diwstop = value;
        self.border.record_stop(pixel(hpos), (value & 0x00FF) | 0x0100)
    }

    /// ECS only: supplies the H8 bits of both window edges.
    ///
    /// # Errors
    ///
    /// [`DeniseError::QueueOverflow`] if the line holds too many changes.
    pub fn poke_diwhigh(&mut self, hpos: u16, value: u16) -> Result<(), DeniseError> {
        if !self.is_ecs() {
            return Ok(());
        }
        self.diwhigh = value;
        let h8 = |bit: u16| if value & (1 << bit) != 0 { 0x0100 } else { 0 };
        self.border
            .record_start(pixel(hpos), (self.diwstrt & 0x00FF) | h8(5))?;
        self.border
            .record_stop(pixel(hpos), (self.diwstop & 0x00FF) | h8(13))
    }

    #[must_use]
    pub fn diwhigh(&self) -> u16 {
        self.diwhigh
    }

    // -- Collisions --------------------------------------------------------

    pub fn poke_clxcon(&mut self, value: u16) {
        self.collisions.poke_clxcon(value);
    }

    pub fn peek_clxdat(&mut self) -> u16 {
        self.collisions.peek_clxdat()
    }

    #[must_use]
    pub fn spypeek_clxdat(&self) -> u16 {
        self.collisions.spypeek_clxdat()
    }

    /// DENISEID: 0xFFFC on ECS, open bus (0xFFFF) on OCS.
    #[must_use]
    pub fn peek_deniseid(&self) -> u16 {
        if self.is_ecs() { 0xFFFC } else { 0xFFFF }
    }

    // -- Line and frame lifecycle ------------------------------------------

    pub fn begin_of_frame(&mut self) {
        self.border.begin_of_frame();
    }

    pub fn begin_of_line(&mut self, vpos: u16) {
        self.vpos = vpos;
    }

    /// Compose line `vpos` and write it into the working frame buffer.
    /// Lines inside vertical blank only have their register changes applied.
    ///
    /// # Errors
    ///
    /// Any [`DeniseError`] means the line pipeline lost its invariants.
    pub fn end_of_line(&mut self, vpos: u16) -> Result<(), DeniseError> {
        self.border.fill(&mut self.buffers.border)?;

        if vpos >= self.config.vblank_lines {
            translate(
                &mut self.buffers,
                &mut self.con_changes,
                self.initial_bplcon0,
                self.initial_bplcon2,
                self.config.hidden_bitplanes,
            )?;

            let clx = (
                &mut self.collisions,
                self.config.clx_spr_spr,
                self.config.clx_spr_plf,
            );
            self.sprites
                .draw(&mut self.buffers, self.res, true, Some(clx))?;

            if self.config.clx_plf_plf {
                self.collisions
                    .check_playfield_playfield(&self.buffers.raw_bits);
            }

            self.pixel_engine.colorize(&self.buffers)?;
            if self.config.hidden_layers != 0 {
                self.pixel_engine.hide(
                    usize::from(vpos),
                    &self.buffers,
                    self.config.hidden_layers,
                    self.config.hidden_layer_alpha,
                );
            }
            self.pixel_engine.commit_line(usize::from(vpos));
        } else {
            self.sprites.draw(&mut self.buffers, self.res, false, None)?;
            self.pixel_engine.replay()?;
            self.con_changes.clear();
        }

        self.con_changes.expect_drained()?;
        self.pixel_engine.queue().expect_drained()?;
        self.border.queue().expect_drained()?;
        for queue in self.sprites.queues() {
            queue.expect_drained()?;
        }

        self.buffers.clear_raw_bits();
        self.sprites.end_of_line();
        self.initial_bplcon0 = self.bplcon0;
        self.initial_bplcon2 = self.bplcon2;
        Ok(())
    }

    /// Hand the finished frame over to the display side.
    pub fn end_of_frame(&mut self, frame: i64, lof: bool) {
        self.pixel_engine.end_of_frame(frame, lof);
    }
}
