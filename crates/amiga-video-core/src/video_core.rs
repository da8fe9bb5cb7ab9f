//! The raster loop: Agnus' scheduler clocks Denise line by line.

use std::sync::Arc;

use commodore_agnus_ocs::{
    BeamMap, CCKS_PER_LINE, Event, EventHandler, EventId, PrimarySlot, Scheduler, SecondarySlot,
    TICKS_PER_CCK,
};
use commodore_denise_ocs::{Denise, FrameBufferRing};

use crate::config::CoreConfig;
use crate::error::CoreError;
use crate::registers::{read_denise_register, write_denise_register};

/// Column of the raster event: the last colour clock of every line.
pub const RAS_HPOS: u16 = CCKS_PER_LINE - 1;

/// Mutable view of the chips handed to collaborators while they service
/// an event.
pub struct Chips<'a> {
    pub scheduler: &'a mut Scheduler,
    pub denise: &'a mut Denise,
}

/// The rest of the emulator: CPU, DMA sequencing, blitter, CIAs, Paula.
///
/// Every slot except the raster slot is forwarded here. A collaborator that
/// leaves its slot untouched is serviced again on the next colour clock.
pub trait Collaborators {
    fn service_event(
        &mut self,
        slot: PrimarySlot,
        event: Event,
        chips: &mut Chips<'_>,
    ) -> Result<(), CoreError>;

    fn service_secondary_event(
        &mut self,
        slot: SecondarySlot,
        event: Event,
        chips: &mut Chips<'_>,
    ) -> Result<(), CoreError> {
        let _ = event;
        chips.scheduler.cancel_sec(slot);
        Ok(())
    }

    /// INTREQ write from an interrupt slot (bit 15 selects set or clear).
    fn write_intreq(&mut self, value: u16);
}

/// Long frame flag and the like, owned by the raster handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RasterState {
    lof: bool,
    frames: u64,
}

impl RasterState {
    const fn new() -> Self {
        Self {
            lof: true,
            frames: 0,
        }
    }
}

#[derive(Debug)]
pub struct VideoCore {
    config: CoreConfig,
    scheduler: Scheduler,
    denise: Denise,
    raster: RasterState,
    /// Next master cycle to execute.
    cycle: i64,
    halted: bool,
}

impl VideoCore {
    /// # Errors
    ///
    /// [`CoreError::Config`] for invalid monitor settings or too few frame
    /// buffers.
    pub fn new(config: CoreConfig) -> Result<Self, CoreError> {
        let mut core = Self {
            config,
            scheduler: Scheduler::new(BeamMap::for_region(config.region)),
            denise: Denise::new(config.denise, config.monitor, config.frame_buffers)?,
            raster: RasterState::new(),
            cycle: 0,
            halted: false,
        };
        core.init_schedule()?;
        Ok(core)
    }

    fn init_schedule(&mut self) -> Result<(), CoreError> {
        self.scheduler
            .schedule_pos(PrimarySlot::Ras, 0, RAS_HPOS, EventId::RasHsync)?;
        self.scheduler
            .schedule_sec_abs(SecondarySlot::IrqVertb, 0, EventId::IrqSet)?;
        self.denise.begin_of_frame();
        self.denise.begin_of_line(0);
        Ok(())
    }

    /// Bring the core back to cycle 0 and clear the halted latch.
    ///
    /// Denise is rebuilt with a fresh frame buffer ring; holders of the old
    /// ring must fetch [`VideoCore::frame_buffers`] again.
    ///
    /// # Errors
    ///
    /// [`CoreError::Config`] if the stored configuration no longer builds.
    pub fn reset(&mut self) -> Result<(), CoreError> {
        self.scheduler.reset();
        self.denise = Denise::new(
            self.config.denise,
            self.config.monitor,
            self.config.frame_buffers,
        )?;
        self.raster = RasterState::new();
        self.cycle = 0;
        self.halted = false;
        self.init_schedule()?;
        log::info!("video core reset");
        Ok(())
    }

    #[must_use]
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    #[must_use]
    pub fn denise(&self) -> &Denise {
        &self.denise
    }

    pub fn denise_mut(&mut self) -> &mut Denise {
        &mut self.denise
    }

    #[must_use]
    pub fn frame_buffers(&self) -> Arc<FrameBufferRing> {
        self.denise.frame_buffers()
    }

    /// Next master cycle [`VideoCore::run_until`] will execute.
    #[must_use]
    pub fn cycle(&self) -> i64 {
        self.cycle
    }

    /// Whether the frame being drawn is a long frame.
    #[must_use]
    pub fn lof(&self) -> bool {
        self.raster.lof
    }

    /// Frames completed since the last reset.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.raster.frames
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Run every colour clock up to and including `cycle`.
    ///
    /// # Errors
    ///
    /// [`CoreError::Halted`] if an earlier error stopped the core. Any other
    /// error halts the core and is returned once.
    pub fn run_until<C: Collaborators>(
        &mut self,
        cycle: i64,
        collaborators: &mut C,
    ) -> Result<(), CoreError> {
        if self.halted {
            return Err(CoreError::Halted);
        }

        let mut dispatch = Dispatch {
            denise: &mut self.denise,
            collaborators,
            raster: &mut self.raster,
        };

        while self.cycle <= cycle {
            if let Err(err) = self.scheduler.advance_to(self.cycle, &mut dispatch) {
                log::error!("halting at cycle {} ({}): {err}", self.cycle, self.scheduler.beam());
                self.scheduler.dump();
                self.halted = true;
                return Err(err);
            }
            self.cycle += TICKS_PER_CCK;
        }
        Ok(())
    }

    /// Run to the end of the current frame.
    ///
    /// # Errors
    ///
    /// See [`VideoCore::run_until`].
    pub fn run_frame<C: Collaborators>(&mut self, collaborators: &mut C) -> Result<(), CoreError> {
        let end = self.scheduler.map().start_of_next_frame(self.cycle) - 1;
        self.run_until(end, collaborators)
    }

    /// CPU or Copper write to a custom chip register at the current beam
    /// position.
    ///
    /// # Errors
    ///
    /// [`CoreError::Halted`] after a fatal error. A Denise error halts the
    /// core.
    pub fn poke_custom(&mut self, offset: u16, value: u16) -> Result<(), CoreError> {
        if self.halted {
            return Err(CoreError::Halted);
        }

        let hpos = self.scheduler.beam().hpos;
        match write_denise_register(&mut self.denise, hpos, offset, value) {
            Ok(true) => Ok(()),
            Ok(false) => {
                log::debug!("custom write ${offset:03X} = ${value:04X} not decoded");
                Ok(())
            }
            Err(err) => {
                log::error!("halting on write ${offset:03X} = ${value:04X}: {err}");
                self.halted = true;
                Err(err.into())
            }
        }
    }

    /// Custom chip read. Registers Denise does not drive read as open bus.
    pub fn peek_custom(&mut self, offset: u16) -> u16 {
        read_denise_register(&mut self.denise, offset).unwrap_or_else(|| {
            log::debug!("custom read ${offset:03X} not decoded");
            0xFFFF
        })
    }
}

struct Dispatch<'a, C> {
    denise: &'a mut Denise,
    collaborators: &'a mut C,
    raster: &'a mut RasterState,
}

impl<C: Collaborators> Dispatch<'_, C> {
    fn service_raster(&mut self, scheduler: &mut Scheduler) -> Result<(), CoreError> {
        let map = *scheduler.map();
        let beam = scheduler.beam();

        self.denise.end_of_line(beam.vpos)?;

        let next_vpos = if beam.vpos + 1 == map.lines_per_frame() {
            self.denise.end_of_frame(beam.frame, self.raster.lof);
            self.raster.frames += 1;
            self.raster.lof = !self.denise.is_interlaced() || !self.raster.lof;
            self.denise.begin_of_frame();

            let start = map.start_of_next_frame(scheduler.clock());
            scheduler.schedule_sec_abs(SecondarySlot::IrqVertb, start, EventId::IrqSet)?;
            0
        } else {
            beam.vpos + 1
        };

        self.denise.begin_of_line(next_vpos);
        // Line 0 lies behind the beam and wraps into the next frame
        scheduler.reschedule_pos(PrimarySlot::Ras, next_vpos, RAS_HPOS)?;
        Ok(())
    }
}

impl<C: Collaborators> EventHandler for Dispatch<'_, C> {
    type Error = CoreError;

    fn service_event(
        &mut self,
        scheduler: &mut Scheduler,
        slot: PrimarySlot,
        event: Event,
    ) -> Result<(), CoreError> {
        if slot == PrimarySlot::Ras {
            return self.service_raster(scheduler);
        }
        let mut chips = Chips {
            scheduler,
            denise: &mut *self.denise,
        };
        self.collaborators.service_event(slot, event, &mut chips)
    }

    fn service_secondary_event(
        &mut self,
        scheduler: &mut Scheduler,
        slot: SecondarySlot,
        event: Event,
    ) -> Result<(), CoreError> {
        let mut chips = Chips {
            scheduler,
            denise: &mut *self.denise,
        };
        self.collaborators
            .service_secondary_event(slot, event, &mut chips)
    }

    fn write_intreq(&mut self, value: u16) {
        self.collaborators.write_intreq(value);
    }
}
