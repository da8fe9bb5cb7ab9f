//! Two-tier event scheduler.
//!
//! The primary table is scanned whenever the clock reaches `next_trigger`.
//! Rare events live in the secondary table, whose earliest trigger is
//! mirrored into the primary [`PrimarySlot::Sec`] slot so that the secondary
//! table is only scanned when something in it is actually due.

use crate::beam::{Beam, BeamMap};
use crate::error::SchedulerError;
use crate::event::{CIA_CYCLE, Event, EventId, NEVER, PrimarySlot, SecondarySlot, TriggerBeam};

/// Service routines for due events.
///
/// The scheduler calls back into the owner of the chips. Handlers receive the
/// scheduler itself so that they can reschedule or cancel the slot they are
/// servicing. A handler that leaves its slot untouched is serviced again on
/// the next call to [`Scheduler::advance_to`].
pub trait EventHandler {
    type Error: From<SchedulerError>;

    fn service_event(
        &mut self,
        scheduler: &mut Scheduler,
        slot: PrimarySlot,
        event: Event,
    ) -> Result<(), Self::Error>;

    /// Non-interrupt secondary slots. Interrupt slots are serviced by the
    /// scheduler itself through [`EventHandler::write_intreq`].
    fn service_secondary_event(
        &mut self,
        scheduler: &mut Scheduler,
        slot: SecondarySlot,
        event: Event,
    ) -> Result<(), Self::Error> {
        let _ = event;
        scheduler.cancel_sec(slot);
        Ok(())
    }

    /// Receives an INTREQ write (bit 15 selects set or clear).
    fn write_intreq(&mut self, value: u16);
}

/// Snapshot of one slot for debuggers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSlotInfo {
    pub slot_name: &'static str,
    pub event_name: String,
    pub trigger: i64,
    pub trigger_rel: i64,
    pub current_frame: bool,
    pub vpos: u16,
    pub hpos: u16,
}

#[derive(Debug)]
pub struct Scheduler {
    map: BeamMap,
    clock: i64,
    primary: [Event; PrimarySlot::COUNT],
    secondary: [Event; SecondarySlot::COUNT],
    next_trigger: i64,
    next_sec_trigger: i64,
    // Bit n enables trace output for primary slot n
    trace: u16,
}

impl Scheduler {
    #[must_use]
    pub fn new(map: BeamMap) -> Self {
        Self {
            map,
            clock: 0,
            primary: [Event::EMPTY; PrimarySlot::COUNT],
            secondary: [Event::EMPTY; SecondarySlot::COUNT],
            next_trigger: NEVER,
            next_sec_trigger: NEVER,
            trace: 0,
        }
    }

    /// Wipe both tables and rewind the clock.
    pub fn reset(&mut self) {
        self.clock = 0;
        self.primary = [Event::EMPTY; PrimarySlot::COUNT];
        self.secondary = [Event::EMPTY; SecondarySlot::COUNT];
        self.next_trigger = NEVER;
        self.next_sec_trigger = NEVER;
    }

    #[must_use]
    pub fn map(&self) -> &BeamMap {
        &self.map
    }

    #[must_use]
    pub fn clock(&self) -> i64 {
        self.clock
    }

    /// Beam position of the current clock.
    #[must_use]
    pub fn beam(&self) -> Beam {
        self.map.cycle_to_beam(self.clock)
    }

    #[must_use]
    pub fn next_trigger(&self) -> i64 {
        self.next_trigger
    }

    #[must_use]
    pub fn next_sec_trigger(&self) -> i64 {
        self.next_sec_trigger
    }

    pub fn set_trace(&mut self, mask: u16) {
        self.trace = mask;
    }

    #[must_use]
    pub fn event(&self, slot: PrimarySlot) -> &Event {
        &self.primary[slot.index()]
    }

    #[must_use]
    pub fn sec_event(&self, slot: SecondarySlot) -> &Event {
        &self.secondary[slot.index()]
    }

    #[must_use]
    pub fn has_event(&self, slot: PrimarySlot) -> bool {
        self.event(slot).id != EventId::None
    }

    #[must_use]
    pub fn is_pending(&self, slot: PrimarySlot) -> bool {
        self.event(slot).is_pending()
    }

    #[must_use]
    pub fn is_due(&self, slot: PrimarySlot, cycle: i64) -> bool {
        self.event(slot).is_due(cycle)
    }

    #[must_use]
    pub fn has_sec_event(&self, slot: SecondarySlot) -> bool {
        self.sec_event(slot).id != EventId::None
    }

    #[must_use]
    pub fn is_sec_pending(&self, slot: SecondarySlot) -> bool {
        self.sec_event(slot).is_pending()
    }

    //
    // Primary table
    //

    pub fn schedule_abs(
        &mut self,
        slot: PrimarySlot,
        cycle: i64,
        id: EventId,
    ) -> Result<(), SchedulerError> {
        self.schedule_abs_with(slot, cycle, id, 0)
    }

    /// Like [`Scheduler::schedule_abs`], handing `data` to the service routine.
    pub fn schedule_abs_with(
        &mut self,
        slot: PrimarySlot,
        cycle: i64,
        id: EventId,
        data: i64,
    ) -> Result<(), SchedulerError> {
        Self::check_primary(slot, cycle, id)?;
        self.commit_primary(
            slot,
            Event {
                trigger: cycle,
                trigger_beam: None,
                id,
                data,
            },
        );
        Ok(())
    }

    pub fn schedule_rel(
        &mut self,
        slot: PrimarySlot,
        delta: i64,
        id: EventId,
    ) -> Result<(), SchedulerError> {
        self.schedule_abs(slot, self.clock.saturating_add(delta), id)
    }

    /// Schedule an event at a beam position. Positions behind the beam
    /// refer to the next frame.
    pub fn schedule_pos(
        &mut self,
        slot: PrimarySlot,
        vpos: u16,
        hpos: u16,
        id: EventId,
    ) -> Result<(), SchedulerError> {
        let cycle = self.pos_to_cycle(vpos, hpos)?;
        Self::check_primary(slot, cycle, id)?;
        self.commit_primary(
            slot,
            Event {
                trigger: cycle,
                trigger_beam: Some(TriggerBeam { vpos, hpos }),
                id,
                data: 0,
            },
        );
        Ok(())
    }

    /// Move the event in `slot` to `cycle`, keeping its id and payload.
    pub fn reschedule_abs(&mut self, slot: PrimarySlot, cycle: i64) -> Result<(), SchedulerError> {
        let event = self.primary[slot.index()];
        Self::check_primary(slot, cycle, event.id)?;
        self.commit_primary(
            slot,
            Event {
                trigger: cycle,
                trigger_beam: None,
                ..event
            },
        );
        Ok(())
    }

    /// Move the event in `slot` to a beam position, keeping its id and
    /// payload. The position is verified when the event fires.
    pub fn reschedule_pos(
        &mut self,
        slot: PrimarySlot,
        vpos: u16,
        hpos: u16,
    ) -> Result<(), SchedulerError> {
        let event = self.primary[slot.index()];
        let cycle = self.pos_to_cycle(vpos, hpos)?;
        Self::check_primary(slot, cycle, event.id)?;
        self.commit_primary(
            slot,
            Event {
                trigger: cycle,
                trigger_beam: Some(TriggerBeam { vpos, hpos }),
                ..event
            },
        );
        Ok(())
    }

    pub fn reschedule_rel(&mut self, slot: PrimarySlot, delta: i64) -> Result<(), SchedulerError> {
        self.reschedule_abs(slot, self.clock.saturating_add(delta))
    }

    /// Reschedule relative to the clock and replace the event id.
    pub fn reschedule_rel_with(
        &mut self,
        slot: PrimarySlot,
        delta: i64,
        id: EventId,
    ) -> Result<(), SchedulerError> {
        let data = self.primary[slot.index()].data;
        self.schedule_abs_with(slot, self.clock.saturating_add(delta), id, data)
    }

    /// Keep the event in the slot but never fire it.
    pub fn disable(&mut self, slot: PrimarySlot) {
        let event = &mut self.primary[slot.index()];
        event.trigger = NEVER;
        event.trigger_beam = None;
    }

    pub fn cancel(&mut self, slot: PrimarySlot) {
        self.primary[slot.index()] = Event::EMPTY;
    }

    fn commit_primary(&mut self, slot: PrimarySlot, event: Event) {
        self.primary[slot.index()] = event;
        if event.trigger < self.next_trigger {
            self.next_trigger = event.trigger;
        }
    }

    fn check_primary(slot: PrimarySlot, cycle: i64, id: EventId) -> Result<(), SchedulerError> {
        let name = slot.name();

        if cycle < 0 {
            return Err(SchedulerError::NegativeTrigger { slot: name, cycle });
        }
        if id == EventId::None {
            return Err(SchedulerError::MissingEventId { slot: name });
        }
        if !slot.accepts(id) {
            return Err(SchedulerError::InvalidEventId {
                slot: name,
                id: id.name(),
            });
        }
        if slot.is_cia() && cycle != NEVER && cycle % CIA_CYCLE != 0 {
            return Err(SchedulerError::MisalignedCiaTrigger { slot: name, cycle });
        }
        Ok(())
    }

    //
    // Secondary table
    //

    pub fn schedule_sec_abs(
        &mut self,
        slot: SecondarySlot,
        cycle: i64,
        id: EventId,
    ) -> Result<(), SchedulerError> {
        Self::check_secondary(slot, cycle, id)?;
        self.commit_secondary(
            slot,
            Event {
                trigger: cycle,
                trigger_beam: None,
                id,
                data: 0,
            },
        )
    }

    pub fn schedule_sec_rel(
        &mut self,
        slot: SecondarySlot,
        delta: i64,
        id: EventId,
    ) -> Result<(), SchedulerError> {
        self.schedule_sec_abs(slot, self.clock.saturating_add(delta), id)
    }

    pub fn schedule_sec_pos(
        &mut self,
        slot: SecondarySlot,
        vpos: u16,
        hpos: u16,
        id: EventId,
    ) -> Result<(), SchedulerError> {
        let cycle = self.pos_to_cycle(vpos, hpos)?;
        Self::check_secondary(slot, cycle, id)?;
        self.commit_secondary(
            slot,
            Event {
                trigger: cycle,
                trigger_beam: Some(TriggerBeam { vpos, hpos }),
                id,
                data: 0,
            },
        )
    }

    pub fn reschedule_sec_abs(
        &mut self,
        slot: SecondarySlot,
        cycle: i64,
    ) -> Result<(), SchedulerError> {
        let event = self.secondary[slot.index()];
        Self::check_secondary(slot, cycle, event.id)?;
        self.commit_secondary(
            slot,
            Event {
                trigger: cycle,
                trigger_beam: None,
                ..event
            },
        )
    }

    pub fn reschedule_sec_rel(
        &mut self,
        slot: SecondarySlot,
        delta: i64,
    ) -> Result<(), SchedulerError> {
        self.reschedule_sec_abs(slot, self.clock.saturating_add(delta))
    }

    pub fn disable_sec(&mut self, slot: SecondarySlot) {
        let event = &mut self.secondary[slot.index()];
        event.trigger = NEVER;
        event.trigger_beam = None;
    }

    pub fn cancel_sec(&mut self, slot: SecondarySlot) {
        self.secondary[slot.index()] = Event::EMPTY;
    }

    fn commit_secondary(&mut self, slot: SecondarySlot, event: Event) -> Result<(), SchedulerError> {
        self.secondary[slot.index()] = event;
        if event.trigger < self.next_sec_trigger {
            self.next_sec_trigger = event.trigger;
        }

        // Mirror the earliest secondary trigger into the primary table
        self.schedule_abs(PrimarySlot::Sec, self.next_sec_trigger, EventId::SecTrigger)
    }

    fn check_secondary(slot: SecondarySlot, cycle: i64, id: EventId) -> Result<(), SchedulerError> {
        let name = slot.name();

        if cycle < 0 {
            return Err(SchedulerError::NegativeTrigger { slot: name, cycle });
        }
        if id == EventId::None {
            return Err(SchedulerError::MissingEventId { slot: name });
        }
        if !slot.accepts(id) {
            return Err(SchedulerError::InvalidEventId {
                slot: name,
                id: id.name(),
            });
        }
        Ok(())
    }

    /// Cycle of the next time the beam reaches `vpos`/`hpos`. The current
    /// colour clock still counts as this frame.
    fn pos_to_cycle(&self, vpos: u16, hpos: u16) -> Result<i64, SchedulerError> {
        if !self.map.is_valid(vpos, hpos) {
            return Err(SchedulerError::InvalidBeamPosition { vpos, hpos });
        }
        let now = self.beam();
        let frame = if (vpos, hpos) < (now.vpos, now.hpos) {
            now.frame + 1
        } else {
            now.frame
        };
        Ok(self.map.beam_to_cycle(Beam::new(frame, vpos, hpos)))
    }

    //
    // Execution
    //

    /// Service every event that is due at or before `cycle`.
    ///
    /// Primary slots are serviced in declaration order. Afterwards
    /// `next_trigger` holds the earliest trigger over the whole table.
    pub fn advance_to<H: EventHandler>(
        &mut self,
        cycle: i64,
        handler: &mut H,
    ) -> Result<(), H::Error> {
        self.clock = cycle;

        if cycle < self.next_trigger {
            return Ok(());
        }

        for slot in PrimarySlot::ALL {
            let event = self.primary[slot.index()];
            if !event.is_due(cycle) {
                continue;
            }
            self.check_triggered(slot.name(), &event, cycle)?;

            if self.trace & (1 << slot.index()) != 0 {
                log::trace!("{slot}: {} at {cycle} ({})", event.id, self.beam());
            }

            if slot == PrimarySlot::Sec {
                self.execute_secondary(cycle, handler)?;
            } else {
                handler.service_event(self, slot, event)?;
            }
        }

        self.next_trigger = self
            .primary
            .iter()
            .map(|event| event.trigger)
            .min()
            .unwrap_or(NEVER);

        Ok(())
    }

    fn execute_secondary<H: EventHandler>(
        &mut self,
        cycle: i64,
        handler: &mut H,
    ) -> Result<(), H::Error> {
        for slot in SecondarySlot::ALL {
            let event = self.secondary[slot.index()];
            if !event.is_due(cycle) {
                continue;
            }
            self.check_triggered(slot.name(), &event, cycle)?;

            match slot.irq_bit() {
                Some(bit) => {
                    let mask = 1u16 << bit;
                    match event.id {
                        EventId::IrqSet => handler.write_intreq(0x8000 | mask),
                        EventId::IrqClear => handler.write_intreq(mask),
                        other => {
                            return Err(SchedulerError::InvalidEventId {
                                slot: slot.name(),
                                id: other.name(),
                            }
                            .into());
                        }
                    }
                    self.disable_sec(slot);
                }
                None => handler.service_secondary_event(self, slot, event)?,
            }
        }

        self.next_sec_trigger = self
            .secondary
            .iter()
            .map(|event| event.trigger)
            .min()
            .unwrap_or(NEVER);

        // Hand the next secondary trigger back to the primary table
        let sec = &mut self.primary[PrimarySlot::Sec.index()];
        sec.trigger = self.next_sec_trigger;
        sec.trigger_beam = None;
        Ok(())
    }

    fn check_triggered(&self, name: &'static str, event: &Event, cycle: i64) -> Result<(), SchedulerError> {
        let Some(expected) = event.trigger_beam else {
            return Ok(());
        };

        let actual = self.map.cycle_to_beam(cycle);
        if actual.vpos != expected.vpos || actual.hpos != expected.hpos {
            return Err(SchedulerError::BeamMismatch {
                slot: name,
                vpos: expected.vpos,
                hpos: expected.hpos,
                actual,
            });
        }
        Ok(())
    }

    //
    // Inspection
    //

    #[must_use]
    pub fn slot_info(&self, slot: PrimarySlot) -> EventSlotInfo {
        self.info(slot.name(), self.event(slot))
    }

    #[must_use]
    pub fn sec_slot_info(&self, slot: SecondarySlot) -> EventSlotInfo {
        self.info(slot.name(), self.sec_event(slot))
    }

    fn info(&self, slot_name: &'static str, event: &Event) -> EventSlotInfo {
        let (vpos, hpos) = if event.is_pending() {
            let beam = self.map.cycle_to_beam(event.trigger);
            (beam.vpos, beam.hpos)
        } else {
            (0, 0)
        };

        EventSlotInfo {
            slot_name,
            event_name: event.id.name(),
            trigger: event.trigger,
            trigger_rel: event.trigger.saturating_sub(self.clock),
            current_frame: self.map.belongs_to_current_frame(self.clock, event.trigger),
            vpos,
            hpos,
        }
    }

    /// Log both tables at debug level.
    pub fn dump(&self) {
        log::debug!("clock {} ({})", self.clock, self.beam());
        log::debug!("primary table (next trigger {})", self.next_trigger);
        for slot in PrimarySlot::ALL {
            Self::dump_info(&self.slot_info(slot));
        }
        log::debug!("secondary table (next trigger {})", self.next_sec_trigger);
        for slot in SecondarySlot::ALL {
            Self::dump_info(&self.sec_slot_info(slot));
        }
    }

    fn dump_info(info: &EventSlotInfo) {
        if info.trigger == NEVER {
            log::debug!("  {:<16} {:<18} never", info.slot_name, info.event_name);
        } else {
            log::debug!(
                "  {:<16} {:<18} {} (+{}) ({},{})",
                info.slot_name,
                info.event_name,
                info.trigger,
                info.trigger_rel,
                info.vpos,
                info.hpos
            );
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(BeamMap::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beam::dma_cycles;

    #[derive(Default)]
    struct Recorder {
        fired: Vec<(PrimarySlot, EventId, i64)>,
        secondary: Vec<(SecondarySlot, EventId, i64)>,
        intreq: Vec<u16>,
    }

    impl EventHandler for Recorder {
        type Error = SchedulerError;

        fn service_event(
            &mut self,
            scheduler: &mut Scheduler,
            slot: PrimarySlot,
            event: Event,
        ) -> Result<(), SchedulerError> {
            self.fired.push((slot, event.id, scheduler.clock()));
            scheduler.cancel(slot);
            Ok(())
        }

        fn service_secondary_event(
            &mut self,
            scheduler: &mut Scheduler,
            slot: SecondarySlot,
            event: Event,
        ) -> Result<(), SchedulerError> {
            self.secondary.push((slot, event.id, scheduler.clock()));
            scheduler.cancel_sec(slot);
            Ok(())
        }

        fn write_intreq(&mut self, value: u16) {
            self.intreq.push(value);
        }
    }

    fn run(scheduler: &mut Scheduler, recorder: &mut Recorder, until: i64) {
        for cycle in 0..=until {
            scheduler
                .advance_to(cycle, recorder)
                .expect("no scheduler error expected");
        }
    }

    #[test]
    fn scheduled_event_fires_at_its_cycle() {
        let mut scheduler = Scheduler::default();
        let mut recorder = Recorder::default();

        scheduler.schedule_abs(PrimarySlot::Dma, 100, EventId::DmaL1).unwrap();
        scheduler.schedule_abs(PrimarySlot::Blt, 300, EventId::BltInit).unwrap();
        run(&mut scheduler, &mut recorder, 150);

        assert_eq!(recorder.fired, vec![(PrimarySlot::Dma, EventId::DmaL1, 100)]);
        assert_eq!(
            scheduler.next_trigger(),
            300,
            "next trigger must be the earliest remaining slot"
        );
    }

    #[test]
    fn same_cycle_events_fire_in_slot_order() {
        let mut scheduler = Scheduler::default();
        let mut recorder = Recorder::default();

        scheduler.schedule_abs(PrimarySlot::Ras, 80, EventId::RasHsync).unwrap();
        scheduler.schedule_abs(PrimarySlot::Cop, 80, EventId::CopFetch).unwrap();
        scheduler.schedule_abs(PrimarySlot::CiaA, 80, EventId::CiaExecute).unwrap();
        scheduler.advance_to(80, &mut recorder).unwrap();

        let order: Vec<_> = recorder.fired.iter().map(|(slot, _, _)| *slot).collect();
        assert_eq!(order, vec![PrimarySlot::CiaA, PrimarySlot::Cop, PrimarySlot::Ras]);
        assert_eq!(scheduler.next_trigger(), NEVER);
    }

    #[test]
    fn earlier_reschedule_lowers_next_trigger() {
        let mut scheduler = Scheduler::default();

        scheduler.schedule_abs(PrimarySlot::Cop, 500, EventId::CopMove).unwrap();
        assert_eq!(scheduler.next_trigger(), 500);

        scheduler.reschedule_abs(PrimarySlot::Cop, 200).unwrap();
        assert_eq!(scheduler.next_trigger(), 200);

        scheduler.reschedule_abs(PrimarySlot::Cop, 900).unwrap();
        assert_eq!(
            scheduler.next_trigger(),
            200,
            "a later reschedule never decreases the cached trigger"
        );
        assert_eq!(scheduler.event(PrimarySlot::Cop).id, EventId::CopMove);
    }

    #[test]
    fn stale_next_trigger_is_recomputed_on_advance() {
        let mut scheduler = Scheduler::default();
        let mut recorder = Recorder::default();

        scheduler.schedule_abs(PrimarySlot::Cop, 100, EventId::CopMove).unwrap();
        scheduler.reschedule_abs(PrimarySlot::Cop, 400).unwrap();
        scheduler.advance_to(100, &mut recorder).unwrap();

        assert!(recorder.fired.is_empty());
        assert_eq!(scheduler.next_trigger(), 400);
    }

    #[test]
    fn relative_scheduling_uses_the_clock() {
        let mut scheduler = Scheduler::default();
        let mut recorder = Recorder::default();

        scheduler.advance_to(64, &mut recorder).unwrap();
        scheduler.schedule_rel(PrimarySlot::Blt, dma_cycles(2), EventId::BltExecute).unwrap();
        assert_eq!(scheduler.event(PrimarySlot::Blt).trigger, 80);

        scheduler.reschedule_rel_with(PrimarySlot::Blt, 8, EventId::BltInit).unwrap();
        assert_eq!(scheduler.event(PrimarySlot::Blt).trigger, 72);
        assert_eq!(scheduler.event(PrimarySlot::Blt).id, EventId::BltInit);
    }

    #[test]
    fn invalid_events_are_rejected() {
        let mut scheduler = Scheduler::default();

        assert!(matches!(
            scheduler.schedule_abs(PrimarySlot::Cop, 10, EventId::DmaL1),
            Err(SchedulerError::InvalidEventId { .. })
        ));
        assert!(matches!(
            scheduler.schedule_abs(PrimarySlot::Dma, -8, EventId::DmaL1),
            Err(SchedulerError::NegativeTrigger { .. })
        ));
        assert!(matches!(
            scheduler.schedule_abs(PrimarySlot::CiaA, 41, EventId::CiaExecute),
            Err(SchedulerError::MisalignedCiaTrigger { .. })
        ));
        assert!(matches!(
            scheduler.reschedule_abs(PrimarySlot::Blt, 10),
            Err(SchedulerError::MissingEventId { .. })
        ));
        assert!(matches!(
            scheduler.schedule_sec_abs(SecondarySlot::IrqBlit, 10, EventId::HsyncEol),
            Err(SchedulerError::InvalidEventId { .. })
        ));
        assert_eq!(
            scheduler.next_trigger(),
            NEVER,
            "rejected events must not touch the table"
        );
    }

    #[test]
    fn cia_events_accept_cia_cycles() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule_abs(PrimarySlot::CiaB, 400, EventId::CiaWakeup).unwrap();
        scheduler.reschedule_abs(PrimarySlot::CiaB, NEVER).unwrap();
        assert!(!scheduler.is_pending(PrimarySlot::CiaB));
    }

    #[test]
    fn disable_keeps_the_id_and_cancel_clears_it() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule_abs(PrimarySlot::Blt, 50, EventId::BltExecute).unwrap();

        scheduler.disable(PrimarySlot::Blt);
        assert!(scheduler.has_event(PrimarySlot::Blt));
        assert!(!scheduler.is_pending(PrimarySlot::Blt));

        scheduler.cancel(PrimarySlot::Blt);
        assert!(!scheduler.has_event(PrimarySlot::Blt));
    }

    #[test]
    fn secondary_event_updates_the_sec_slot() {
        let mut scheduler = Scheduler::default();

        scheduler.schedule_sec_abs(SecondarySlot::IrqBlit, 900, EventId::IrqSet).unwrap();
        assert_eq!(scheduler.event(PrimarySlot::Sec).trigger, 900);
        assert_eq!(scheduler.event(PrimarySlot::Sec).id, EventId::SecTrigger);

        scheduler.schedule_sec_abs(SecondarySlot::IrqSoft, 400, EventId::IrqSet).unwrap();
        assert_eq!(scheduler.event(PrimarySlot::Sec).trigger, 400);
        assert_eq!(scheduler.next_trigger(), 400);
        assert_eq!(scheduler.next_sec_trigger(), 400);
    }

    #[test]
    fn interrupt_events_write_intreq_and_disable_the_slot() {
        let mut scheduler = Scheduler::default();
        let mut recorder = Recorder::default();

        scheduler.schedule_sec_abs(SecondarySlot::IrqVertb, 40, EventId::IrqSet).unwrap();
        scheduler.schedule_sec_abs(SecondarySlot::IrqBlit, 80, EventId::IrqClear).unwrap();
        run(&mut scheduler, &mut recorder, 100);

        assert_eq!(recorder.intreq, vec![0x8020, 0x0040]);
        assert!(!scheduler.is_sec_pending(SecondarySlot::IrqVertb));
        assert!(scheduler.has_sec_event(SecondarySlot::IrqVertb));
        assert_eq!(scheduler.next_sec_trigger(), NEVER);
        assert!(!scheduler.is_pending(PrimarySlot::Sec));
        assert_eq!(scheduler.next_trigger(), NEVER);
    }

    #[test]
    fn hsync_secondary_event_reaches_the_handler() {
        let mut scheduler = Scheduler::default();
        let mut recorder = Recorder::default();

        scheduler.schedule_sec_abs(SecondarySlot::Hsync, 16, EventId::HsyncEol).unwrap();
        run(&mut scheduler, &mut recorder, 20);

        assert_eq!(recorder.secondary, vec![(SecondarySlot::Hsync, EventId::HsyncEol, 16)]);
        assert!(recorder.fired.is_empty());
    }

    #[test]
    fn beam_scheduled_event_checks_position_when_firing() {
        let mut scheduler = Scheduler::default();
        let mut recorder = Recorder::default();

        scheduler.schedule_pos(PrimarySlot::Ras, 1, 10, EventId::RasHsync).unwrap();
        let expected = scheduler.map().beam_to_cycle(Beam::new(0, 1, 10));
        assert_eq!(scheduler.event(PrimarySlot::Ras).trigger, expected);

        scheduler.advance_to(expected, &mut recorder).unwrap();
        assert_eq!(recorder.fired.len(), 1);
    }

    #[test]
    fn late_beam_scheduled_event_is_fatal() {
        let mut scheduler = Scheduler::default();
        let mut recorder = Recorder::default();

        scheduler.schedule_pos(PrimarySlot::Dma, 0, 20, EventId::DmaL1).unwrap();
        let late = scheduler.event(PrimarySlot::Dma).trigger + dma_cycles(3);

        let result = scheduler.advance_to(late, &mut recorder);
        assert!(matches!(result, Err(SchedulerError::BeamMismatch { vpos: 0, hpos: 20, .. })));
    }

    #[test]
    fn positions_behind_the_beam_wrap_to_the_next_frame() {
        let mut scheduler = Scheduler::default();
        let mut recorder = Recorder::default();
        let map = *scheduler.map();

        let now = map.beam_to_cycle(Beam::new(0, 100, 50));
        scheduler.advance_to(now, &mut recorder).unwrap();

        scheduler.schedule_pos(PrimarySlot::Cop, 20, 4, EventId::CopFetch).unwrap();
        assert_eq!(
            scheduler.event(PrimarySlot::Cop).trigger,
            map.beam_to_cycle(Beam::new(1, 20, 4))
        );

        scheduler.schedule_pos(PrimarySlot::Blt, 100, 50, EventId::BltInit).unwrap();
        assert_eq!(scheduler.event(PrimarySlot::Blt).trigger, now);

        scheduler.schedule_pos(PrimarySlot::Ras, 100, 51, EventId::RasHsync).unwrap();
        assert_eq!(scheduler.event(PrimarySlot::Ras).trigger, now + 8);
        scheduler.cancel(PrimarySlot::Blt);
        scheduler.cancel(PrimarySlot::Ras);

        let wrapped = map.beam_to_cycle(Beam::new(1, 20, 4));
        scheduler.advance_to(wrapped, &mut recorder).unwrap();
        assert!(recorder.fired.contains(&(PrimarySlot::Cop, EventId::CopFetch, wrapped)));
    }

    #[test]
    fn reschedule_pos_keeps_the_event_and_records_the_beam() {
        let mut scheduler = Scheduler::default();
        let mut recorder = Recorder::default();
        scheduler.schedule_abs_with(PrimarySlot::Dma, 16, EventId::DmaS3, 7).unwrap();

        scheduler.reschedule_pos(PrimarySlot::Dma, 3, 9).unwrap();
        let event = *scheduler.event(PrimarySlot::Dma);
        assert_eq!(event.id, EventId::DmaS3);
        assert_eq!(event.data, 7);
        assert_eq!(event.trigger_beam, Some(TriggerBeam { vpos: 3, hpos: 9 }));

        // Skipping past the position is caught when the event fires
        let late = event.trigger + 8;
        assert!(matches!(
            scheduler.advance_to(late, &mut recorder),
            Err(SchedulerError::BeamMismatch { vpos: 3, hpos: 9, .. })
        ));
    }

    #[test]
    fn positions_outside_the_frame_are_rejected() {
        let mut scheduler = Scheduler::default();
        assert!(matches!(
            scheduler.schedule_pos(PrimarySlot::Ras, 400, 0, EventId::RasHsync),
            Err(SchedulerError::InvalidBeamPosition { .. })
        ));
    }

    #[test]
    fn slot_info_describes_pending_events() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule_pos(PrimarySlot::Cop, 2, 4, EventId::CopWaitOrSkip).unwrap();

        let info = scheduler.slot_info(PrimarySlot::Cop);
        assert_eq!(info.slot_name, "Copper");
        assert_eq!(info.event_name, "COP_WAIT_OR_SKIP");
        assert_eq!((info.vpos, info.hpos), (2, 4));
        assert!(info.current_frame);
        assert_eq!(info.trigger_rel, info.trigger);

        let idle = scheduler.slot_info(PrimarySlot::Blt);
        assert_eq!(idle.event_name, "none");
        assert!(!idle.current_frame);
    }
}
