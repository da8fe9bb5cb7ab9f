//! Commodore Agnus OCS: beam map and event scheduler.
//!
//! Agnus owns the master timing of the machine. Every subsystem that needs to
//! act at a particular cycle registers an event in one of the scheduler's
//! slots; the scheduler services due slots in a fixed priority order.

mod beam;
mod error;
mod event;
mod scheduler;

pub use beam::{
    Beam, BeamMap, CCKS_PER_LINE, NTSC_LINES_PER_FRAME, PAL_LINES_PER_FRAME, Region,
    TICKS_PER_CCK, dma_cycles,
};
pub use error::SchedulerError;
pub use event::{
    CIA_CYCLE, DmaChannel, Event, EventId, NEVER, PrimarySlot, SecondarySlot, TriggerBeam,
};
pub use scheduler::{EventHandler, EventSlotInfo, Scheduler};
