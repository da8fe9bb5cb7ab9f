use crate::beam::Beam;

/// Scheduler invariant violations.
///
/// Each of these means the event tables no longer describe a consistent
/// machine. Emulation of the session must stop.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("{slot}: scheduled event has no event id")]
    MissingEventId { slot: &'static str },

    #[error("{slot}: event {id} is not valid for this slot")]
    InvalidEventId { slot: &'static str, id: String },

    #[error("{slot}: trigger cycle {cycle} is negative")]
    NegativeTrigger { slot: &'static str, cycle: i64 },

    #[error("{slot}: trigger cycle {cycle} is not a CIA cycle")]
    MisalignedCiaTrigger { slot: &'static str, cycle: i64 },

    #[error("{slot}: event fired at {actual}, expected line {vpos} column {hpos}")]
    BeamMismatch {
        slot: &'static str,
        vpos: u16,
        hpos: u16,
        actual: Beam,
    },

    #[error("beam position ({vpos},{hpos}) is outside the frame")]
    InvalidBeamPosition { vpos: u16, hpos: u16 },
}
