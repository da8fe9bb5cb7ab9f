use crate::reg_change::RegisterChangeKind;

/// Invariant violations inside the line pipeline.
///
/// None of these can be caused by a guest program; they indicate that the
/// change queues and the line lifecycle have drifted apart.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DeniseError {
    #[error("{queue}: more than {capacity} register changes recorded in one line")]
    QueueOverflow { queue: &'static str, capacity: usize },

    #[error("{queue}: {pending} register changes left over at end of line")]
    UndrainedQueue { queue: &'static str, pending: usize },

    #[error("{queue}: cannot apply register change {kind:?}")]
    UnexpectedChange {
        queue: &'static str,
        kind: RegisterChangeKind,
    },
}

/// Rejected configuration values.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be in 0..=100, got {value}")]
    OutOfRange { name: &'static str, value: u8 },

    #[error("the frame buffer ring needs at least 2 buffers, got {0}")]
    TooFewFrameBuffers(usize),
}
