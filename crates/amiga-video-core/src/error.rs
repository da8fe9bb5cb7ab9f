use commodore_agnus_ocs::SchedulerError;
use commodore_denise_ocs::{ConfigError, DeniseError};

/// Anything that stops the video core.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("scheduler: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("denise: {0}")]
    Denise(#[from] DeniseError),

    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("video core is halted after a fatal error")]
    Halted,
}
