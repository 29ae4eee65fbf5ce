//! Construction and configuration errors.
//!
//! Running the simulation has no error surface: `start` and `reset` are
//! always valid. These errors can only come out of building a controller
//! or a schedule from configuration.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PhiError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhiError {
    #[error("stage interval must be a positive number of milliseconds")]
    ZeroStageInterval,

    #[error("duplicate unit id: {0}")]
    DuplicateId(String),

    #[error("activation schedule has no stages")]
    EmptySchedule,
}
