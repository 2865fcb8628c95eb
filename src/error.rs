use thiserror::Error;

use crate::timer::TimerId;

/// Errors returned by the timer engine
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// Timers must last at least one minute
    #[error("invalid timer duration: {minutes} minute(s)")]
    InvalidDuration { minutes: i64 },

    /// The id was never issued or the timer has been removed.
    ///
    /// Control operations report this without touching any state, so callers
    /// reacting to stale UI input can safely ignore it.
    #[error("timer {0} not found")]
    NotFound(TimerId),

    #[error("cannot format negative time: {seconds}s")]
    InvalidInput { seconds: i64 },

    #[error("timer engine has been shut down")]
    Shutdown,

    #[error("timer engine must be created inside a Tokio runtime")]
    NoRuntime,

    #[error("invalid engine config: {reason}")]
    InvalidConfig { reason: &'static str },
}

impl From<tokio::runtime::TryCurrentError> for TimerError {
    fn from(_: tokio::runtime::TryCurrentError) -> Self {
        TimerError::NoRuntime
    }
}

pub type Result<T> = std::result::Result<T, TimerError>;
