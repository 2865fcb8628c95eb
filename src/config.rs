use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::error::{Result, TimerError};

/// Timer engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Instance name for logging
    pub name: String,

    /// Time between two ticks of a running timer
    pub tick_period: Duration,

    /// Size of the completion event channel buffer
    pub event_buffer_size: usize,

    /// What a tick source does after falling behind its deadlines.
    ///
    /// `Burst` catches up so every elapsed period still produces a tick.
    pub missed_tick_behavior: MissedTickBehavior,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            name: "step_timers".to_string(),
            tick_period: Duration::from_secs(1),
            event_buffer_size: 64,
            missed_tick_behavior: MissedTickBehavior::Burst,
        }
    }
}

impl EngineConfig {
    /// Reject settings the tick loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.tick_period.is_zero() {
            return Err(TimerError::InvalidConfig {
                reason: "tick period must be non-zero",
            });
        }
        Ok(())
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_tick_period(mut self, tick_period: Duration) -> Self {
        self.tick_period = tick_period;
        self
    }

    pub fn with_event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = size;
        self
    }

    pub fn with_missed_tick_behavior(mut self, behavior: MissedTickBehavior) -> Self {
        self.missed_tick_behavior = behavior;
        self
    }
}
