use std::fmt;
use std::time::Duration;

/// Opaque timer identifier, unique for the lifetime of its engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub(crate) fn new(raw: u64) -> Self {
        TimerId(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Snapshot of a countdown timer.
///
/// Values are copied out of the engine; changing a snapshot has no effect on
/// the timer it was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    pub id: TimerId,
    pub name: String,
    /// Total span in whole seconds
    pub duration: u64,
    /// Whole seconds left, never above `duration`
    pub remaining: u64,
    pub is_active: bool,
    pub is_completed: bool,
}

/// Display urgency of a timer, by remaining time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    Normal,
    /// Five minutes or less
    Warning,
    /// One minute or less
    Critical,
    Completed,
}

const WARNING_THRESHOLD_SECS: u64 = 300;
const CRITICAL_THRESHOLD_SECS: u64 = 60;

impl Timer {
    pub(crate) fn new(id: TimerId, name: String, duration: u64) -> Self {
        Timer {
            id,
            name,
            duration,
            remaining: duration,
            is_active: false,
            is_completed: false,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration)
    }

    pub fn remaining(&self) -> Duration {
        Duration::from_secs(self.remaining)
    }

    /// Stopped partway through a run
    pub fn is_paused(&self) -> bool {
        !self.is_active && !self.is_completed && self.remaining < self.duration
    }

    /// Share of the duration already elapsed, from 0.0 to 100.0
    pub fn progress_percent(&self) -> f64 {
        if self.duration == 0 {
            return 0.0;
        }
        let elapsed = self.duration - self.remaining;
        elapsed as f64 / self.duration as f64 * 100.0
    }

    pub fn urgency(&self) -> Urgency {
        if self.is_completed {
            Urgency::Completed
        } else if self.remaining <= CRITICAL_THRESHOLD_SECS {
            Urgency::Critical
        } else if self.remaining <= WARNING_THRESHOLD_SECS {
            Urgency::Warning
        } else {
            Urgency::Normal
        }
    }

    /// Clear completion and restore the full duration
    pub(crate) fn rewind(&mut self) {
        self.remaining = self.duration;
        self.is_active = false;
        self.is_completed = false;
    }
}
