use std::collections::BTreeMap;

use crate::error::{Result, TimerError};
use crate::timer::{Timer, TimerId};

const SECS_PER_MINUTE: i64 = 60;

/// Result of applying one tick to a timer
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    /// Timer is gone or no longer running; the tick source should stop
    Stale,
    /// Still counting down, with this many seconds left
    Counting(u64),
    /// Reached zero on this tick
    Completed(Timer),
}

/// Authoritative store of timer records.
///
/// Ids are handed out from a monotonic counter, so iterating the map yields
/// timers in creation order.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    timers: BTreeMap<TimerId, Timer>,
    last_id: u64,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn create(&mut self, name: String, duration_minutes: i64) -> Result<TimerId> {
        let invalid = TimerError::InvalidDuration {
            minutes: duration_minutes,
        };
        if duration_minutes <= 0 {
            return Err(invalid);
        }
        let duration = duration_minutes
            .checked_mul(SECS_PER_MINUTE)
            .ok_or(invalid)? as u64;

        self.last_id += 1;
        let id = TimerId::new(self.last_id);
        self.timers.insert(id, Timer::new(id, name, duration));
        Ok(id)
    }

    pub(crate) fn get(&self, id: TimerId) -> Result<&Timer> {
        self.timers.get(&id).ok_or(TimerError::NotFound(id))
    }

    fn get_mut(&mut self, id: TimerId) -> Result<&mut Timer> {
        self.timers.get_mut(&id).ok_or(TimerError::NotFound(id))
    }

    pub(crate) fn list(&self) -> Vec<Timer> {
        self.timers.values().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.timers.len()
    }

    /// Mark a timer active. Returns false when it was already running or has
    /// completed, in which case nothing changes.
    pub(crate) fn activate(&mut self, id: TimerId) -> Result<bool> {
        let timer = self.get_mut(id)?;
        if timer.is_active || timer.is_completed {
            return Ok(false);
        }
        timer.is_active = true;
        Ok(true)
    }

    /// Mark a timer inactive, keeping its remaining time. Returns false when
    /// it was not running.
    pub(crate) fn deactivate(&mut self, id: TimerId) -> Result<bool> {
        let timer = self.get_mut(id)?;
        let was_active = timer.is_active;
        timer.is_active = false;
        Ok(was_active)
    }

    pub(crate) fn rewind(&mut self, id: TimerId) -> Result<()> {
        self.get_mut(id)?.rewind();
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: TimerId) -> Result<Timer> {
        self.timers.remove(&id).ok_or(TimerError::NotFound(id))
    }

    /// Decrement a running timer by one second
    pub(crate) fn tick(&mut self, id: TimerId) -> TickOutcome {
        let Some(timer) = self.timers.get_mut(&id) else {
            return TickOutcome::Stale;
        };
        if !timer.is_active {
            return TickOutcome::Stale;
        }

        timer.remaining = timer.remaining.saturating_sub(1);
        if timer.remaining == 0 {
            timer.is_active = false;
            timer.is_completed = true;
            TickOutcome::Completed(timer.clone())
        } else {
            TickOutcome::Counting(timer.remaining)
        }
    }

    /// Mark every running timer inactive; returns how many were running
    pub(crate) fn deactivate_all(&mut self) -> usize {
        let mut stopped = 0;
        for timer in self.timers.values_mut().filter(|t| t.is_active) {
            timer.is_active = false;
            stopped += 1;
        }
        stopped
    }
}
