//! Read-only helpers for presenting timers

use crate::error::{Result, TimerError};
use crate::timer::Timer;

/// Format seconds as zero-padded "MM:SS".
///
/// Minutes keep growing past two digits for long durations ("125:00").
pub fn format_remaining(seconds: i64) -> Result<String> {
    if seconds < 0 {
        return Err(TimerError::InvalidInput { seconds });
    }
    Ok(format!("{:02}:{:02}", seconds / 60, seconds % 60))
}

/// Split a snapshot into (unfinished, completed), preserving order
pub fn split_by_completion(timers: &[Timer]) -> (Vec<Timer>, Vec<Timer>) {
    let (completed, unfinished): (Vec<Timer>, Vec<Timer>) =
        timers.iter().cloned().partition(|t| t.is_completed);
    (unfinished, completed)
}
