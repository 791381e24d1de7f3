//! Countdown for the current speaking turn, driven by an external one-second tick.

use serde::Serialize;
use utoipa::ToSchema;

/// Countdown value plus running flag. `time_remaining` never goes below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DebateTimer {
    time_remaining: u32,
    is_running: bool,
}

impl DebateTimer {
    /// A stopped timer loaded with `seconds`.
    pub fn new(seconds: u32) -> Self {
        Self {
            time_remaining: seconds,
            is_running: false,
        }
    }

    /// Seconds left in the current turn.
    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    /// Whether ticks currently count down.
    pub fn is_running(&self) -> bool {
        self.is_running
    }

    /// Replace the remaining time without touching the running flag.
    pub fn reset(&mut self, seconds: u32) {
        self.time_remaining = seconds;
    }

    /// Start or stop counting down.
    pub fn set_running(&mut self, running: bool) {
        self.is_running = running;
    }

    /// Remove one second. Reaching zero while running stops the timer; at zero this is a no-op.
    ///
    /// Returns `true` when this call took the countdown to zero.
    pub fn decrement(&mut self) -> bool {
        if self.time_remaining == 0 {
            return false;
        }
        self.time_remaining -= 1;
        if self.time_remaining == 0 {
            if self.is_running {
                self.is_running = false;
            }
            return true;
        }
        false
    }
}

/// Render seconds as `MM:SS`; negative values (overtime) get a leading `-`.
pub fn format_time(seconds: i64) -> String {
    let sign = if seconds < 0 { "-" } else { "" };
    let abs = seconds.unsigned_abs();
    format!("{sign}{:02}:{:02}", abs / 60, abs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decrement_floors_at_zero_and_stops() {
        let mut timer = DebateTimer::new(2);
        timer.set_running(true);

        assert!(!timer.decrement());
        assert_eq!(timer.time_remaining(), 1);
        assert!(timer.is_running());

        assert!(timer.decrement());
        assert_eq!(timer.time_remaining(), 0);
        assert!(!timer.is_running());

        assert!(!timer.decrement());
        assert_eq!(timer.time_remaining(), 0);
    }

    #[test]
    fn stopped_timer_still_counts_when_asked() {
        let mut timer = DebateTimer::new(1);
        assert!(timer.decrement());
        assert!(!timer.is_running());
    }

    #[test]
    fn set_running_is_unconditional() {
        let mut timer = DebateTimer::new(0);
        timer.set_running(true);
        assert!(timer.is_running());
        timer.set_running(false);
        assert!(!timer.is_running());
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(65), "01:05");
        assert_eq!(format_time(600), "10:00");
        assert_eq!(format_time(-5), "-00:05");
        assert_eq!(format_time(-125), "-02:05");
    }
}
