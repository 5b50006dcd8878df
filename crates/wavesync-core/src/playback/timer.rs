//! Owned repeating timer handle for position polling
//!
//! The timer itself does not sleep or spawn anything. Whoever drives the UI
//! loop (an iced `time::every` subscription, a test) delivers ticks tagged with
//! the [`TimerToken`] that was current when the timer started. Starting or
//! cancelling the timer retires the old token, so a tick that was already in
//! flight when the timer stopped is recognised as stale and ignored instead of
//! polling a released engine.

use std::time::Duration;

/// Default polling cadence while playing
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Identity of one run of a [`PollTimer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

/// Repeating timer owned by the playback synchronizer
#[derive(Debug)]
pub struct PollTimer {
    interval: Duration,
    active: Option<TimerToken>,
    generation: u64,
}

impl PollTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            active: None,
            generation: 0,
        }
    }

    /// Start a new run, cancelling any run already active
    pub fn start(&mut self) -> TimerToken {
        self.generation += 1;
        let token = TimerToken(self.generation);
        self.active = Some(token);
        token
    }

    /// Stop the current run; returns its token if one was active
    pub fn cancel(&mut self) -> Option<TimerToken> {
        self.active.take()
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Whether `token` belongs to the run that is active right now
    #[inline]
    pub fn is_current(&self, token: TimerToken) -> bool {
        self.active == Some(token)
    }

    /// Token of the active run
    #[inline]
    pub fn token(&self) -> Option<TimerToken> {
        self.active
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for PollTimer {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restart_retires_previous_token() {
        let mut timer = PollTimer::default();
        let first = timer.start();
        let second = timer.start();
        assert_ne!(first, second);
        assert!(!timer.is_current(first));
        assert!(timer.is_current(second));
    }

    #[test]
    fn test_cancel_makes_token_stale() {
        let mut timer = PollTimer::default();
        let token = timer.start();
        assert_eq!(timer.cancel(), Some(token));
        assert!(!timer.is_running());
        assert!(!timer.is_current(token));
        assert_eq!(timer.cancel(), None);
    }

    #[test]
    fn test_default_interval_is_50ms() {
        assert_eq!(PollTimer::default().interval(), Duration::from_millis(50));
    }
}
