//! Playback transport and position synchronization
//!
//! - [`PlaybackEngine`]: the backend seam (cpal in the player, scripted in tests)
//! - [`PollTimer`]: owned, token-identified repeating timer
//! - [`PlaybackSynchronizer`]: state machine that polls the engine and publishes
//!   [`PlaybackState`]

mod engine;
mod error;
pub mod mock;
mod sync;
mod timer;

pub use engine::PlaybackEngine;
pub use error::{EngineError, EngineResult};
pub use sync::{PlaybackSynchronizer, SyncState};
pub use timer::{PollTimer, TimerToken, DEFAULT_POLL_INTERVAL};

/// Published playback position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackState {
    pub position_ms: u64,
    pub duration_ms: u64,
    pub is_playing: bool,
}

impl PlaybackState {
    /// `position / duration` clamped to `[0, 1]`; 0 when the duration is unknown
    pub fn progress_fraction(&self) -> f32 {
        progress_fraction(self.position_ms, self.duration_ms)
    }
}

/// Normalized progress of `position_ms` within `duration_ms`
pub fn progress_fraction(position_ms: u64, duration_ms: u64) -> f32 {
    if duration_ms == 0 {
        return 0.0;
    }
    (position_ms as f64 / duration_ms as f64).clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_zero_duration() {
        assert_eq!(progress_fraction(500, 0), 0.0);
    }

    #[test]
    fn test_progress_clamped() {
        assert_eq!(progress_fraction(3000, 2000), 1.0);
        assert!((progress_fraction(500, 2000) - 0.25).abs() < f32::EPSILON);
    }
}
