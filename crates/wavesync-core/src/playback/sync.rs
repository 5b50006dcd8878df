//! Playback position synchronizer
//!
//! Keeps a published [`PlaybackState`] consistent with an independently
//! advancing playback engine.
//!
//! ```text
//!  Idle ──prepare──► Prepared ──play──► Playing ◄──play/pause──► Paused
//!                                          │
//!                              end-of-media│
//!                                          ▼
//!                                      Completed ──play──► Playing
//! ```
//!
//! While `Playing`, an owned [`PollTimer`] is running and every tick carrying
//! its current token samples the engine once. Pause, completion, reload and
//! release all cancel the timer before touching the engine.
//!
//! All methods run on the UI thread. Observers either read the state
//! directly or hold a `watch` receiver from [`PlaybackSynchronizer::subscribe`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::engine::PlaybackEngine;
use super::error::{EngineError, EngineResult};
use super::timer::{PollTimer, TimerToken};
use super::PlaybackState;
use crate::audio_file::SampleBuffer;

/// Transport state of the synchronizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No source attached
    Idle,
    /// Source attached, duration known, position 0
    Prepared,
    Playing,
    Paused,
    /// The engine reported end-of-media; position was reset to 0
    Completed,
}

/// Drives a [`PlaybackEngine`] and publishes its position
pub struct PlaybackSynchronizer<E: PlaybackEngine> {
    engine: E,
    state: SyncState,
    playback: PlaybackState,
    timer: PollTimer,
    publisher: watch::Sender<PlaybackState>,
}

impl<E: PlaybackEngine> PlaybackSynchronizer<E> {
    /// Create an idle synchronizer polling every `poll_interval`
    pub fn new(engine: E, poll_interval: Duration) -> Self {
        let (publisher, _) = watch::channel(PlaybackState::default());
        Self {
            engine,
            state: SyncState::Idle,
            playback: PlaybackState::default(),
            timer: PollTimer::new(poll_interval),
            publisher,
        }
    }

    /// Attach a new source, tearing down the previous one
    ///
    /// Polling stops before the engine is touched. If the engine rejects the
    /// source, nothing changes: the previous state is kept and polling resumes
    /// if it was running.
    pub fn prepare(&mut self, source: &Arc<SampleBuffer>) -> EngineResult<u64> {
        let was_polling = self.timer.cancel().is_some();

        match self.engine.prepare(source) {
            Ok(duration_ms) => {
                log::info!(
                    "Synchronizer: prepared buffer {} ({} ms), was {:?}",
                    source.id(),
                    duration_ms,
                    self.state
                );
                self.state = SyncState::Prepared;
                self.publish(PlaybackState {
                    position_ms: 0,
                    duration_ms,
                    is_playing: false,
                });
                Ok(duration_ms)
            }
            Err(e) => {
                log::warn!("Synchronizer: prepare rejected, keeping {:?}: {}", self.state, e);
                if was_polling {
                    self.timer.start();
                }
                Err(e)
            }
        }
    }

    /// Start or resume playback and begin polling
    ///
    /// Returns the token of the new polling run. Already playing is a no-op
    /// that returns the running token.
    pub fn play(&mut self) -> EngineResult<TimerToken> {
        match self.state {
            SyncState::Idle => Err(EngineError::NotPrepared),
            SyncState::Playing => self.timer.token().ok_or(EngineError::NotPrepared),
            SyncState::Prepared | SyncState::Paused | SyncState::Completed => {
                self.engine.play();
                self.state = SyncState::Playing;
                let token = self.timer.start();
                self.publish(PlaybackState {
                    is_playing: true,
                    ..self.playback
                });
                log::debug!("Synchronizer: playing from {} ms", self.playback.position_ms);
                Ok(token)
            }
        }
    }

    /// Pause playback; polling stops immediately and the last polled
    /// position is kept
    pub fn pause(&mut self) {
        if self.state != SyncState::Playing {
            return;
        }
        self.timer.cancel();
        self.engine.pause();
        self.state = SyncState::Paused;
        self.publish(PlaybackState {
            is_playing: false,
            ..self.playback
        });
        log::debug!("Synchronizer: paused at {} ms", self.playback.position_ms);
    }

    /// Toggle between playing and paused
    ///
    /// Returns whether playback is running afterwards.
    pub fn toggle(&mut self) -> EngineResult<bool> {
        if self.state == SyncState::Playing {
            self.pause();
            Ok(false)
        } else {
            self.play().map(|_| true)
        }
    }

    /// Move the play head without changing the play/pause state
    ///
    /// The engine is updated first and then asked for the resulting
    /// position, so a poll right after the seek cannot observe a stale value.
    pub fn seek_to(&mut self, position_ms: u64) -> EngineResult<u64> {
        if self.state == SyncState::Idle {
            return Err(EngineError::NotPrepared);
        }
        self.engine.seek_to(position_ms);
        let position_ms = self.engine.current_position();
        self.publish(PlaybackState {
            position_ms,
            ..self.playback
        });
        Ok(position_ms)
    }

    /// Seek to a fraction of the total duration (clamped to `[0, 1]`)
    pub fn seek_to_fraction(&mut self, fraction: f32) -> EngineResult<u64> {
        let fraction = fraction.clamp(0.0, 1.0) as f64;
        let target = (self.playback.duration_ms as f64 * fraction) as u64;
        self.seek_to(target)
    }

    /// Handle one timer tick
    ///
    /// Ticks from a cancelled or replaced run are ignored. A live tick first
    /// checks for end-of-media, then samples the engine position once.
    /// Returns the newly published state, if any.
    pub fn poll(&mut self, token: TimerToken) -> Option<PlaybackState> {
        if !self.timer.is_current(token) || self.state != SyncState::Playing {
            log::trace!("Synchronizer: ignoring stale tick {:?}", token);
            return None;
        }

        if self.check_completion() {
            return Some(self.playback);
        }

        let position_ms = self.engine.current_position();
        self.publish(PlaybackState {
            position_ms,
            ..self.playback
        });
        Some(self.playback)
    }

    /// End-of-media: stop polling, reset to position 0, stop playing
    ///
    /// Applies regardless of the last polled position.
    pub fn complete(&mut self) {
        if self.state == SyncState::Idle {
            return;
        }
        self.timer.cancel();
        self.state = SyncState::Completed;
        self.publish(PlaybackState {
            position_ms: 0,
            is_playing: false,
            ..self.playback
        });
        log::info!("Synchronizer: playback completed");
    }

    /// Drain the engine's end-of-media notification outside a poll
    ///
    /// Returns `true` if a completion was applied.
    pub fn check_completion(&mut self) -> bool {
        if self.state == SyncState::Playing && self.engine.take_completion() {
            self.complete();
            true
        } else {
            false
        }
    }

    /// Stop polling, then release the engine and return to `Idle`
    pub fn release(&mut self) {
        self.timer.cancel();
        if self.state != SyncState::Idle {
            self.engine.release();
            log::info!("Synchronizer: released playback resource");
        }
        self.state = SyncState::Idle;
        self.publish(PlaybackState::default());
    }

    #[inline]
    pub fn state(&self) -> SyncState {
        self.state
    }

    #[inline]
    pub fn playback(&self) -> PlaybackState {
        self.playback
    }

    /// Normalized progress in `[0, 1]`
    #[inline]
    pub fn progress(&self) -> f32 {
        self.playback.progress_fraction()
    }

    /// Token of the running poll timer (only while playing)
    #[inline]
    pub fn timer_token(&self) -> Option<TimerToken> {
        self.timer.token()
    }

    #[inline]
    pub fn poll_interval(&self) -> Duration {
        self.timer.interval()
    }

    /// Receiver notified on every published state change
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.publisher.subscribe()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    fn publish(&mut self, playback: PlaybackState) {
        self.playback = playback;
        self.publisher.send_replace(playback);
    }
}

impl<E: PlaybackEngine> Drop for PlaybackSynchronizer<E> {
    fn drop(&mut self) {
        // Timer first, then the engine resource
        self.timer.cancel();
        if self.state != SyncState::Idle {
            self.engine.release();
        }
    }
}
