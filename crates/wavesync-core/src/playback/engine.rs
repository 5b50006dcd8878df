//! The playback engine seam
//!
//! The engine decodes and plays audio; the synchronizer only drives its
//! transport and samples its position. The engine is the source of truth for
//! valid positions: it clamps seeks into its own bounds.

use std::sync::Arc;

use super::error::EngineResult;
use crate::audio_file::SampleBuffer;

/// Transport and position interface of an audio playback backend
///
/// Implementations are owned exclusively by a
/// [`PlaybackSynchronizer`](super::PlaybackSynchronizer); nothing else touches them.
pub trait PlaybackEngine {
    /// Attach `source` and return its total duration in milliseconds
    ///
    /// On success any previously attached source is released before the new
    /// one is attached, and the position is 0 with playback stopped.
    /// On failure the previously attached source (if any) stays attached and
    /// keeps its position and transport state.
    fn prepare(&mut self, source: &Arc<SampleBuffer>) -> EngineResult<u64>;

    /// Start or resume playback from the current position
    fn play(&mut self);

    /// Pause playback, keeping the current position
    fn pause(&mut self);

    /// Move the play head; out-of-range positions are clamped by the engine
    fn seek_to(&mut self, position_ms: u64);

    /// Current play head position in milliseconds (a single cheap query)
    fn current_position(&self) -> u64;

    fn is_playing(&self) -> bool;

    /// Release the attached source and any device resources
    fn release(&mut self);

    /// End-of-media notification
    ///
    /// Returns `true` exactly once per playback run that reached the end of
    /// the source, then `false` until the next run ends.
    fn take_completion(&mut self) -> bool;
}

impl<E: PlaybackEngine + ?Sized> PlaybackEngine for Box<E> {
    fn prepare(&mut self, source: &Arc<SampleBuffer>) -> EngineResult<u64> {
        (**self).prepare(source)
    }

    fn play(&mut self) {
        (**self).play()
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn seek_to(&mut self, position_ms: u64) {
        (**self).seek_to(position_ms)
    }

    fn current_position(&self) -> u64 {
        (**self).current_position()
    }

    fn is_playing(&self) -> bool {
        (**self).is_playing()
    }

    fn release(&mut self) {
        (**self).release()
    }

    fn take_completion(&mut self) -> bool {
        (**self).take_completion()
    }
}
