//! Scripted playback engine for tests and headless runs
//!
//! Reports positions from a queue instead of a clock, can be told to reject
//! the next prepare, and raises end-of-media on demand.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::sync::Arc;

use super::engine::PlaybackEngine;
use super::error::{EngineError, EngineResult};
use crate::audio_file::SampleBuffer;

/// Transport call recorded by [`ScriptedEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCall {
    /// Prepare of the buffer with this id
    Prepare(u64),
    Play,
    Pause,
    SeekTo(u64),
    Release,
}

/// Engine whose positions, rejections and completions are scripted
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    attached: Option<u64>,
    duration_override: Option<u64>,
    duration_ms: u64,
    position: Cell<u64>,
    scripted_positions: RefCell<VecDeque<u64>>,
    playing: bool,
    reject_next: Option<String>,
    completion_pending: bool,
    calls: Vec<EngineCall>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `duration_ms` from every prepare instead of the buffer length
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_override = Some(duration_ms);
        self
    }

    /// Positions returned by the next `current_position` calls, in order
    pub fn queue_positions(&mut self, positions: impl IntoIterator<Item = u64>) {
        self.scripted_positions.borrow_mut().extend(positions);
    }

    /// Make the next `prepare` fail with `DecodeRejected(reason)`
    pub fn reject_next_prepare(&mut self, reason: impl Into<String>) {
        self.reject_next = Some(reason.into());
    }

    /// Raise end-of-media as the audio backend would at the end of a run
    pub fn finish_playback(&mut self) {
        self.playing = false;
        self.completion_pending = true;
    }

    /// Every transport call made so far
    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    /// Id of the attached buffer
    pub fn attached(&self) -> Option<u64> {
        self.attached
    }
}

impl PlaybackEngine for ScriptedEngine {
    fn prepare(&mut self, source: &Arc<SampleBuffer>) -> EngineResult<u64> {
        self.calls.push(EngineCall::Prepare(source.id()));
        if let Some(reason) = self.reject_next.take() {
            return Err(EngineError::DecodeRejected(reason));
        }

        self.attached = Some(source.id());
        self.duration_ms = self.duration_override.unwrap_or_else(|| source.duration_ms());
        self.position.set(0);
        self.scripted_positions.borrow_mut().clear();
        self.playing = false;
        self.completion_pending = false;
        Ok(self.duration_ms)
    }

    fn play(&mut self) {
        self.calls.push(EngineCall::Play);
        if self.attached.is_some() {
            self.playing = true;
        }
    }

    fn pause(&mut self) {
        self.calls.push(EngineCall::Pause);
        self.playing = false;
    }

    fn seek_to(&mut self, position_ms: u64) {
        self.calls.push(EngineCall::SeekTo(position_ms));
        self.scripted_positions.borrow_mut().clear();
        self.position.set(position_ms.min(self.duration_ms));
    }

    fn current_position(&self) -> u64 {
        if let Some(next) = self.scripted_positions.borrow_mut().pop_front() {
            self.position.set(next.min(self.duration_ms));
        }
        self.position.get()
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn release(&mut self) {
        self.calls.push(EngineCall::Release);
        self.attached = None;
        self.playing = false;
        self.position.set(0);
        self.duration_ms = 0;
    }

    fn take_completion(&mut self) -> bool {
        std::mem::take(&mut self.completion_pending)
    }
}
