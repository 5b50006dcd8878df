//! cpal audio playback for wavesync-player
//!
//! Lock-free architecture:
//! - Commands sent via `rtrb` SPSC ringbuffer (UI → Audio)
//! - Position, play state and end-of-media read via atomics (Audio → UI)
//! - The output callback owns its source buffer and read head exclusively
//!
//! Every prepared source gets its own output stream. The new stream is built
//! and started before the previous one is dropped, so a failed prepare leaves
//! the running stream untouched.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};
use wavesync_core::audio_file::SampleBuffer;
use wavesync_core::playback::{EngineError, EngineResult, PlaybackEngine};
use wavesync_core::types::{ms_to_samples, samples_to_ms, SAMPLE_RATE};

/// Ring buffer capacity for transport commands
const COMMAND_CAPACITY: usize = 64;

/// Commands sent from UI to audio thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    Play,
    Pause,
    /// Move the read head (source samples)
    Seek(u64),
}

/// Create a playback command channel
pub fn command_channel() -> (rtrb::Producer<PlaybackCommand>, rtrb::Consumer<PlaybackCommand>) {
    rtrb::RingBuffer::new(COMMAND_CAPACITY)
}

/// Command sender for UI thread
pub struct CommandSender {
    producer: rtrb::Producer<PlaybackCommand>,
}

impl CommandSender {
    /// Send a command to the audio thread
    ///
    /// Returns Err if the queue is full (command dropped)
    pub fn send(&mut self, cmd: PlaybackCommand) -> Result<(), PlaybackCommand> {
        self.producer.push(cmd).map_err(|e| match e {
            rtrb::PushError::Full(value) => value,
        })
    }
}

/// Lock-free atomics for UI to read audio state
#[derive(Debug, Default)]
pub struct PlaybackAtomics {
    /// Read head in source samples
    pub position: AtomicU64,
    pub playing: AtomicBool,
    /// Set by the callback when a run reaches the end; cleared by the UI
    pub finished: AtomicBool,
    /// Number of seek commands the callback has applied
    pub seeks_applied: AtomicU64,
}

impl PlaybackAtomics {
    pub fn position(&self) -> u64 {
        self.position.load(Ordering::Relaxed)
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }
}

/// Audio-thread side of one prepared source
///
/// Owns the buffer exclusively; no sharing with the UI thread beyond the atomics.
struct SourceVoice {
    buffer: Arc<SampleBuffer>,
    command_rx: rtrb::Consumer<PlaybackCommand>,
    atomics: Arc<PlaybackAtomics>,
    /// Read head in source samples (fractional when device rate differs)
    head: f64,
    /// Source samples advanced per output frame
    step: f64,
    channels: usize,
    playing: bool,
}

impl SourceVoice {
    fn new(
        buffer: Arc<SampleBuffer>,
        command_rx: rtrb::Consumer<PlaybackCommand>,
        atomics: Arc<PlaybackAtomics>,
        device_rate: u32,
        channels: usize,
    ) -> Self {
        Self {
            buffer,
            command_rx,
            atomics,
            head: 0.0,
            step: SAMPLE_RATE as f64 / device_rate.max(1) as f64,
            channels: channels.max(1),
            playing: false,
        }
    }

    /// Process pending commands from UI
    fn process_commands(&mut self) {
        let len = self.buffer.len();
        while let Ok(cmd) = self.command_rx.pop() {
            match cmd {
                PlaybackCommand::Play => {
                    if len > 0 {
                        if self.head as usize >= len {
                            self.head = 0.0;
                        }
                        self.playing = true;
                        self.atomics.playing.store(true, Ordering::Relaxed);
                    }
                }
                PlaybackCommand::Pause => {
                    self.playing = false;
                    self.atomics.playing.store(false, Ordering::Relaxed);
                }
                PlaybackCommand::Seek(sample) => {
                    self.head = sample.min(len as u64) as f64;
                    self.atomics.position.store(self.head as u64, Ordering::Relaxed);
                    self.atomics.seeks_applied.fetch_add(1, Ordering::Release);
                }
            }
        }
    }

    fn render(&mut self, data: &mut [f32]) {
        self.process_commands();

        for frame in data.chunks_mut(self.channels) {
            let value = if self.playing {
                match self.buffer.sample(self.head as usize) {
                    Some(sample) => {
                        self.head += self.step;
                        sample as f32 / 32768.0
                    }
                    _ => {
                        self.finish();
                        0.0
                    }
                }
            } else {
                0.0
            };
            frame.fill(value);
        }

        if self.playing {
            self.atomics.position.store(self.head as u64, Ordering::Relaxed);
        }
    }

    /// End of media: stop, rewind, raise the completion flag once
    fn finish(&mut self) {
        self.playing = false;
        self.head = 0.0;
        self.atomics.position.store(0, Ordering::Relaxed);
        self.atomics.playing.store(false, Ordering::Relaxed);
        self.atomics.finished.store(true, Ordering::Release);
    }
}

/// UI-side record of seeks sent to one stream
///
/// Until the callback has applied every sent seek, the reported position is
/// the latest seek target rather than the (older) read head.
#[derive(Debug, Default)]
struct SeekAck {
    sent: u64,
    target_ms: u64,
}

impl SeekAck {
    fn record(&mut self, target_ms: u64) {
        self.sent += 1;
        self.target_ms = target_ms;
    }

    fn position_ms(&self, atomics: &PlaybackAtomics, duration_ms: u64) -> u64 {
        if atomics.seeks_applied.load(Ordering::Acquire) < self.sent {
            return self.target_ms;
        }
        samples_to_ms(atomics.position()).min(duration_ms)
    }
}

/// One live output stream and its UI-side handles
struct OutputStream {
    _stream: Stream,
    commands: CommandSender,
    atomics: Arc<PlaybackAtomics>,
    seeks: SeekAck,
    duration_ms: u64,
    buffer_id: u64,
}

/// [`PlaybackEngine`] over the default cpal output device
pub struct CpalEngine {
    host: cpal::Host,
    output: Option<OutputStream>,
}

impl CpalEngine {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
            output: None,
        }
    }

    fn send(&mut self, cmd: PlaybackCommand) {
        if let Some(output) = self.output.as_mut() {
            if let Err(cmd) = output.commands.send(cmd) {
                log::warn!("CpalEngine: command queue full, dropped {:?}", cmd);
            }
        }
    }

    fn open_stream(&self, buffer: &Arc<SampleBuffer>) -> EngineResult<OutputStream> {
        let device = self
            .host
            .default_output_device()
            .ok_or_else(|| EngineError::Device("no output device available".to_string()))?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let stream_config = output_config(&device)?;
        let channels = stream_config.channels as usize;
        let device_rate = stream_config.sample_rate.0;

        let (command_tx, command_rx) = command_channel();
        let atomics = Arc::new(PlaybackAtomics::default());
        let mut voice = SourceVoice::new(
            Arc::clone(buffer),
            command_rx,
            Arc::clone(&atomics),
            device_rate,
            channels,
        );

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                    voice.render(data);
                },
                move |err| {
                    log::error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| EngineError::Device(e.to_string()))?;
        stream.play().map_err(|e| EngineError::Device(e.to_string()))?;

        log::info!(
            "CpalEngine: stream open on {} ({} ch, {} Hz)",
            device_name,
            channels,
            device_rate
        );

        Ok(OutputStream {
            _stream: stream,
            commands: CommandSender {
                producer: command_tx,
            },
            atomics,
            seeks: SeekAck::default(),
            duration_ms: buffer.duration_ms(),
            buffer_id: buffer.id(),
        })
    }
}

impl Default for CpalEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick an f32 output configuration, preferring one that runs at 44.1 kHz
fn output_config(device: &cpal::Device) -> EngineResult<StreamConfig> {
    let supported: Vec<_> = device
        .supported_output_configs()
        .map_err(|e| EngineError::Device(e.to_string()))?
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .collect();

    let best = supported
        .iter()
        .find(|c| SAMPLE_RATE >= c.min_sample_rate().0 && SAMPLE_RATE <= c.max_sample_rate().0)
        .map(|c| c.clone().with_sample_rate(cpal::SampleRate(SAMPLE_RATE)))
        .or_else(|| supported.first().map(|c| c.clone().with_max_sample_rate()))
        .ok_or_else(|| EngineError::Device("no f32 output configuration".to_string()))?;

    Ok(best.config())
}

impl PlaybackEngine for CpalEngine {
    fn prepare(&mut self, source: &Arc<SampleBuffer>) -> EngineResult<u64> {
        if source.is_empty() {
            return Err(EngineError::DecodeRejected("source contains no samples".to_string()));
        }

        let output = self.open_stream(source)?;
        let duration_ms = output.duration_ms;

        if let Some(previous) = self.output.replace(output) {
            log::debug!("CpalEngine: released stream for buffer {}", previous.buffer_id);
        }

        log::info!("CpalEngine: prepared buffer {} ({} ms)", source.id(), duration_ms);
        Ok(duration_ms)
    }

    fn play(&mut self) {
        self.send(PlaybackCommand::Play);
    }

    fn pause(&mut self) {
        self.send(PlaybackCommand::Pause);
    }

    fn seek_to(&mut self, position_ms: u64) {
        let Some(output) = self.output.as_mut() else {
            return;
        };
        let position_ms = position_ms.min(output.duration_ms);
        match output.commands.send(PlaybackCommand::Seek(ms_to_samples(position_ms))) {
            Ok(()) => output.seeks.record(position_ms),
            Err(cmd) => log::warn!("CpalEngine: command queue full, dropped {:?}", cmd),
        }
    }

    fn current_position(&self) -> u64 {
        self.output
            .as_ref()
            .map_or(0, |o| o.seeks.position_ms(&o.atomics, o.duration_ms))
    }

    fn is_playing(&self) -> bool {
        self.output.as_ref().is_some_and(|o| o.atomics.is_playing())
    }

    fn release(&mut self) {
        if let Some(output) = self.output.take() {
            log::info!("CpalEngine: released stream for buffer {}", output.buffer_id);
        }
    }

    fn take_completion(&mut self) -> bool {
        self.output
            .as_ref()
            .is_some_and(|o| o.atomics.finished.swap(false, Ordering::AcqRel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(samples: &[i16], device_rate: u32) -> (SourceVoice, CommandSender, Arc<PlaybackAtomics>) {
        let (tx, rx) = command_channel();
        let atomics = Arc::new(PlaybackAtomics::default());
        let voice = SourceVoice::new(
            Arc::new(SampleBuffer::from_samples(samples)),
            rx,
            Arc::clone(&atomics),
            device_rate,
            2,
        );
        (voice, CommandSender { producer: tx }, atomics)
    }

    #[test]
    fn test_silent_until_play() {
        let (mut voice, _tx, atomics) = voice(&[16384; 8], SAMPLE_RATE);
        let mut out = [1.0f32; 8];
        voice.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(atomics.position(), 0);
    }

    #[test]
    fn test_plays_mono_to_all_channels() {
        let (mut voice, mut tx, atomics) = voice(&[16384, -16384, 0, 0], SAMPLE_RATE);
        tx.send(PlaybackCommand::Play).unwrap();
        let mut out = [0.0f32; 4];
        voice.render(&mut out);
        assert_eq!(out, [0.5, 0.5, -0.5, -0.5]);
        assert_eq!(atomics.position(), 2);
        assert!(atomics.is_playing());
    }

    #[test]
    fn test_completion_raised_once_and_rewinds() {
        let (mut voice, mut tx, atomics) = voice(&[100; 4], SAMPLE_RATE);
        tx.send(PlaybackCommand::Play).unwrap();
        let mut out = [0.0f32; 12];
        voice.render(&mut out);

        assert!(atomics.finished.swap(false, Ordering::AcqRel));
        assert!(!atomics.is_playing());
        assert_eq!(atomics.position(), 0);

        voice.render(&mut out);
        assert!(!atomics.finished.load(Ordering::Acquire));
    }

    #[test]
    fn test_seek_is_clamped_and_acknowledged() {
        let (mut voice, mut tx, atomics) = voice(&[0; 10], SAMPLE_RATE);
        tx.send(PlaybackCommand::Seek(500)).unwrap();
        voice.render(&mut [0.0f32; 2]);
        assert_eq!(atomics.position(), 10);
        assert_eq!(atomics.seeks_applied.load(Ordering::Acquire), 1);
    }

    #[test]
    fn test_seek_target_reported_until_applied() {
        // Two seconds of source
        let (mut voice, mut tx, atomics) = voice(&[0; 88_200], SAMPLE_RATE);
        let mut seeks = SeekAck::default();
        tx.send(PlaybackCommand::Play).unwrap();
        voice.render(&mut [0.0f32; 882]);
        assert_eq!(seeks.position_ms(&atomics, 2000), 10);

        tx.send(PlaybackCommand::Seek(ms_to_samples(1500))).unwrap();
        seeks.record(1500);
        // Callback has not run yet: the read head is still at 10 ms
        assert_eq!(atomics.position(), 441);
        assert_eq!(seeks.position_ms(&atomics, 2000), 1500);

        voice.render(&mut [0.0f32; 882]);
        assert_eq!(seeks.position_ms(&atomics, 2000), 1510);
    }

    #[test]
    fn test_seek_ack_waits_for_every_sent_seek() {
        let (mut voice, mut tx, atomics) = voice(&[0; 44_100], SAMPLE_RATE);
        let mut seeks = SeekAck::default();

        tx.send(PlaybackCommand::Seek(ms_to_samples(200))).unwrap();
        seeks.record(200);
        voice.render(&mut [0.0f32; 2]);
        tx.send(PlaybackCommand::Seek(ms_to_samples(700))).unwrap();
        seeks.record(700);

        assert_eq!(seeks.position_ms(&atomics, 1000), 700);
        voice.render(&mut [0.0f32; 2]);
        assert_eq!(seeks.position_ms(&atomics, 1000), 700);
    }

    #[test]
    fn test_step_follows_device_rate() {
        let (mut voice, mut tx, atomics) = voice(&[0; 1000], SAMPLE_RATE * 2);
        tx.send(PlaybackCommand::Play).unwrap();
        voice.render(&mut [0.0f32; 200]);
        // 100 frames at twice the source rate advance 50 source samples
        assert_eq!(atomics.position(), 50);
    }

    #[test]
    fn test_engine_rejects_empty_source() {
        let mut engine = CpalEngine::new();
        let empty = Arc::new(SampleBuffer::from_bytes(Vec::new()));
        assert!(matches!(engine.prepare(&empty), Err(EngineError::DecodeRejected(_))));
        assert_eq!(engine.current_position(), 0);
        assert!(!engine.take_completion());
    }
}
