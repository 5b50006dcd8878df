//! Background envelope computation for waveform displays
//!
//! Building an envelope touches every sample of the buffer, which for a long
//! file is too slow for the UI thread. The [`EnvelopeComputer`] runs
//! [`build_envelope`] on a dedicated thread:
//!
//! 1. UI sends an [`EnvelopeRequest`] (buffer + target width)
//! 2. Background thread builds the envelope, skipping requests already
//!    superseded by newer ones in the queue
//! 3. UI receives [`EnvelopeResult`]s through [`mpsc_subscription`] or
//!    [`EnvelopeComputer::try_recv`]
//!
//! Requests are keyed by `(buffer_id, width)`. Asking again for the key that
//! was requested last is a no-op, so one key is never built twice in a row.
//!
//! ```ignore
//! let mut computer = EnvelopeComputer::spawn();
//! if let Some(request) = surface.resize(size) {
//!     computer.compute(request)?;
//! }
//!
//! // In subscription():
//! mpsc_subscription(computer.result_receiver()).map(Message::EnvelopeReady)
//! ```
//!
//! [`mpsc_subscription`]: crate::mpsc_subscription

use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use wavesync_core::audio_file::SampleBuffer;
use wavesync_core::envelope::{build_envelope, Envelope};

/// Identity of one envelope build: `(buffer_id, width)`
pub type EnvelopeKey = (u64, usize);

/// Request to build an envelope for a buffer at a pixel width
#[derive(Clone)]
pub struct EnvelopeRequest {
    pub buffer: Arc<SampleBuffer>,
    pub width: usize,
}

impl EnvelopeRequest {
    pub fn key(&self) -> EnvelopeKey {
        (self.buffer.id(), self.width)
    }
}

impl std::fmt::Debug for EnvelopeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeRequest")
            .field("buffer", &format!("<SampleBuffer #{} {} samples>", self.buffer.id(), self.buffer.len()))
            .field("width", &self.width)
            .finish()
    }
}

/// A finished envelope
#[derive(Debug, Clone)]
pub struct EnvelopeResult {
    pub envelope: Arc<Envelope>,
}

impl EnvelopeResult {
    pub fn key(&self) -> EnvelopeKey {
        (self.envelope.buffer_id(), self.envelope.len())
    }
}

/// Background thread for building envelopes
pub struct EnvelopeComputer {
    tx: Sender<EnvelopeRequest>,
    rx: Arc<Mutex<Receiver<EnvelopeResult>>>,
    last_key: Option<EnvelopeKey>,
    _handle: JoinHandle<()>,
}

impl EnvelopeComputer {
    /// Spawn the background envelope thread
    pub fn spawn() -> Self {
        let (request_tx, request_rx) = std::sync::mpsc::channel::<EnvelopeRequest>();
        let (result_tx, result_rx) = std::sync::mpsc::channel::<EnvelopeResult>();

        let handle = thread::Builder::new()
            .name("envelope-computer".to_string())
            .spawn(move || {
                envelope_thread(request_rx, result_tx);
            })
            .expect("Failed to spawn envelope computer thread");

        log::info!("EnvelopeComputer background thread started");

        Self {
            tx: request_tx,
            rx: Arc::new(Mutex::new(result_rx)),
            last_key: None,
            _handle: handle,
        }
    }

    /// Submit a build request (non-blocking)
    ///
    /// Returns `Ok(false)` when the same `(buffer, width)` was the last key
    /// requested; that build is in flight or already delivered.
    pub fn compute(&mut self, request: EnvelopeRequest) -> Result<bool, String> {
        let key = request.key();
        if self.last_key == Some(key) {
            log::debug!("EnvelopeComputer: {:?} already requested, skipping", key);
            return Ok(false);
        }

        self.tx
            .send(request)
            .map_err(|e| format!("Envelope computer thread disconnected: {}", e))?;
        self.last_key = Some(key);
        Ok(true)
    }

    /// Forget the last key so the next request is always submitted
    pub fn reset(&mut self) {
        self.last_key = None;
    }

    /// Try to receive a finished envelope (non-blocking)
    pub fn try_recv(&self) -> Option<EnvelopeResult> {
        let rx = self.rx.lock().ok()?;
        match rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::error!("Envelope computer thread disconnected unexpectedly");
                None
            }
        }
    }

    /// Shared result receiver, for [`mpsc_subscription`](crate::mpsc_subscription)
    pub fn result_receiver(&self) -> Arc<Mutex<Receiver<EnvelopeResult>>> {
        Arc::clone(&self.rx)
    }
}

fn envelope_thread(rx: Receiver<EnvelopeRequest>, tx: Sender<EnvelopeResult>) {
    log::debug!("Envelope computer thread starting");

    while let Ok(mut request) = rx.recv() {
        // Only the newest queued request matters
        while let Ok(newer) = rx.try_recv() {
            log::debug!("Envelope computer: {:?} superseded by {:?}", request.key(), newer.key());
            request = newer;
        }

        let start_time = Instant::now();
        let envelope = build_envelope(&request.buffer, request.width);
        log::debug!(
            "Envelope built for buffer {} at width {} in {:?}",
            request.buffer.id(),
            request.width,
            start_time.elapsed()
        );

        if tx
            .send(EnvelopeResult {
                envelope: Arc::new(envelope),
            })
            .is_err()
        {
            break;
        }
    }

    log::debug!("Envelope computer thread shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn wait_for(computer: &EnvelopeComputer) -> Option<EnvelopeResult> {
        for _ in 0..500 {
            if let Some(result) = computer.try_recv() {
                return Some(result);
            }
            thread::sleep(Duration::from_millis(2));
        }
        None
    }

    #[test]
    fn test_envelope_computer_spawn() {
        let computer = EnvelopeComputer::spawn();
        assert!(computer.try_recv().is_none());
    }

    #[test]
    fn test_builds_requested_width() {
        let mut computer = EnvelopeComputer::spawn();
        let buffer = Arc::new(SampleBuffer::from_samples(&[0; 4410]));
        assert_eq!(computer.compute(EnvelopeRequest { buffer: buffer.clone(), width: 200 }), Ok(true));

        let result = wait_for(&computer).expect("envelope result");
        assert_eq!(result.key(), (buffer.id(), 200));
        assert!(result.envelope.peaks().iter().all(|p| p.min == 0 && p.max == 0));
    }

    #[test]
    fn test_same_key_is_not_duplicated() {
        let mut computer = EnvelopeComputer::spawn();
        let buffer = Arc::new(SampleBuffer::from_samples(&[1; 100]));
        let request = EnvelopeRequest { buffer, width: 10 };

        assert_eq!(computer.compute(request.clone()), Ok(true));
        assert_eq!(computer.compute(request.clone()), Ok(false));

        assert!(wait_for(&computer).is_some());
        thread::sleep(Duration::from_millis(20));
        assert!(computer.try_recv().is_none());

        computer.reset();
        assert_eq!(computer.compute(request), Ok(true));
    }

    #[test]
    fn test_new_width_is_submitted() {
        let mut computer = EnvelopeComputer::spawn();
        let buffer = Arc::new(SampleBuffer::from_samples(&[1; 100]));
        assert_eq!(computer.compute(EnvelopeRequest { buffer: buffer.clone(), width: 10 }), Ok(true));
        assert_eq!(computer.compute(EnvelopeRequest { buffer, width: 20 }), Ok(true));
    }
}
