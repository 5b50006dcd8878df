//! Domain layer for wavesync-player
//!
//! Separates the UI from the pieces it drives:
//! - **UI Layer**: iced messages, view and subscriptions only
//! - **Domain Layer**: load state machine, playback sync, zoom and surface state
//! - **Service Layer**: file loader, envelope computer, playback engine
//!
//! ## Loading
//!
//! ```text
//!  Idle ──begin_load──► Loading ──finish_load(Ok)──► Ready
//!                          │
//!                          └──finish_load(Err)──► Failed (or back to Ready
//!                                                 if a source was loaded before)
//! ```
//!
//! File I/O runs off the UI thread; its result comes back through exactly
//! one `finish_load` call carrying the ticket from `begin_load`. A result
//! whose ticket was superseded by a newer load is dropped.
//!
//! A failed load or reload never touches the source that is already loaded:
//! its envelope, playback position and transport state stay as they were.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use wavesync_core::audio_file::{LoadResult, LoadedSource};
use wavesync_core::envelope::Envelope;
use wavesync_core::playback::{
    PlaybackEngine, PlaybackState, PlaybackSynchronizer, SyncState, TimerToken,
};
use wavesync_core::time::format_time;
use wavesync_core::SourceError;
use wavesync_widgets::{
    EnvelopeRequest, EnvelopeResult, RenderSurface, SurfacePadding, ZoomController, ZoomState,
};

/// Where the session is in the load cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Nothing loaded yet (or data cleared)
    Idle,
    /// A load is in flight
    Loading,
    /// A source is loaded and prepared
    Ready,
    /// The last load failed and nothing is loaded
    Failed,
}

/// Identifies one `begin_load` .. `finish_load` round trip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Identifies one surfaced error, so a timed clear only removes its own error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorId(u64);

/// Display settings the session needs at construction
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub padding: SurfacePadding,
    pub min_envelope_width: usize,
    pub default_zoom: f32,
    pub poll_interval: Duration,
}

/// Waveform view state plus the playback it mirrors
pub struct WaveformSession<E: PlaybackEngine> {
    sync: PlaybackSynchronizer<E>,
    surface: RenderSurface,
    zoom: ZoomController,
    status: LoadStatus,
    file_name: Option<String>,
    last_error: Option<(ErrorId, String)>,
    last_status: Option<String>,
    load_counter: u64,
    pending_load: Option<LoadTicket>,
    error_counter: u64,
}

impl<E: PlaybackEngine> WaveformSession<E> {
    pub fn new(engine: E, settings: SessionSettings) -> Self {
        Self {
            sync: PlaybackSynchronizer::new(engine, settings.poll_interval),
            surface: RenderSurface::new(settings.padding, settings.min_envelope_width),
            zoom: ZoomController::new(settings.default_zoom),
            status: LoadStatus::Idle,
            file_name: None,
            last_error: None,
            last_status: None,
            load_counter: 0,
            pending_load: None,
            error_counter: 0,
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Mark a load as started and get its ticket
    ///
    /// The current source stays loaded and playable until the new one is
    /// ready; only a previous load error is cleared. A newer `begin_load`
    /// supersedes this ticket.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.last_error = None;
        self.load_counter += 1;
        let ticket = LoadTicket(self.load_counter);
        self.pending_load = Some(ticket);
        self.status = LoadStatus::Loading;
        log::debug!("Session: load {:?} started", ticket);
        ticket
    }

    /// Complete a load started with `begin_load`
    ///
    /// Prepares the playback engine and, on success, replaces the source and
    /// returns the envelope build request for it. On failure the error is
    /// surfaced and the previous source (if any) is kept.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: LoadResult<LoadedSource>,
    ) -> Option<EnvelopeRequest> {
        if self.pending_load != Some(ticket) {
            log::debug!("Session: dropping superseded load {:?}", ticket);
            return None;
        }
        self.pending_load = None;

        match self.attach(result) {
            Ok(request) => Some(request),
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    fn attach(&mut self, result: LoadResult<LoadedSource>) -> Result<EnvelopeRequest, SourceError> {
        let source = result?;
        let duration_ms = self.sync.prepare(&source.buffer)?;

        let request = self.surface.set_source(Arc::clone(&source.buffer));
        self.status = LoadStatus::Ready;
        self.last_error = None;
        log::debug!("Session: attached {:?}", source.path);
        self.report(format!(
            "Loaded {} ({})",
            display_name(&source.file_name),
            format_time(duration_ms)
        ));
        self.file_name = Some(source.file_name);
        Ok(request)
    }

    fn fail(&mut self, error: SourceError) {
        let message = error.user_message();
        log::warn!("Session: {}", message);

        self.error_counter += 1;
        self.last_error = Some((ErrorId(self.error_counter), message));
        self.status = if self.has_data() {
            LoadStatus::Ready
        } else {
            LoadStatus::Failed
        };
    }

    /// Install a finished envelope; stale results are dropped
    pub fn apply_envelope(&mut self, result: EnvelopeResult) -> bool {
        let applied = self.surface.apply_envelope(result.envelope);
        if applied {
            log::info!(
                "Session: envelope ready ({} columns)",
                self.surface.envelope().map(|e| e.len()).unwrap_or(0)
            );
        }
        applied
    }

    // =========================================================================
    // Transport
    // =========================================================================

    /// Toggle play/pause; ignored while nothing is loaded or a load runs
    pub fn toggle_play_pause(&mut self) {
        if !self.can_play() {
            log::debug!("Session: toggle ignored (status {:?})", self.status);
            return;
        }
        let from = self.formatted_position();
        match self.sync.toggle() {
            Ok(true) => self.report(format!("Audio playing from {}", from)),
            Ok(false) => self.report(format!("Audio paused at {}", self.formatted_position())),
            Err(e) => log::warn!("Session: toggle failed: {}", e),
        }
    }

    /// Seek to `floor(duration * fraction)`; ignored while nothing is loaded
    pub fn seek_to_fraction(&mut self, fraction: f32) -> Option<u64> {
        if !self.has_data() {
            return None;
        }
        match self.sync.seek_to_fraction(fraction) {
            Ok(position_ms) => {
                self.report(format!("Skip to {}", format_time(position_ms)));
                Some(position_ms)
            }
            Err(e) => {
                log::warn!("Session: seek failed: {}", e);
                None
            }
        }
    }

    /// Handle one poll timer tick
    pub fn poll(&mut self, token: TimerToken) -> Option<PlaybackState> {
        let before = self.sync.state();
        let published = self.sync.poll(token);
        if before == SyncState::Playing && self.sync.state() == SyncState::Completed {
            self.report("Playback completed".to_string());
        }
        published
    }

    // =========================================================================
    // Viewport input
    // =========================================================================

    /// Returns whether the zoom changed (a redraw is needed)
    pub fn set_zoom(&mut self, factor: f32) -> bool {
        self.zoom.set_zoom(factor)
    }

    pub fn on_pinch_scale(&mut self, scale_delta: f32) -> bool {
        self.zoom.on_pinch_scale(scale_delta)
    }

    /// Back to the configured startup zoom
    pub fn reset_zoom(&mut self) -> bool {
        self.zoom.reset()
    }

    /// Record a new surface size; returns a rebuild request on width changes
    pub fn on_resize(&mut self, width: f32, height: f32) -> Option<EnvelopeRequest> {
        self.surface.resize(iced::Size::new(width, height))
    }

    /// Single-point press seeks; multi-touch is left to pinch-zoom
    pub fn on_pointer_down(&mut self, x: f32, _y: f32, is_multi_touch: bool) -> Option<u64> {
        let geometry = self.surface.geometry(self.zoom.zoom())?;
        let fraction = geometry.pointer_seek(x, is_multi_touch)?;
        self.seek_to_fraction(fraction)
    }

    // =========================================================================
    // Reset
    // =========================================================================

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Clear the error only if it is still the one identified by `id`
    pub fn clear_error_if(&mut self, id: ErrorId) {
        if self.error_id() == Some(id) {
            self.last_error = None;
        }
    }

    /// Stop playback, drop source and envelope, back to `Idle`
    ///
    /// Zoom is kept.
    pub fn clear_data(&mut self) {
        self.sync.release();
        self.surface.clear();
        self.file_name = None;
        self.pending_load = None;
        self.status = LoadStatus::Idle;
        self.report("Data cleared".to_string());
    }

    fn report(&mut self, status: String) {
        log::info!("{}", status);
        self.last_status = Some(status);
    }

    // =========================================================================
    // Observable state
    // =========================================================================

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    /// A source is loaded and prepared
    pub fn has_data(&self) -> bool {
        self.surface.source().is_some()
    }

    /// Whether a new load may be started
    pub fn can_load(&self) -> bool {
        !self.is_loading()
    }

    /// Whether play/pause is available
    pub fn can_play(&self) -> bool {
        self.has_data() && !self.is_loading()
    }

    pub fn has_error(&self) -> bool {
        self.last_error.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_ref().map(|(_, message)| message.as_str())
    }

    pub fn error_id(&self) -> Option<ErrorId> {
        self.last_error.as_ref().map(|(id, _)| *id)
    }

    pub fn last_status(&self) -> Option<&str> {
        self.last_status.as_deref()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn envelope(&self) -> Option<&Arc<Envelope>> {
        self.surface.envelope()
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    pub fn zoom(&self) -> ZoomState {
        self.zoom.zoom()
    }

    pub fn playback(&self) -> PlaybackState {
        self.sync.playback()
    }

    pub fn progress(&self) -> f32 {
        self.sync.progress()
    }

    pub fn is_playing(&self) -> bool {
        self.sync.playback().is_playing
    }

    pub fn formatted_position(&self) -> String {
        format_time(self.sync.playback().position_ms)
    }

    pub fn formatted_duration(&self) -> String {
        format_time(self.sync.playback().duration_ms)
    }

    pub fn timer_token(&self) -> Option<TimerToken> {
        self.sync.timer_token()
    }

    pub fn poll_interval(&self) -> Duration {
        self.sync.poll_interval()
    }

    /// Change notifications for the published playback state
    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.sync.subscribe()
    }

    #[cfg(test)]
    fn engine_mut(&mut self) -> &mut E {
        self.sync.engine_mut()
    }
}

fn display_name(file_name: &str) -> &str {
    if file_name.is_empty() {
        "source"
    } else {
        file_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wavesync_core::audio_file::{load_source, LoadError};
    use wavesync_core::envelope::{build_envelope, Peak};
    use wavesync_core::playback::mock::{EngineCall, ScriptedEngine};
    use wavesync_core::types::SAMPLE_RATE;

    fn settings() -> SessionSettings {
        SessionSettings {
            padding: SurfacePadding::default(),
            min_envelope_width: 100,
            default_zoom: 1.0,
            poll_interval: Duration::from_millis(50),
        }
    }

    fn session() -> WaveformSession<ScriptedEngine> {
        WaveformSession::new(ScriptedEngine::new(), settings())
    }

    fn silent_source(seconds: usize, name: &str) -> LoadedSource {
        LoadedSource::from_bytes(vec![0u8; SAMPLE_RATE as usize * 2 * seconds], name)
    }

    /// Build synchronously what the background computer would build
    fn complete(session: &mut WaveformSession<ScriptedEngine>, request: EnvelopeRequest) {
        let envelope = build_envelope(&request.buffer, request.width);
        assert!(session.apply_envelope(EnvelopeResult {
            envelope: Arc::new(envelope),
        }));
    }

    fn load(session: &mut WaveformSession<ScriptedEngine>, source: LoadedSource) {
        let ticket = session.begin_load();
        let request = session.finish_load(ticket, Ok(source)).expect("load succeeds");
        complete(session, request);
    }

    #[test]
    fn test_end_to_end_silent_source() {
        let mut session = session();
        // Drawable width 200 at 50 px padding
        assert!(session.on_resize(300.0, 400.0).is_none());

        let ticket = session.begin_load();
        assert!(session.is_loading());
        let request = session
            .finish_load(ticket, Ok(silent_source(2, "silence.pcm")))
            .unwrap();
        assert_eq!(request.width, 200);
        complete(&mut session, request);

        let envelope = session.envelope().unwrap();
        assert_eq!(envelope.len(), 200);
        assert!(envelope.peaks().iter().all(|&p| p == Peak::SILENT));
        assert_eq!(session.playback().duration_ms, 2000);
        assert_eq!(session.formatted_duration(), "0:02");

        session.toggle_play_pause();
        let token = session.timer_token().unwrap();
        session.engine_mut().queue_positions([50, 100, 150]);
        for _ in 0..3 {
            session.poll(token);
        }

        assert_eq!(session.playback().position_ms, 150);
        assert!((session.progress() - 0.075).abs() < 1e-6);
    }

    #[test]
    fn test_load_from_disk_with_wav_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..SAMPLE_RATE {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let mut session = session();
        let ticket = session.begin_load();
        session.finish_load(ticket, load_source(&path)).unwrap();

        assert_eq!(session.file_name(), Some("tone.wav"));
        assert_eq!(session.playback().duration_ms, 1000);
        assert_eq!(session.status(), LoadStatus::Ready);
        assert_eq!(session.last_status(), Some("Loaded tone.wav (0:01)"));
    }

    #[test]
    fn test_unreadable_source_surfaces_error() {
        let mut session = session();
        let ticket = session.begin_load();
        let result = load_source("/nonexistent/wavesync/missing.pcm");

        assert!(session.finish_load(ticket, result).is_none());

        assert_eq!(session.status(), LoadStatus::Failed);
        assert!(!session.has_data());
        assert!(session.envelope().is_none());
        assert!(session.last_error().unwrap().starts_with("Cannot load file: "));
    }

    #[test]
    fn test_failed_reload_keeps_previous_state() {
        let mut session = session();
        session.on_resize(1000.0, 400.0);
        load(&mut session, silent_source(2, "first.pcm"));
        session.toggle_play_pause();
        let token = session.timer_token().unwrap();
        session.engine_mut().queue_positions([700]);
        session.poll(token);

        session.engine_mut().reject_next_prepare("unsupported");
        let ticket = session.begin_load();
        assert!(session.has_data());
        assert!(session.finish_load(ticket, Ok(silent_source(1, "second.pcm"))).is_none());

        assert_eq!(session.status(), LoadStatus::Ready);
        assert_eq!(session.file_name(), Some("first.pcm"));
        assert_eq!(session.envelope().unwrap().len(), 900);
        assert_eq!(session.playback().position_ms, 700);
        assert!(session.is_playing());
        assert!(session.has_error());
    }

    #[test]
    fn test_successful_load_clears_previous_error() {
        let mut session = session();
        let ticket = session.begin_load();
        session.finish_load(ticket, Err(LoadError::SourceUnreadable("gone".into())));
        assert!(session.has_error());

        let ticket = session.begin_load();
        assert!(!session.has_error());
        session.finish_load(ticket, Ok(silent_source(1, "ok.pcm"))).unwrap();

        assert!(!session.has_error());
        assert_eq!(session.status(), LoadStatus::Ready);
    }

    #[test]
    fn test_error_from_engine_clears_on_next_success() {
        let mut session = session();
        session.engine_mut().reject_next_prepare("unsupported");
        let ticket = session.begin_load();
        session.finish_load(ticket, Ok(silent_source(1, "bad.pcm")));
        assert!(session.has_error());
        assert_eq!(session.status(), LoadStatus::Failed);

        load(&mut session, silent_source(1, "good.pcm"));
        assert!(!session.has_error());
        assert_eq!(session.file_name(), Some("good.pcm"));
    }

    #[test]
    fn test_superseded_load_is_dropped() {
        let mut session = session();
        let first = session.begin_load();
        let second = session.begin_load();

        assert!(session.finish_load(first, Ok(silent_source(1, "old.pcm"))).is_none());
        assert!(!session.has_data());
        assert!(session.is_loading());

        assert!(session.finish_load(second, Ok(silent_source(1, "new.pcm"))).is_some());
        assert_eq!(session.file_name(), Some("new.pcm"));
    }

    #[test]
    fn test_reload_replaces_envelope_and_keeps_zoom() {
        let mut session = session();
        session.on_resize(1000.0, 400.0);
        load(&mut session, silent_source(1, "a.pcm"));
        assert!(session.set_zoom(4.0));

        let ticket = session.begin_load();
        let request = session
            .finish_load(ticket, Ok(silent_source(2, "b.pcm")))
            .unwrap();
        // Envelope goes with the old buffer
        assert!(session.envelope().is_none());
        complete(&mut session, request);

        assert_eq!(session.zoom().factor(), 4.0);
        assert_eq!(session.playback().position_ms, 0);
        assert_eq!(session.playback().duration_ms, 2000);
    }

    #[test]
    fn test_toggle_without_data_is_ignored() {
        let mut session = session();
        session.toggle_play_pause();
        assert!(session.timer_token().is_none());
        assert!(session.last_status().is_none());
    }

    #[test]
    fn test_controls_locked_while_loading() {
        let mut session = session();
        assert!(session.can_load());
        assert!(!session.can_play());

        load(&mut session, silent_source(1, "a.pcm"));
        assert!(session.can_play());

        let ticket = session.begin_load();
        assert!(!session.can_load());
        assert!(!session.can_play());
        session.toggle_play_pause();
        assert!(!session.is_playing());

        session.finish_load(ticket, Ok(silent_source(1, "b.pcm"))).unwrap();
        assert!(session.can_load());
        assert!(session.can_play());
    }

    #[test]
    fn test_pointer_down_seeks_unless_multi_touch() {
        let mut session = session();
        session.on_resize(1000.0, 400.0);
        load(&mut session, silent_source(20, "long.pcm"));

        // Halfway across the drawable area
        assert_eq!(session.on_pointer_down(500.0, 10.0, true), None);
        assert_eq!(session.on_pointer_down(500.0, 10.0, false), Some(10_000));
        assert_eq!(session.playback().position_ms, 10_000);
        assert!(!session.is_playing());
    }

    #[test]
    fn test_pointer_down_without_data() {
        let mut session = session();
        session.on_resize(1000.0, 400.0);
        assert_eq!(session.on_pointer_down(500.0, 10.0, false), None);
        assert_eq!(session.seek_to_fraction(0.5), None);
    }

    #[test]
    fn test_seek_fraction_floors() {
        let mut session = session();
        load(&mut session, LoadedSource::from_bytes(vec![0u8; 2 * 441 * 3], "short.pcm"));
        assert_eq!(session.playback().duration_ms, 30);
        assert_eq!(session.seek_to_fraction(0.5), Some(15));
        assert_eq!(session.seek_to_fraction(0.33), Some(9));
    }

    #[test]
    fn test_resize_height_only_does_not_rebuild() {
        let mut session = session();
        session.on_resize(1000.0, 400.0);
        load(&mut session, silent_source(1, "a.pcm"));

        assert!(session.on_resize(1000.0, 300.0).is_none());
        let request = session.on_resize(600.0, 300.0).unwrap();
        assert_eq!(request.width, 500);

        // A narrow window still gets a usable envelope
        let request = session.on_resize(120.0, 300.0).unwrap();
        assert_eq!(request.width, 100);
    }

    #[test]
    fn test_completion_reports_and_resets() {
        let mut session = session();
        load(&mut session, silent_source(2, "a.pcm"));
        session.toggle_play_pause();
        let token = session.timer_token().unwrap();
        session.engine_mut().queue_positions([1950]);
        session.poll(token);

        session.engine_mut().finish_playback();
        session.poll(token);

        assert_eq!(session.playback().position_ms, 0);
        assert!(!session.is_playing());
        assert_eq!(session.last_status(), Some("Playback completed"));
        assert!(session.timer_token().is_none());
    }

    #[test]
    fn test_pause_reports_position() {
        let mut session = session();
        load(&mut session, silent_source(20, "a.pcm"));
        session.toggle_play_pause();
        let token = session.timer_token().unwrap();
        session.engine_mut().queue_positions([12_000]);
        session.poll(token);
        session.toggle_play_pause();

        assert_eq!(session.last_status(), Some("Audio paused at 0:12"));
        assert_eq!(session.formatted_position(), "0:12");

        session.toggle_play_pause();
        assert_eq!(session.last_status(), Some("Audio playing from 0:12"));
    }

    #[test]
    fn test_seek_reports_target() {
        let mut session = session();
        load(&mut session, silent_source(90, "a.pcm"));
        assert_eq!(session.seek_to_fraction(0.5), Some(45_000));
        assert_eq!(session.last_status(), Some("Skip to 0:45"));
    }

    #[test]
    fn test_reset_zoom_returns_to_startup_zoom() {
        let mut session = WaveformSession::new(
            ScriptedEngine::new(),
            SessionSettings {
                default_zoom: 2.0,
                ..settings()
            },
        );
        assert!(session.set_zoom(8.0));
        assert!(session.reset_zoom());
        assert_eq!(session.zoom().factor(), 2.0);
        assert!(!session.reset_zoom());
    }

    #[test]
    fn test_clear_data_releases_engine() {
        let mut session = session();
        load(&mut session, silent_source(1, "a.pcm"));
        session.set_zoom(2.0);
        session.clear_data();

        assert_eq!(session.status(), LoadStatus::Idle);
        assert!(!session.has_data());
        assert!(session.envelope().is_none());
        assert_eq!(session.file_name(), None);
        assert_eq!(session.playback(), PlaybackState::default());
        assert_eq!(session.zoom().factor(), 2.0);
        assert_eq!(session.engine_mut().calls().last(), Some(&EngineCall::Release));
    }

    #[test]
    fn test_timed_clear_only_removes_its_own_error() {
        let mut session = session();
        let ticket = session.begin_load();
        session.finish_load(ticket, Err(LoadError::SourceUnreadable("a".into())));
        let first = session.error_id().unwrap();

        let ticket = session.begin_load();
        session.finish_load(ticket, Err(LoadError::SourceUnreadable("b".into())));

        session.clear_error_if(first);
        assert!(session.has_error());
        assert!(session.last_error().unwrap().ends_with(": b"));

        session.clear_error();
        assert!(!session.has_error());
    }

    #[test]
    fn test_stale_envelope_after_reload_is_dropped() {
        let mut session = session();
        session.on_resize(1000.0, 400.0);
        let ticket = session.begin_load();
        let old_request = session.finish_load(ticket, Ok(silent_source(1, "a.pcm"))).unwrap();

        let ticket = session.begin_load();
        session.finish_load(ticket, Ok(silent_source(1, "b.pcm"))).unwrap();

        let stale = build_envelope(&old_request.buffer, old_request.width);
        assert!(!session.apply_envelope(EnvelopeResult {
            envelope: Arc::new(stale),
        }));
        assert!(session.envelope().is_none());
    }

    #[test]
    fn test_publishes_to_subscribers() {
        let mut session = session();
        let mut rx = session.subscribe();
        load(&mut session, silent_source(1, "a.pcm"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().duration_ms, 1000);
    }
}
