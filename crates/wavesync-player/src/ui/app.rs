//! Main iced application for wavesync-player
//!
//! Owns the domain session and the background envelope computer, and
//! translates messages into session calls:
//! - file reads run as one-shot tasks and resume through `SourceLoaded`
//! - envelope builds run on the computer thread and arrive as `EnvelopeReady`
//! - position polling runs only while playing, via a token-tagged timer

use std::path::PathBuf;

use iced::widget::{
    button, column, container, progress_bar, row, slider, text, text_input, Space,
};
use iced::{Center, Element, Fill, Subscription, Task, Theme};
use wavesync_core::audio_file::load_source;
use wavesync_widgets::{
    mpsc_subscription, poll_ticks, time_labels, waveform_view, EnvelopeComputer, EnvelopeRequest,
    ERROR_COLOR, LABEL_COLOR,
};

use super::message::Message;
use crate::audio::CpalEngine;
use crate::config::PlayerConfig;
use crate::domain::{SessionSettings, WaveformSession};

/// Zoom step for the zoom buttons
const ZOOM_BUTTON_STEP: f32 = 1.5;

/// Application state
pub struct WavesyncApp {
    session: WaveformSession<CpalEngine>,
    computer: EnvelopeComputer,
    config: PlayerConfig,
    /// Contents of the path field
    path_input: String,
}

impl WavesyncApp {
    /// Create the app; `initial_path` is loaded right away if given
    pub fn new(config: PlayerConfig, initial_path: Option<PathBuf>) -> (Self, Task<Message>) {
        let settings = SessionSettings {
            padding: config.display.padding(),
            min_envelope_width: config.display.min_envelope_width,
            default_zoom: config.display.default_zoom,
            poll_interval: config.playback.poll_interval(),
        };

        let mut app = Self {
            session: WaveformSession::new(CpalEngine::new(), settings),
            computer: EnvelopeComputer::spawn(),
            config,
            path_input: initial_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        };

        let task = match initial_path {
            Some(path) => app.start_load(path),
            None => Task::none(),
        };
        (app, task)
    }

    /// Update application state
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PathChanged(path) => {
                self.path_input = path;
                Task::none()
            }

            Message::OpenPath => {
                if !self.session.can_load() {
                    return Task::none();
                }
                let path = self.path_input.trim();
                if path.is_empty() {
                    return Task::none();
                }
                let path = PathBuf::from(path);
                self.start_load(path)
            }

            Message::SourceLoaded(ticket, result) => {
                let previous_error = self.session.error_id();
                if let Some(request) = self.session.finish_load(ticket, result) {
                    self.submit(request);
                }
                match self.session.error_id() {
                    Some(id) if Some(id) != previous_error => {
                        let timeout = self.config.display.error_timeout();
                        Task::perform(tokio::time::sleep(timeout), move |_| {
                            Message::ClearError(id)
                        })
                    }
                    _ => Task::none(),
                }
            }

            Message::EnvelopeReady(result) => {
                self.session.apply_envelope(result);
                Task::none()
            }

            Message::PollTick(token) => {
                self.session.poll(token);
                Task::none()
            }

            Message::TogglePlayPause => {
                self.session.toggle_play_pause();
                Task::none()
            }

            Message::SeekFraction(fraction) => {
                self.session.seek_to_fraction(fraction);
                Task::none()
            }

            Message::PointerDown(position, is_multi_touch) => {
                self.session
                    .on_pointer_down(position.x, position.y, is_multi_touch);
                Task::none()
            }

            Message::PinchScale(scale) => {
                self.session.on_pinch_scale(scale);
                Task::none()
            }

            Message::Resized(size) => {
                if let Some(request) = self.session.on_resize(size.width, size.height) {
                    self.submit(request);
                }
                Task::none()
            }

            Message::ZoomIn => {
                let factor = self.session.zoom().factor() * ZOOM_BUTTON_STEP;
                self.session.set_zoom(factor);
                Task::none()
            }

            Message::ZoomOut => {
                let factor = self.session.zoom().factor() / ZOOM_BUTTON_STEP;
                self.session.set_zoom(factor);
                Task::none()
            }

            Message::ResetZoom => {
                self.session.reset_zoom();
                Task::none()
            }

            Message::ClearError(id) => {
                self.session.clear_error_if(id);
                Task::none()
            }

            Message::ClearData => {
                self.session.clear_data();
                self.computer.reset();
                Task::none()
            }
        }
    }

    /// Read the file off the UI thread; the result resumes via `SourceLoaded`
    fn start_load(&mut self, path: PathBuf) -> Task<Message> {
        let ticket = self.session.begin_load();
        log::info!("Loading {:?}", path);
        Task::perform(async move { load_source(&path) }, move |result| {
            Message::SourceLoaded(ticket, result)
        })
    }

    fn submit(&mut self, request: EnvelopeRequest) {
        if let Err(e) = self.computer.compute(request) {
            log::error!("{}", e);
        }
    }

    /// Envelope results always; poll ticks only while playing
    pub fn subscription(&self) -> Subscription<Message> {
        let envelopes =
            mpsc_subscription(self.computer.result_receiver()).map(Message::EnvelopeReady);

        match self.session.timer_token() {
            Some(token) => Subscription::batch([
                envelopes,
                poll_ticks(token, self.session.poll_interval()).map(Message::PollTick),
            ]),
            None => envelopes,
        }
    }

    /// Build the view
    pub fn view(&self) -> Element<'_, Message> {
        let header = self.view_header();

        let waveform = waveform_view(
            self.session.surface(),
            self.session.zoom(),
            self.session.progress(),
            Message::PointerDown,
            Message::PinchScale,
            Message::Resized,
        );

        let playback = self.session.playback();
        let labels = time_labels(playback.position_ms, playback.duration_ms);

        // Timeline: draggable once a source is loaded
        let timeline: Element<'_, Message> = if self.session.has_data() {
            slider(0.0..=1.0, self.session.progress(), Message::SeekFraction)
                .step(0.001)
                .width(Fill)
                .into()
        } else {
            progress_bar(0.0..=1.0, 0.0).into()
        };

        let status_text = if self.session.is_loading() {
            "Loading...".to_string()
        } else {
            self.session.last_status().unwrap_or("No file loaded").to_string()
        };
        let status_bar = container(text(status_text).size(12).color(LABEL_COLOR)).padding(5);

        let mut content = column![header].spacing(10).padding(10);
        if let Some(error) = self.session.last_error() {
            content = content.push(text(error.to_string()).size(14).color(ERROR_COLOR));
        }
        content = content
            .push(container(waveform).width(Fill).height(Fill))
            .push(timeline)
            .push(labels)
            .push(status_bar);

        container(content).width(Fill).height(Fill).into()
    }

    /// Path field, transport and zoom controls
    fn view_header(&self) -> Element<'_, Message> {
        let title = text(self.session.file_name().unwrap_or("WAVESYNC")).size(20);

        let path_field = text_input("Path to a 16-bit mono PCM or WAV file", &self.path_input)
            .on_input(Message::PathChanged)
            .on_submit(Message::OpenPath)
            .width(360);

        let open = button(text("Open"))
            .on_press_maybe(self.session.can_load().then_some(Message::OpenPath));

        let play_label = if self.session.is_playing() { "Pause" } else { "Play" };
        let play = button(text(play_label))
            .on_press_maybe(self.session.can_play().then_some(Message::TogglePlayPause));

        let zoom_label = text(format!("{:.1}x", self.session.zoom().factor())).size(14);

        let clear = button(text("Clear"))
            .on_press_maybe(self.session.has_data().then_some(Message::ClearData));

        row![
            title,
            Space::new().width(Fill),
            path_field,
            open,
            play,
            Space::new().width(20),
            button(text("-")).on_press(Message::ZoomOut),
            zoom_label,
            button(text("+")).on_press(Message::ZoomIn),
            button(text("1x")).on_press(Message::ResetZoom),
            Space::new().width(20),
            clear,
        ]
        .spacing(10)
        .align_y(Center)
        .into()
    }

    /// Get the theme
    pub fn theme(&self) -> Theme {
        Theme::Dark
    }
}
