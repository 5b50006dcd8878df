//! Application messages for wavesync-player

use iced::{Point, Size};
use wavesync_core::audio_file::{LoadResult, LoadedSource};
use wavesync_core::playback::TimerToken;
use wavesync_widgets::EnvelopeResult;

use crate::domain::{ErrorId, LoadTicket};

/// Messages that can be sent to the application
#[derive(Debug, Clone)]
pub enum Message {
    /// Path text field edited
    PathChanged(String),
    /// Load the file named in the path field
    OpenPath,
    /// Background file read finished
    SourceLoaded(LoadTicket, LoadResult<LoadedSource>),
    /// Background envelope build finished
    EnvelopeReady(EnvelopeResult),
    /// Poll timer fired (carries the token of its run)
    PollTick(TimerToken),
    TogglePlayPause,
    /// Timeline bar dragged to a playback fraction
    SeekFraction(f32),
    /// Press on the waveform (surface-local position, multi-touch flag)
    PointerDown(Point, bool),
    /// Multiplicative zoom change from pinch or wheel
    PinchScale(f32),
    /// Waveform canvas size changed
    Resized(Size),
    ZoomIn,
    ZoomOut,
    ResetZoom,
    /// Error display timeout elapsed
    ClearError(ErrorId),
    /// Release the source and return to the empty view
    ClearData,
}
