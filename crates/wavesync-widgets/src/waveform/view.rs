//! Waveform view functions
//!
//! Plain functions that take state references and callback closures and
//! return Elements.
//!
//! ```ignore
//! fn view(&self) -> Element<Message> {
//!     column![
//!         waveform_view(
//!             &self.surface,
//!             self.zoom.zoom(),
//!             self.progress,
//!             Message::PointerDown,
//!             Message::PinchScale,
//!             Message::Resized,
//!         ),
//!         time_labels(self.position_ms, self.duration_ms),
//!     ]
//!     .into()
//! }
//! ```

use iced::widget::{container, row, text, Canvas, Space};
use iced::{Element, Length, Point, Size};
use wavesync_core::time::format_time;

use super::canvas::WaveformCanvas;
use super::render::RenderSurface;
use super::viewport::ZoomState;
use crate::theme::LABEL_COLOR;

/// Font size of the time label row
const LABEL_SIZE: f32 = 14.0;

/// Create the waveform canvas filling the available space
///
/// * `on_pointer_down` - called with the surface-local press position and
///   whether more than one touch point is down
/// * `on_pinch` - called with a multiplicative zoom delta (touch pinch or wheel)
/// * `on_resize` - called whenever the canvas size changes
pub fn waveform_view<'a, Message>(
    surface: &'a RenderSurface,
    zoom: ZoomState,
    progress: f32,
    on_pointer_down: impl Fn(Point, bool) -> Message + 'a,
    on_pinch: impl Fn(f32) -> Message + 'a,
    on_resize: impl Fn(Size) -> Message + 'a,
) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    Canvas::new(WaveformCanvas {
        envelope: surface.envelope().map(|envelope| envelope.as_ref()),
        zoom,
        progress,
        padding: surface.padding(),
        on_pointer_down,
        on_pinch,
        on_resize,
    })
    .width(Length::Fill)
    .height(Length::Fill)
    .into()
}

/// Current position on the left, total duration on the right, both `m:ss`
pub fn time_labels<'a, Message>(position_ms: u64, duration_ms: u64) -> Element<'a, Message>
where
    Message: 'a,
{
    container(
        row![
            text(format_time(position_ms)).size(LABEL_SIZE).color(LABEL_COLOR),
            Space::new().width(Length::Fill),
            text(format_time(duration_ms)).size(LABEL_SIZE).color(LABEL_COLOR),
        ]
        .width(Length::Fill),
    )
    .padding([4, 12])
    .into()
}
