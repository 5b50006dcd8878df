//! Canvas Program for the waveform surface
//!
//! Draws the output of [`render`] and translates raw input into three
//! callbacks: pointer down (with a multi-touch flag), pinch scale, and
//! surface resize. What a pointer press means is decided by the caller.

use iced::widget::canvas::{self, Event, Frame, Geometry, Path, Program, Stroke};
use iced::{mouse, touch, Point, Rectangle, Size, Theme};
use wavesync_core::envelope::Envelope;

use super::render::{render, SegmentKind, SurfacePadding};
use super::viewport::{ZoomState, WHEEL_ZOOM_STEP};
use crate::theme::{BACKGROUND_COLOR, MARKER_COLOR, WAVEFORM_COLOR};

/// Pixel scroll distance treated as one wheel line
const PIXELS_PER_WHEEL_LINE: f32 = 50.0;

/// Canvas state: active touch points, pinch baseline and last seen size
#[derive(Debug, Clone, Default)]
pub struct WaveformInteraction {
    fingers: Vec<(touch::Finger, Point)>,
    pinch_distance: Option<f32>,
    last_size: Option<Size>,
}

impl WaveformInteraction {
    /// Record `size`; returns it when it differs from the last one seen
    fn observe_size(&mut self, size: Size) -> Option<Size> {
        if self.last_size == Some(size) {
            return None;
        }
        self.last_size = Some(size);
        Some(size)
    }

    fn finger_distance(&self) -> Option<f32> {
        match self.fingers.as_slice() {
            [(_, a), (_, b), ..] => Some(a.distance(*b)),
            _ => None,
        }
    }
}

/// Canvas program for the zoomable waveform with a progress marker
pub struct WaveformCanvas<'a, Message, PointerFn, PinchFn, ResizeFn>
where
    PointerFn: Fn(Point, bool) -> Message,
    PinchFn: Fn(f32) -> Message,
    ResizeFn: Fn(Size) -> Message,
{
    /// `None` until the first envelope is built; nothing is drawn then
    pub envelope: Option<&'a Envelope>,
    pub zoom: ZoomState,
    pub progress: f32,
    pub padding: SurfacePadding,
    pub on_pointer_down: PointerFn,
    pub on_pinch: PinchFn,
    pub on_resize: ResizeFn,
}

impl<'a, Message, PointerFn, PinchFn, ResizeFn> WaveformCanvas<'a, Message, PointerFn, PinchFn, ResizeFn>
where
    PointerFn: Fn(Point, bool) -> Message,
    PinchFn: Fn(f32) -> Message,
    ResizeFn: Fn(Size) -> Message,
{
    /// One message per event: input first, a pending size change otherwise
    ///
    /// A size change seen together with a press is reported on the next
    /// event, so the press is never swallowed.
    fn message_for(
        &self,
        interaction: &mut WaveformInteraction,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<Message> {
        if let Some(message) = self.input_message(interaction, event, bounds, cursor) {
            return Some(message);
        }
        interaction.observe_size(bounds.size()).map(&self.on_resize)
    }

    fn input_message(
        &self,
        interaction: &mut WaveformInteraction,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<Message> {
        match event {
            Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                let position = cursor.position_in(bounds)?;
                Some((self.on_pointer_down)(position, false))
            }
            Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                cursor.position_in(bounds)?;
                let lines = match delta {
                    mouse::ScrollDelta::Lines { y, .. } => *y,
                    mouse::ScrollDelta::Pixels { y, .. } => *y / PIXELS_PER_WHEEL_LINE,
                };
                if lines == 0.0 {
                    return None;
                }
                Some((self.on_pinch)(WHEEL_ZOOM_STEP.powf(lines)))
            }
            Event::Touch(touch::Event::FingerPressed { id, position }) => {
                if !bounds.contains(*position) {
                    return None;
                }
                interaction.fingers.retain(|(finger, _)| finger != id);
                interaction.fingers.push((*id, *position));
                let is_multi_touch = interaction.fingers.len() > 1;
                if is_multi_touch {
                    interaction.pinch_distance = interaction.finger_distance();
                }
                let local = Point::new(position.x - bounds.x, position.y - bounds.y);
                Some((self.on_pointer_down)(local, is_multi_touch))
            }
            Event::Touch(touch::Event::FingerMoved { id, position }) => {
                let finger = interaction.fingers.iter_mut().find(|(finger, _)| finger == id)?;
                finger.1 = *position;

                let previous = interaction.pinch_distance?;
                let current = interaction.finger_distance()?;
                if previous <= 0.0 || current <= 0.0 {
                    return None;
                }
                interaction.pinch_distance = Some(current);
                Some((self.on_pinch)(current / previous))
            }
            Event::Touch(
                touch::Event::FingerLifted { id, .. } | touch::Event::FingerLost { id, .. },
            ) => {
                interaction.fingers.retain(|(finger, _)| finger != id);
                if interaction.fingers.len() < 2 {
                    interaction.pinch_distance = None;
                }
                None
            }
            _ => None,
        }
    }
}

impl<'a, Message, PointerFn, PinchFn, ResizeFn> Program<Message>
    for WaveformCanvas<'a, Message, PointerFn, PinchFn, ResizeFn>
where
    Message: Clone,
    PointerFn: Fn(Point, bool) -> Message,
    PinchFn: Fn(f32) -> Message,
    ResizeFn: Fn(Size) -> Message,
{
    type State = WaveformInteraction;

    fn update(
        &self,
        interaction: &mut Self::State,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        self.message_for(interaction, event, bounds, cursor)
            .map(canvas::Action::publish)
    }

    fn mouse_interaction(
        &self,
        _interaction: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if self.envelope.is_some() && cursor.is_over(bounds) {
            mouse::Interaction::Pointer
        } else {
            mouse::Interaction::default()
        }
    }

    fn draw(
        &self,
        _interaction: &Self::State,
        renderer: &iced::Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());

        frame.fill_rectangle(Point::ORIGIN, bounds.size(), BACKGROUND_COLOR);

        let Some(envelope) = self.envelope else {
            return vec![frame.into_geometry()];
        };

        for segment in render(envelope, self.zoom, self.progress, bounds.size(), self.padding) {
            let color = match segment.kind {
                SegmentKind::Envelope => WAVEFORM_COLOR,
                SegmentKind::Marker => MARKER_COLOR,
            };
            frame.stroke(
                &Path::line(segment.from, segment.to),
                Stroke::default().with_color(color).with_width(segment.width),
            );
        }

        vec![frame.into_geometry()]
    }
}
