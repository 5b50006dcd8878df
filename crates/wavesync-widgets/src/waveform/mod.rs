//! Waveform display components
//!
//! - **State** (`RenderSurface`, `ZoomController`): pure data, no iced widgets
//! - **View functions** (`waveform_view`, `time_labels`): take state + callbacks,
//!   return `Element<Message>`
//! - **Canvas Program** (`WaveformCanvas`): drawing and event-to-callback translation
//! - **EnvelopeComputer**: envelope builds off the UI thread

mod canvas;
mod envelope_computer;
mod render;
mod view;
mod viewport;

pub use canvas::{WaveformCanvas, WaveformInteraction};
pub use envelope_computer::{EnvelopeComputer, EnvelopeKey, EnvelopeRequest, EnvelopeResult};
pub use render::{
    render, LineSegment, RenderSurface, SegmentKind, SurfacePadding, DEFAULT_PADDING,
    MIN_ENVELOPE_WIDTH,
};
pub use view::{time_labels, waveform_view};
pub use viewport::{
    ViewGeometry, ZoomController, ZoomState, MAX_ZOOM, MIN_ZOOM, WHEEL_ZOOM_STEP,
};
