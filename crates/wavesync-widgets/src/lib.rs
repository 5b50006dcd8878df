//! Shared UI widgets for wavesync
//!
//! ## Architecture (iced 0.14 patterns)
//!
//! - **State structs**: Pure data (`RenderSurface`, `ZoomController`)
//! - **View functions**: Take state + callbacks, return `Element<Message>`
//! - **Canvas Programs**: Handle custom rendering and event-to-callback translation
//!
//! ## Features
//!
//! - **Theme constants**: waveform, marker and label colors
//! - **Viewport**: centered zoom, column placement, pointer-to-seek mapping
//! - **Render surface**: envelope + progress to line segments, resize-driven rebuilds
//! - **Envelope computer**: background envelope builds
//! - **Subscriptions**: mpsc channel and poll-timer bridges to iced

pub mod subscription;
pub mod theme;
pub mod waveform;

pub use subscription::{mpsc_subscription, poll_ticks};
pub use theme::{BACKGROUND_COLOR, ERROR_COLOR, LABEL_COLOR, MARKER_COLOR, WAVEFORM_COLOR};

pub use waveform::{
    render, time_labels, waveform_view, EnvelopeComputer, EnvelopeRequest, EnvelopeResult,
    LineSegment, RenderSurface, SegmentKind, SurfacePadding, ViewGeometry, WaveformCanvas,
    ZoomController, ZoomState, MAX_ZOOM, MIN_ZOOM,
};
