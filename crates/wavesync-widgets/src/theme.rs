//! Shared theme constants for wavesync UI components

use iced::Color;

/// Canvas background
pub const BACKGROUND_COLOR: Color = Color::from_rgb(0.06, 0.06, 0.07);

/// Envelope columns (#00FF00)
pub const WAVEFORM_COLOR: Color = Color::from_rgb(0.0, 1.0, 0.0);

/// Progress marker (#FF4040)
pub const MARKER_COLOR: Color = Color::from_rgb(1.0, 0.25, 0.25);

/// Progress marker stroke width in pixels
pub const MARKER_STROKE_WIDTH: f32 = 3.0;

/// Time labels and status text
pub const LABEL_COLOR: Color = Color::from_rgb(0.75, 0.75, 0.78);

/// Error banner text
pub const ERROR_COLOR: Color = Color::from_rgb(0.95, 0.35, 0.3);
