//! Envelope to line segments
//!
//! [`render`] is a pure function of envelope, zoom, progress and surface size.
//! [`RenderSurface`] owns the current buffer and envelope for one canvas and
//! decides when the envelope has to be rebuilt.

use std::sync::Arc;

use iced::{Point, Size};
use wavesync_core::audio_file::SampleBuffer;
use wavesync_core::envelope::Envelope;
use wavesync_core::types::MAX_AMPLITUDE;

use super::envelope_computer::EnvelopeRequest;
use super::viewport::{ViewGeometry, ZoomState};
use crate::theme::MARKER_STROKE_WIDTH;

/// Default horizontal and vertical padding in pixels
pub const DEFAULT_PADDING: f32 = 50.0;

/// Narrowest envelope ever built, whatever the surface width
pub const MIN_ENVELOPE_WIDTH: usize = 100;

/// What a segment depicts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// One envelope column
    Envelope,
    /// The progress marker
    Marker,
}

/// One vertical draw call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub from: Point,
    pub to: Point,
    pub width: f32,
    pub kind: SegmentKind,
}

/// Padding around the drawn envelope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePadding {
    /// Applied to the left and to the right
    pub horizontal: f32,
    /// Applied to the top and to the bottom
    pub vertical: f32,
}

impl Default for SurfacePadding {
    fn default() -> Self {
        Self {
            horizontal: DEFAULT_PADDING,
            vertical: DEFAULT_PADDING,
        }
    }
}

/// Produce the segments for one frame
///
/// Envelope columns outside the cull window are skipped. The progress
/// marker is always last so it is painted on top.
pub fn render(
    envelope: &Envelope,
    zoom: ZoomState,
    progress: f32,
    size: Size,
    padding: SurfacePadding,
) -> Vec<LineSegment> {
    let geometry = ViewGeometry::new(size.width, padding.horizontal, zoom.factor(), envelope.len());
    let center_y = size.height / 2.0;
    let scale = (1.0 / MAX_AMPLITUDE) * (size.height / 2.0 - padding.vertical) * zoom.factor();
    let stroke_width = geometry.stroke_width();

    let mut segments: Vec<LineSegment> = envelope
        .peaks()
        .iter()
        .enumerate()
        .filter_map(|(i, peak)| {
            let x = geometry.column_x(i);
            geometry.is_visible(x).then(|| LineSegment {
                from: Point::new(x, center_y - peak.min as f32 * scale),
                to: Point::new(x, center_y - peak.max as f32 * scale),
                width: stroke_width,
                kind: SegmentKind::Envelope,
            })
        })
        .collect();

    let marker_x = geometry.x_for_fraction(progress.clamp(0.0, 1.0));
    segments.push(LineSegment {
        from: Point::new(marker_x, padding.vertical),
        to: Point::new(marker_x, size.height - padding.vertical),
        width: MARKER_STROKE_WIDTH,
        kind: SegmentKind::Marker,
    });

    segments
}

/// Buffer, envelope and size of one waveform surface
#[derive(Debug, Clone)]
pub struct RenderSurface {
    size: Size,
    padding: SurfacePadding,
    min_envelope_width: usize,
    source: Option<Arc<SampleBuffer>>,
    envelope: Option<Arc<Envelope>>,
}

impl Default for RenderSurface {
    fn default() -> Self {
        Self::new(SurfacePadding::default(), MIN_ENVELOPE_WIDTH)
    }
}

impl RenderSurface {
    pub fn new(padding: SurfacePadding, min_envelope_width: usize) -> Self {
        Self {
            size: Size::ZERO,
            padding,
            min_envelope_width: min_envelope_width.max(1),
            source: None,
            envelope: None,
        }
    }

    /// Width the envelope should have for the current size: `max(W - 2P, min)`
    pub fn envelope_width(&self) -> usize {
        let drawable = (self.size.width - 2.0 * self.padding.horizontal).max(0.0) as usize;
        drawable.max(self.min_envelope_width)
    }

    /// Attach a new buffer; the previous envelope goes with the previous buffer
    pub fn set_source(&mut self, buffer: Arc<SampleBuffer>) -> EnvelopeRequest {
        self.envelope = None;
        self.source = Some(Arc::clone(&buffer));
        EnvelopeRequest {
            buffer,
            width: self.envelope_width(),
        }
    }

    /// Record a new surface size
    ///
    /// Returns a rebuild request when the width changed and a buffer is
    /// loaded. Height-only changes never rebuild. The old envelope keeps
    /// being drawn until the new one arrives.
    pub fn resize(&mut self, size: Size) -> Option<EnvelopeRequest> {
        let width_changed = size.width != self.size.width;
        self.size = size;
        if !width_changed {
            return None;
        }
        self.source.as_ref().map(|buffer| EnvelopeRequest {
            buffer: Arc::clone(buffer),
            width: self.envelope_width(),
        })
    }

    /// Install a finished envelope
    ///
    /// Rejected (returns `false`) if it was built for another buffer or for
    /// a width the surface no longer has.
    pub fn apply_envelope(&mut self, envelope: Arc<Envelope>) -> bool {
        let current = match &self.source {
            Some(buffer) => buffer,
            None => return false,
        };
        if !envelope.matches(current, self.envelope_width()) {
            log::debug!(
                "RenderSurface: dropping stale envelope (buffer {}, width {})",
                envelope.buffer_id(),
                envelope.len()
            );
            return false;
        }
        self.envelope = Some(envelope);
        true
    }

    /// Drop buffer and envelope
    pub fn clear(&mut self) {
        self.source = None;
        self.envelope = None;
    }

    #[inline]
    pub fn has_data(&self) -> bool {
        self.envelope.is_some()
    }

    pub fn envelope(&self) -> Option<&Arc<Envelope>> {
        self.envelope.as_ref()
    }

    pub fn source(&self) -> Option<&Arc<SampleBuffer>> {
        self.source.as_ref()
    }

    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    #[inline]
    pub fn padding(&self) -> SurfacePadding {
        self.padding
    }

    /// Geometry for the current size and envelope
    pub fn geometry(&self, zoom: ZoomState) -> Option<ViewGeometry> {
        self.envelope.as_ref().map(|envelope| {
            ViewGeometry::new(self.size.width, self.padding.horizontal, zoom.factor(), envelope.len())
        })
    }

    /// Segments for the current size; nothing before data is loaded
    pub fn segments(&self, zoom: ZoomState, progress: f32) -> Vec<LineSegment> {
        match &self.envelope {
            Some(envelope) => render(envelope, zoom, progress, self.size, self.padding),
            None => Vec::new(),
        }
    }
}
