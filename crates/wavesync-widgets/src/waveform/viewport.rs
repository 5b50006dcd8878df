//! Zoom state and envelope-to-screen geometry
//!
//! Zoom is centered: the middle of the drawable area stays fixed while the
//! envelope grows to both sides. The same [`ViewGeometry`] is used to place
//! columns when drawing and to turn a pointer x-coordinate back into a
//! playback fraction, so a press on the drawn play head seeks to where it is.

/// Smallest zoom factor (identity)
pub const MIN_ZOOM: f32 = 1.0;

/// Largest zoom factor
pub const MAX_ZOOM: f32 = 16.0;

/// Zoom multiplier per mouse wheel line
pub const WHEEL_ZOOM_STEP: f32 = 1.1;

/// Below this pixel width columns are drawn as thin lines
const MIN_FILLED_PIXEL_WIDTH: f32 = 2.0;

/// Horizontal magnification of the envelope
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomState {
    factor: f32,
}

impl ZoomState {
    /// Build a state with `factor` clamped into `[MIN_ZOOM, MAX_ZOOM]`
    pub fn clamped(factor: f32) -> Self {
        Self {
            factor: factor.clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }

    #[inline]
    pub fn factor(&self) -> f32 {
        self.factor
    }
}

impl Default for ZoomState {
    fn default() -> Self {
        Self { factor: MIN_ZOOM }
    }
}

/// Owns the [`ZoomState`]; the only place it is mutated
#[derive(Debug, Clone, Default)]
pub struct ZoomController {
    state: ZoomState,
    /// Target of [`ZoomController::reset`]
    initial: ZoomState,
}

impl ZoomController {
    pub fn new(initial: f32) -> Self {
        let initial = ZoomState::clamped(if initial.is_nan() { MIN_ZOOM } else { initial });
        Self {
            state: initial,
            initial,
        }
    }

    #[inline]
    pub fn zoom(&self) -> ZoomState {
        self.state
    }

    /// Set the zoom factor, clamped to `[1, 16]`
    ///
    /// Returns `true` only if the clamped value differs from the current one,
    /// which is what decides whether a redraw is needed.
    pub fn set_zoom(&mut self, requested: f32) -> bool {
        if requested.is_nan() {
            return false;
        }
        let next = ZoomState::clamped(requested);
        if next == self.state {
            return false;
        }
        log::debug!("Zoom: {:.3} -> {:.3}", self.state.factor, next.factor);
        self.state = next;
        true
    }

    /// Apply a multiplicative pinch scale (e.g. 1.05 for a small spread)
    pub fn on_pinch_scale(&mut self, scale_delta: f32) -> bool {
        if !scale_delta.is_finite() || scale_delta <= 0.0 {
            return false;
        }
        self.set_zoom(self.state.factor * scale_delta)
    }

    /// Back to the zoom the controller was created with
    pub fn reset(&mut self) -> bool {
        self.set_zoom(self.initial.factor)
    }
}

/// Placement of envelope columns on a surface
///
/// Recomputed for every draw and every pointer event; never cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewGeometry {
    /// Surface width `W`
    pub width: f32,
    /// `W - 2P`
    pub drawable_width: f32,
    /// `drawable_width * zoom`
    pub total_width: f32,
    /// `total_width / envelope_len` (0 for an empty envelope)
    pub pixel_width: f32,
    /// `(W - total_width) / 2`
    pub start_x: f32,
}

impl ViewGeometry {
    pub fn new(width: f32, padding: f32, zoom_factor: f32, envelope_len: usize) -> Self {
        let drawable_width = width - 2.0 * padding;
        let total_width = drawable_width * zoom_factor;
        let pixel_width = if envelope_len == 0 {
            0.0
        } else {
            total_width / envelope_len as f32
        };
        Self {
            width,
            drawable_width,
            total_width,
            pixel_width,
            start_x: (width - total_width) / 2.0,
        }
    }

    /// x-coordinate of envelope column `index`
    #[inline]
    pub fn column_x(&self, index: usize) -> f32 {
        self.start_x + index as f32 * self.pixel_width
    }

    /// Whether a column at `x` lies within `[-pixel_width, W + pixel_width]`
    #[inline]
    pub fn is_visible(&self, x: f32) -> bool {
        x >= -self.pixel_width && x <= self.width + self.pixel_width
    }

    /// Wide strokes merge into a filled envelope; narrow columns stay 1 px lines
    #[inline]
    pub fn stroke_width(&self) -> f32 {
        if self.pixel_width >= MIN_FILLED_PIXEL_WIDTH {
            self.pixel_width
        } else {
            1.0
        }
    }

    /// Playback fraction under pointer `x`, clamped to `[0, 1]`
    pub fn fraction_at(&self, x: f32) -> f32 {
        if self.total_width <= 0.0 {
            return 0.0;
        }
        ((x - self.start_x) / self.total_width).clamp(0.0, 1.0)
    }

    /// x-coordinate of the play head at `fraction`
    #[inline]
    pub fn x_for_fraction(&self, fraction: f32) -> f32 {
        self.start_x + fraction * self.total_width
    }

    /// Seek fraction for a pointer press
    ///
    /// Multi-touch input belongs to pinch-zoom and never seeks.
    pub fn pointer_seek(&self, x: f32, is_multi_touch: bool) -> Option<f32> {
        if is_multi_touch {
            None
        } else {
            Some(self.fraction_at(x))
        }
    }
}
