//! Player configuration
//!
//! Stored as YAML at `~/.config/wavesync/config.yaml` (platform equivalent
//! elsewhere). Every field has a default, so a partial file is fine.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use wavesync_core::playback::DEFAULT_POLL_INTERVAL;
use wavesync_widgets::{SurfacePadding, MIN_ZOOM};

pub use wavesync_core::config::default_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Waveform layout and error display
    pub display: DisplayConfig,
    /// Position polling
    pub playback: PlaybackConfig,
}

/// Display configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Left and right padding of the waveform, in pixels
    pub horizontal_padding: f32,
    /// Top and bottom padding of the waveform, in pixels
    pub vertical_padding: f32,
    /// Narrowest envelope built for a small window
    pub min_envelope_width: usize,
    /// Zoom factor at startup (clamped to 1..16)
    pub default_zoom: f32,
    /// How long a load error stays visible
    pub error_timeout_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            horizontal_padding: wavesync_widgets::waveform::DEFAULT_PADDING,
            vertical_padding: wavesync_widgets::waveform::DEFAULT_PADDING,
            min_envelope_width: wavesync_widgets::waveform::MIN_ENVELOPE_WIDTH,
            default_zoom: MIN_ZOOM,
            error_timeout_ms: 5000,
        }
    }
}

impl DisplayConfig {
    pub fn padding(&self) -> SurfacePadding {
        SurfacePadding {
            horizontal: self.horizontal_padding.max(0.0),
            vertical: self.vertical_padding.max(0.0),
        }
    }

    pub fn error_timeout(&self) -> Duration {
        Duration::from_millis(self.error_timeout_ms)
    }
}

/// Playback configuration section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Position polling cadence while playing
    pub poll_interval_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
        }
    }
}

impl PlaybackConfig {
    /// Poll interval, never shorter than 1 ms
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Load the config, writing a default file on first run
///
/// A config directory that cannot be written is not fatal: the player runs
/// on defaults.
pub fn load_or_init(path: &Path) -> PlayerConfig {
    wavesync_core::config::load_or_create(path)
        .with_context(|| format!("Could not initialize config at {:?}", path))
        .unwrap_or_else(|e| {
            log::warn!("{:#}", e);
            PlayerConfig::default()
        })
}
