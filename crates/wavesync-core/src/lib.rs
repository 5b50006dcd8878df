//! Wavesync Core - PCM envelope building and playback synchronization
//!
//! This crate holds the toolkit-independent half of wavesync:
//!
//! - **audio_file**: raw 16-bit PCM sample buffers and the file loader
//! - **envelope**: per-column (min, max) amplitude envelopes
//! - **playback**: the playback engine seam and the position synchronizer
//! - **config**: generic YAML configuration I/O
//! - **time**: `m:ss` display formatting

pub mod audio_file;
pub mod config;
pub mod envelope;
pub mod error;
pub mod playback;
pub mod time;
pub mod types;

pub use error::{SourceError, SourceResult};
pub use types::*;
