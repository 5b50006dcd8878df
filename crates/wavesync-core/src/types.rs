//! Common types for wavesync
//!
//! Wavesync handles exactly one audio shape: mono, 16-bit little-endian PCM
//! at a single fixed sample rate.

/// Sample rate of every source wavesync plays (44.1kHz, CD audio)
pub const SAMPLE_RATE: u32 = 44100;

/// Bytes per 16-bit PCM sample
pub const BYTES_PER_SAMPLE: usize = 2;

/// Largest unsigned amplitude an envelope entry can hold (2^16 - 1)
pub const MAX_AMPLITUDE: f32 = 65535.0;

/// Convert a sample count to whole milliseconds at [`SAMPLE_RATE`]
#[inline]
pub fn samples_to_ms(samples: u64) -> u64 {
    samples * 1000 / SAMPLE_RATE as u64
}

/// Convert milliseconds to a sample index at [`SAMPLE_RATE`]
#[inline]
pub fn ms_to_samples(ms: u64) -> u64 {
    ms * SAMPLE_RATE as u64 / 1000
}
