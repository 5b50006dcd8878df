//! Min/max amplitude envelopes for waveform display
//!
//! An envelope collapses a [`SampleBuffer`] into exactly `width` (min, max)
//! pairs, one per pixel column. Column `i` covers the half-open sample range
//!
//! ```text
//! [floor(i * N / width), min(floor((i + 1) * N / width), N))
//! ```
//!
//! so the ranges are contiguous, disjoint and together cover `[0, N)`.
//! Columns with an empty range (only possible when `width > N`) are `(0, 0)`.
//!
//! Bucket boundaries depend on `width`, so a resize always means a full
//! rebuild; envelopes are never patched incrementally.

use std::ops::Range;
use std::time::Instant;

use rayon::prelude::*;

use crate::audio_file::SampleBuffer;

/// One envelope column: smallest and largest unsigned amplitude in its bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Peak {
    pub min: u16,
    pub max: u16,
}

impl Peak {
    pub const SILENT: Peak = Peak { min: 0, max: 0 };
}

/// Per-column amplitude summary of one sample buffer at one width
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    buffer_id: u64,
    peaks: Vec<Peak>,
}

impl Envelope {
    /// Identity of the buffer this envelope was built from
    #[inline]
    pub fn buffer_id(&self) -> u64 {
        self.buffer_id
    }

    /// Number of columns (the width it was built at)
    #[inline]
    pub fn len(&self) -> usize {
        self.peaks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty()
    }

    #[inline]
    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    /// Whether this envelope is current for `buffer` at `width`
    pub fn matches(&self, buffer: &SampleBuffer, width: usize) -> bool {
        self.buffer_id == buffer.id() && self.peaks.len() == width
    }
}

/// Half-open sample range covered by column `column` out of `width`
///
/// Computed in 128-bit arithmetic so long buffers at large widths cannot
/// overflow the intermediate product.
#[inline]
pub fn bucket_range(column: usize, width: usize, total_samples: usize) -> Range<usize> {
    debug_assert!(width > 0);
    let total = total_samples as u128;
    let width_u = width as u128;
    let start = (column as u128 * total / width_u) as usize;
    let end = (((column as u128 + 1) * total / width_u) as usize).min(total_samples);
    start..end.max(start)
}

/// Build the envelope of `buffer` at `width` columns
///
/// Pure and deterministic: identical inputs always produce identical output.
/// A `width` of 0 yields an empty envelope.
pub fn build_envelope(buffer: &SampleBuffer, width: usize) -> Envelope {
    let started = Instant::now();
    let total_samples = buffer.len();

    let peaks: Vec<Peak> = if width == 0 {
        Vec::new()
    } else {
        (0..width)
            .into_par_iter()
            .map(|column| column_peak(buffer, bucket_range(column, width, total_samples)))
            .collect()
    };

    log::debug!(
        "Envelope built for buffer {}: {} samples -> {} columns in {:?}",
        buffer.id(),
        total_samples,
        peaks.len(),
        started.elapsed()
    );

    Envelope {
        buffer_id: buffer.id(),
        peaks,
    }
}

fn column_peak(buffer: &SampleBuffer, range: Range<usize>) -> Peak {
    buffer
        .amplitudes(range)
        .fold(None, |acc: Option<Peak>, amplitude| {
            Some(match acc {
                None => Peak {
                    min: amplitude,
                    max: amplitude,
                },
                Some(peak) => Peak {
                    min: peak.min.min(amplitude),
                    max: peak.max.max(amplitude),
                },
            })
        })
        .unwrap_or(Peak::SILENT)
}
