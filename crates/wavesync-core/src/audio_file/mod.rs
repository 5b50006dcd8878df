//! Raw PCM sample buffers and the file loader
//!
//! A [`SampleBuffer`] owns the bytes of a mono 16-bit little-endian PCM stream
//! with any WAV header already removed. Buffers are immutable once built and
//! are shared through `Arc` between the envelope builder, the render surface
//! and the playback engine.
//!
//! Header handling is a prefix check only: a stream longer than 44 bytes that
//! starts with the ASCII marker `RIFF` loses its first 44 bytes, everything
//! else is passed through as raw PCM. No chunk parsing is done.

mod error;

pub use error::{LoadError, LoadResult};

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::types::{samples_to_ms, BYTES_PER_SAMPLE};

/// Length of the canonical RIFF/WAVE header stripped by the loader
pub const WAV_HEADER_LEN: usize = 44;

/// Marker that identifies a RIFF container in the first four bytes
pub const RIFF_MARKER: &[u8; 4] = b"RIFF";

/// Identity source for sample buffers (0 is never handed out)
static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Mono 16-bit PCM samples backed by their raw little-endian bytes
///
/// Every buffer gets a process-unique id at construction. Caches keyed on
/// buffer identity (envelopes, in-flight rebuilds) compare ids, never bytes.
#[derive(Debug)]
pub struct SampleBuffer {
    id: u64,
    bytes: Vec<u8>,
}

impl SampleBuffer {
    /// Wrap raw PCM bytes (header already stripped)
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            id: NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed),
            bytes,
        }
    }

    /// Build a buffer from signed samples, encoding them little-endian
    pub fn from_samples(samples: &[i16]) -> Self {
        let bytes = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self::from_bytes(bytes)
    }

    /// Process-unique identity of this buffer
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of complete samples (a trailing odd byte is not a sample)
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len() / BYTES_PER_SAMPLE
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Length of the underlying byte stream
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Sample at `index` as an unsigned amplitude
    ///
    /// Reconstructed as `(high << 8) | low` without two's-complement
    /// interpretation. The envelope builder works on this representation.
    #[inline]
    pub fn amplitude(&self, index: usize) -> Option<u16> {
        let start = index.checked_mul(BYTES_PER_SAMPLE)?;
        let pair = self.bytes.get(start..start + BYTES_PER_SAMPLE)?;
        Some(u16::from_le_bytes([pair[0], pair[1]]))
    }

    /// Sample at `index` as signed PCM (used for audio output)
    #[inline]
    pub fn sample(&self, index: usize) -> Option<i16> {
        self.amplitude(index).map(|a| a as i16)
    }

    /// Unsigned amplitudes for samples in `range`, clamped to the buffer
    pub fn amplitudes(&self, range: std::ops::Range<usize>) -> impl Iterator<Item = u16> + '_ {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        self.bytes[start * BYTES_PER_SAMPLE..end * BYTES_PER_SAMPLE]
            .chunks_exact(BYTES_PER_SAMPLE)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
    }

    /// Playback length at the fixed sample rate
    pub fn duration_ms(&self) -> u64 {
        samples_to_ms(self.len() as u64)
    }
}

/// Remove a 44-byte WAV header when the stream starts with `RIFF`
///
/// Streams of 44 bytes or fewer are returned untouched even when prefixed.
pub fn strip_wav_header(mut bytes: Vec<u8>) -> Vec<u8> {
    if bytes.len() > WAV_HEADER_LEN && bytes.starts_with(RIFF_MARKER) {
        bytes.drain(..WAV_HEADER_LEN);
    }
    bytes
}

/// A loaded audio source: the sample buffer plus its display name
#[derive(Debug, Clone)]
pub struct LoadedSource {
    /// PCM samples (shared with the envelope builder and playback engine)
    pub buffer: Arc<SampleBuffer>,
    /// Final path component, empty if the path has none
    pub file_name: String,
    /// Where the source was read from
    pub path: PathBuf,
}

impl LoadedSource {
    /// Wrap an in-memory PCM stream (applies the same header heuristic as files)
    pub fn from_bytes(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        Self {
            buffer: Arc::new(SampleBuffer::from_bytes(strip_wav_header(bytes))),
            file_name: file_name.into(),
            path: PathBuf::new(),
        }
    }
}

/// Read a whole file into a [`LoadedSource`]
///
/// Runs blocking file I/O; call it off the UI thread.
pub fn load_source<P: AsRef<Path>>(path: P) -> LoadResult<LoadedSource> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| LoadError::SourceUnreadable(format!("{}: {}", path.display(), e)))?;

    let raw_len = bytes.len();
    let pcm = strip_wav_header(bytes);
    if pcm.len() != raw_len {
        log::debug!("load_source: stripped WAV header from {:?}", path);
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let buffer = Arc::new(SampleBuffer::from_bytes(pcm));
    log::info!(
        "load_source: {} ({} samples, {} ms)",
        file_name,
        buffer.len(),
        buffer.duration_ms()
    );

    Ok(LoadedSource {
        buffer,
        file_name,
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amplitude_is_unsigned() {
        // -1 as i16 is 0xFFFF
        let buffer = SampleBuffer::from_samples(&[0, 1, -1, i16::MIN]);
        assert_eq!(buffer.amplitude(0), Some(0));
        assert_eq!(buffer.amplitude(1), Some(1));
        assert_eq!(buffer.amplitude(2), Some(0xFFFF));
        assert_eq!(buffer.amplitude(3), Some(0x8000));
        assert_eq!(buffer.sample(2), Some(-1));
        assert_eq!(buffer.amplitude(4), None);
    }

    #[test]
    fn test_odd_trailing_byte_is_ignored() {
        let buffer = SampleBuffer::from_bytes(vec![0x01, 0x02, 0x03]);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.byte_len(), 3);
        assert_eq!(buffer.amplitude(0), Some(0x0201));
        assert_eq!(buffer.amplitude(1), None);
        assert_eq!(buffer.amplitudes(0..5).count(), 1);
    }

    #[test]
    fn test_buffer_ids_are_unique() {
        let a = SampleBuffer::from_bytes(Vec::new());
        let b = SampleBuffer::from_bytes(Vec::new());
        assert_ne!(a.id(), b.id());
        assert_ne!(a.id(), 0);
    }

    #[test]
    fn test_strip_header_only_with_riff_prefix() {
        let mut wav = b"RIFF".to_vec();
        wav.resize(WAV_HEADER_LEN, 0);
        wav.extend_from_slice(&[7, 0, 8, 0]);
        assert_eq!(strip_wav_header(wav), vec![7, 0, 8, 0]);

        let raw = vec![1u8; 100];
        assert_eq!(strip_wav_header(raw.clone()), raw);
    }

    #[test]
    fn test_strip_header_requires_more_than_header_len() {
        let mut exact = b"RIFF".to_vec();
        exact.resize(WAV_HEADER_LEN, 0);
        assert_eq!(strip_wav_header(exact.clone()).len(), WAV_HEADER_LEN);
    }

    #[test]
    fn test_duration_two_seconds() {
        let buffer = SampleBuffer::from_samples(&vec![0i16; 88_200]);
        assert_eq!(buffer.duration_ms(), 2000);
    }

    #[test]
    fn test_load_wav_file_strips_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in [100i16, -100, 200, -200] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let source = load_source(&path).unwrap();
        assert_eq!(source.file_name, "tone.wav");
        assert_eq!(source.buffer.len(), 4);
        assert_eq!(source.buffer.sample(0), Some(100));
        assert_eq!(source.buffer.sample(3), Some(-200));
    }

    #[test]
    fn test_load_raw_pcm_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.pcm");
        std::fs::write(&path, [0x10, 0x00, 0x20, 0x00, 0xFF]).unwrap();

        let source = load_source(&path).unwrap();
        assert_eq!(source.buffer.byte_len(), 5);
        assert_eq!(source.buffer.len(), 2);
    }

    #[test]
    fn test_load_missing_file_is_unreadable() {
        let err = load_source("/nonexistent/wavesync/missing.wav").unwrap_err();
        assert!(matches!(err, LoadError::SourceUnreadable(_)));
    }
}
