//! Playback engine error types

use thiserror::Error;

/// Errors reported by a playback engine or the synchronizer driving it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine refused the prepared source
    #[error("playback engine rejected the source: {0}")]
    DecodeRejected(String),

    /// A transport or seek call arrived before any source was prepared
    #[error("no source prepared")]
    NotPrepared,

    /// The output device could not be opened or driven
    #[error("audio device error: {0}")]
    Device(String),
}

/// Result type for playback operations
pub type EngineResult<T> = Result<T, EngineError>;
