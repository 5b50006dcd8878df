//! Source loading error types

use thiserror::Error;

/// Errors that can occur while turning a file into a sample buffer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The byte stream could not be opened or read
    #[error("cannot open the file: {0}")]
    SourceUnreadable(String),

    /// The bytes are not usable PCM
    ///
    /// Reserved: the loader currently only applies the RIFF prefix heuristic
    /// and never raises this.
    #[error("invalid audio format: {0}")]
    InvalidFormat(String),
}

/// Result type for source loading
pub type LoadResult<T> = Result<T, LoadError>;
