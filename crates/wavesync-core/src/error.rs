//! Unified error for the load-and-prepare path
//!
//! Loading a file can fail in the reader or in the playback engine. The
//! domain only cares that the source could not be loaded, so both are folded
//! into [`SourceError`] and shown to the user as one message.

use thiserror::Error;

use crate::audio_file::LoadError;
use crate::playback::EngineError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl SourceError {
    /// The message shown to the user: `Cannot load file: <cause>`
    pub fn user_message(&self) -> String {
        format!("Cannot load file: {}", self)
    }
}

pub type SourceResult<T> = Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_wraps_cause() {
        let err: SourceError = LoadError::SourceUnreadable("no such file".into()).into();
        let msg = err.user_message();
        assert!(msg.starts_with("Cannot load file: "));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_engine_error_converts() {
        let err: SourceError = EngineError::DecodeRejected("empty".into()).into();
        assert!(matches!(err, SourceError::Engine(EngineError::DecodeRejected(_))));
    }
}
