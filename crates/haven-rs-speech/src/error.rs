//! Error types for the speech bridge.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpeechError {
    /// Missing file or not decodable audio.
    #[error("invalid audio file: {0}")]
    InvalidAudio(String),
    #[error("no speech detected")]
    EmptyTranscript,
    #[error("empty text for speech synthesis")]
    EmptyText,
    /// The backend failed or returned nothing usable.
    #[error("speech backend error: {0}")]
    Backend(String),
    /// The configured backend cannot be used in this build or environment.
    #[error("speech backend unavailable: {0}")]
    Unavailable(String),
    #[error("speech io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SpeechError {
    fn from(err: reqwest::Error) -> Self {
        SpeechError::Backend(err.to_string())
    }
}
