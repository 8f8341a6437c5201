//! Speech bridge for Haven: speech-to-text before the pipeline and
//! text-to-speech after it.
//!
//! Recognizers and synthesizers sit behind traits so hosts can pick a local
//! whisper.cpp model, an OpenAI-compatible HTTP service or a test stub.

pub mod audio;
pub mod bridge;
pub mod error;
pub mod retention;
pub mod stt;
pub mod tts;

/// WAV decoding and signal helpers.
pub use audio::{DecodedAudio, decode_wav, encode_wav, rms};
/// The bridge itself.
pub use bridge::SpeechBridge;
/// Speech error type.
pub use error::SpeechError;
/// Artifact retention.
pub use retention::{RetentionPolicy, prune_artifacts};
/// Recognizer backends.
pub use stt::{HttpRecognizer, SpeechRecognizer};
#[cfg(feature = "whisper")]
pub use stt::WhisperRecognizer;
/// Synthesizer backends.
pub use tts::{GoogleTranslateTts, HttpSynthesizer, SpeechSynthesizer};
