use async_trait::async_trait;
use haven_rs_speech::{DecodedAudio, SpeechError, SpeechRecognizer, SpeechSynthesizer};
use parking_lot::Mutex;
use std::sync::Arc;

/// Returns a fixed transcript and counts calls.
#[derive(Debug, Clone)]
pub struct StubRecognizer {
    transcript: String,
    pub calls: Arc<Mutex<usize>>,
}

impl StubRecognizer {
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl SpeechRecognizer for StubRecognizer {
    fn name(&self) -> &str {
        "stub"
    }

    async fn recognize(&self, _audio: &DecodedAudio) -> Result<String, SpeechError> {
        *self.calls.lock() += 1;
        Ok(self.transcript.clone())
    }
}

/// Produces a fixed payload and records every text it was asked to speak.
#[derive(Debug, Clone)]
pub struct StubSynthesizer {
    payload: Vec<u8>,
    pub spoken: Arc<Mutex<Vec<String>>>,
}

impl StubSynthesizer {
    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            payload,
            spoken: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Default for StubSynthesizer {
    fn default() -> Self {
        Self::new(b"RIFF".to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for StubSynthesizer {
    fn extension(&self) -> &str {
        "wav"
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        self.spoken.lock().push(text.to_string());
        Ok(self.payload.clone())
    }
}
