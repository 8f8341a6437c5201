//! Speech bridge: audio file in, text out; text in, audio file out.

use crate::audio::{decode_wav, rms};
use crate::error::SpeechError;
use crate::retention::{ARTIFACT_PREFIX, RetentionPolicy, prune_artifacts};
use crate::stt::{HttpRecognizer, SpeechRecognizer};
use crate::tts::{GoogleTranslateTts, HttpSynthesizer, SpeechSynthesizer};
use haven_rs_config::{RecognitionConfig, SpeechConfig, SynthesisConfig};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Default RMS level below which audio is treated as silence.
pub const DEFAULT_SILENCE_THRESHOLD: f32 = 0.01;

#[derive(Debug, Clone)]
enum Recognition {
    Ready(Arc<dyn SpeechRecognizer>),
    /// Synthesis still works; `transcribe` reports the reason.
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub struct SpeechBridge {
    recognition: Recognition,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    output_dir: PathBuf,
    silence_threshold: f32,
    retention: RetentionPolicy,
}

impl SpeechBridge {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            recognition: Recognition::Ready(recognizer),
            synthesizer,
            output_dir: output_dir.into(),
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
            retention: RetentionPolicy::default(),
        }
    }

    /// A bridge that can synthesize but not transcribe.
    pub fn synthesis_only(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        output_dir: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            recognition: Recognition::Unavailable(reason.into()),
            synthesizer,
            output_dir: output_dir.into(),
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
            retention: RetentionPolicy::default(),
        }
    }

    pub fn with_silence_threshold(mut self, threshold: f32) -> Self {
        self.silence_threshold = threshold;
        self
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    /// Build the recognizer and synthesizer named in `config`.
    ///
    /// Only a synthesizer failure is an error. A recognizer that cannot be
    /// built leaves the bridge synthesis-only.
    pub fn from_config(config: &SpeechConfig) -> Result<Self, SpeechError> {
        let synthesizer = synthesizer_from_config(&config.synthesis)?;
        let output_dir = &config.synthesis.output_dir;
        let bridge = match recognizer_from_config(&config.recognition) {
            Ok(recognizer) => Self::new(recognizer, synthesizer, output_dir),
            Err(err) => {
                warn!(
                    "speech recognition disabled (provider={}): {}",
                    config.recognition.provider, err
                );
                Self::synthesis_only(synthesizer, output_dir, err.to_string())
            }
        };
        Ok(bridge
            .with_silence_threshold(config.recognition.silence_threshold)
            .with_retention(RetentionPolicy::from(&config.retention)))
    }

    pub fn can_transcribe(&self) -> bool {
        matches!(self.recognition, Recognition::Ready(_))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn retention(&self) -> &RetentionPolicy {
        &self.retention
    }

    /// Transcribe a WAV file.
    pub async fn transcribe(&self, audio_path: &Path) -> Result<String, SpeechError> {
        let recognizer = match &self.recognition {
            Recognition::Ready(recognizer) => recognizer,
            Recognition::Unavailable(reason) => {
                return Err(SpeechError::Unavailable(reason.clone()));
            }
        };
        if !audio_path.is_file() {
            return Err(SpeechError::InvalidAudio(format!(
                "{} does not exist",
                audio_path.display()
            )));
        }
        let audio = decode_wav(audio_path)?;
        let level = rms(&audio.samples);
        debug!(
            "decoded audio (path={}, secs={:.2}, rms={:.4})",
            audio_path.display(),
            audio.duration_secs(),
            level
        );
        if level < self.silence_threshold {
            return Err(SpeechError::EmptyTranscript);
        }

        let text = recognizer.recognize(&audio).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(SpeechError::EmptyTranscript);
        }
        info!(
            "transcribed audio (recognizer={}, chars={})",
            recognizer.name(),
            text.chars().count()
        );
        Ok(text.to_string())
    }

    /// Synthesize `text` into a new `tts_<uuid>.<ext>` file under the output directory.
    pub async fn synthesize(&self, text: &str) -> Result<PathBuf, SpeechError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SpeechError::EmptyText);
        }
        let audio = self.synthesizer.synthesize(text).await?;
        if audio.is_empty() {
            return Err(SpeechError::Backend(
                "synthesizer returned an empty payload".to_string(),
            ));
        }

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(format!(
            "{ARTIFACT_PREFIX}{}.{}",
            Uuid::new_v4().simple(),
            self.synthesizer.extension()
        ));
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(&audio).await?;
        file.flush().await?;
        info!(
            "synthesized speech (path={}, bytes={})",
            path.display(),
            audio.len()
        );
        Ok(path)
    }

    /// Apply `policy` to the output directory.
    pub fn prune_artifacts(&self, policy: &RetentionPolicy) -> Result<usize, SpeechError> {
        prune_artifacts(&self.output_dir, policy)
    }
}

fn recognizer_from_config(
    config: &RecognitionConfig,
) -> Result<Arc<dyn SpeechRecognizer>, SpeechError> {
    match config.provider.as_str() {
        "whisper" => whisper_recognizer(config),
        "http" => {
            let mut recognizer =
                HttpRecognizer::new(&config.base_url, &config.model, &config.language);
            match std::env::var(&config.api_key_env) {
                Ok(key) if !key.is_empty() => recognizer = recognizer.with_api_key(key),
                _ => {
                    return Err(SpeechError::Unavailable(format!(
                        "{} is not set",
                        config.api_key_env
                    )));
                }
            }
            Ok(Arc::new(recognizer))
        }
        other => Err(SpeechError::Unavailable(format!(
            "unknown recognition provider: {other}"
        ))),
    }
}

#[cfg(feature = "whisper")]
fn whisper_recognizer(
    config: &RecognitionConfig,
) -> Result<Arc<dyn SpeechRecognizer>, SpeechError> {
    let recognizer = crate::stt::WhisperRecognizer::load(
        Path::new(&config.models_dir),
        &config.model_size,
        &config.language,
    )?;
    Ok(Arc::new(recognizer))
}

#[cfg(not(feature = "whisper"))]
fn whisper_recognizer(
    _config: &RecognitionConfig,
) -> Result<Arc<dyn SpeechRecognizer>, SpeechError> {
    Err(SpeechError::Unavailable(
        "built without the `whisper` feature; use the http recognizer".to_string(),
    ))
}

fn synthesizer_from_config(
    config: &SynthesisConfig,
) -> Result<Arc<dyn SpeechSynthesizer>, SpeechError> {
    match config.provider.as_str() {
        "gtts" => Ok(Arc::new(GoogleTranslateTts::new(&config.language))),
        "http" => {
            let base_url = config.base_url.as_deref().ok_or_else(|| {
                SpeechError::Unavailable("speech.synthesis.base_url is not set".to_string())
            })?;
            let mut synthesizer = HttpSynthesizer::new(base_url);
            if let Some(model) = &config.model {
                synthesizer = synthesizer.with_model(model);
            }
            if let Some(voice) = &config.voice {
                synthesizer = synthesizer.with_voice(voice);
            }
            if let Some(env) = &config.api_key_env {
                if let Ok(key) = std::env::var(env) {
                    synthesizer = synthesizer.with_api_key(key);
                }
            }
            Ok(Arc::new(synthesizer))
        }
        other => Err(SpeechError::Unavailable(format!(
            "unknown synthesis provider: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::DecodedAudio;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Debug, Default)]
    struct CountingRecognizer {
        calls: AtomicUsize,
        reply: String,
    }

    #[async_trait]
    impl SpeechRecognizer for CountingRecognizer {
        fn name(&self) -> &str {
            "counting"
        }

        async fn recognize(&self, _audio: &DecodedAudio) -> Result<String, SpeechError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    #[derive(Debug)]
    struct BytesSynthesizer(Vec<u8>);

    #[async_trait]
    impl SpeechSynthesizer for BytesSynthesizer {
        fn extension(&self) -> &str {
            "wav"
        }

        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, SpeechError> {
            Ok(self.0.clone())
        }
    }

    fn write_wav(path: &Path, amplitude: f32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).expect("writer");
        for i in 0..1_600 {
            let value = if i % 2 == 0 { amplitude } else { -amplitude };
            writer
                .write_sample((value * i16::MAX as f32) as i16)
                .expect("sample");
        }
        writer.finalize().expect("finalize");
    }

    fn bridge(dir: &Path, reply: &str, payload: Vec<u8>) -> (SpeechBridge, Arc<CountingRecognizer>) {
        let recognizer = Arc::new(CountingRecognizer {
            calls: AtomicUsize::new(0),
            reply: reply.to_string(),
        });
        let bridge = SpeechBridge::new(
            recognizer.clone(),
            Arc::new(BytesSynthesizer(payload)),
            dir.join("audio"),
        );
        (bridge, recognizer)
    }

    #[tokio::test]
    async fn missing_file_is_invalid_audio() {
        let temp = TempDir::new().expect("tmp");
        let (bridge, _) = bridge(temp.path(), "hi", vec![1]);
        let err = bridge
            .transcribe(&temp.path().join("nope.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, SpeechError::InvalidAudio(_)));
    }

    #[tokio::test]
    async fn silence_skips_the_recognizer() {
        let temp = TempDir::new().expect("tmp");
        let path = temp.path().join("silence.wav");
        write_wav(&path, 0.0);
        let (bridge, recognizer) = bridge(temp.path(), "ghost words", vec![1]);
        assert!(matches!(
            bridge.transcribe(&path).await,
            Err(SpeechError::EmptyTranscript)
        ));
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn blank_recognition_is_empty_transcript() {
        let temp = TempDir::new().expect("tmp");
        let path = temp.path().join("tone.wav");
        write_wav(&path, 0.3);
        let (bridge, _) = bridge(temp.path(), "   ", vec![1]);
        assert!(matches!(
            bridge.transcribe(&path).await,
            Err(SpeechError::EmptyTranscript)
        ));
    }

    #[tokio::test]
    async fn transcript_is_trimmed() {
        let temp = TempDir::new().expect("tmp");
        let path = temp.path().join("tone.wav");
        write_wav(&path, 0.3);
        let (bridge, _) = bridge(temp.path(), "  I feel tense \n", vec![1]);
        assert_eq!(bridge.transcribe(&path).await.expect("text"), "I feel tense");
    }

    #[tokio::test]
    async fn empty_text_is_rejected() {
        let temp = TempDir::new().expect("tmp");
        let (bridge, _) = bridge(temp.path(), "", vec![1]);
        assert!(matches!(
            bridge.synthesize("  ").await,
            Err(SpeechError::EmptyText)
        ));
    }

    #[tokio::test]
    async fn each_synthesis_writes_a_new_file() {
        let temp = TempDir::new().expect("tmp");
        let (bridge, _) = bridge(temp.path(), "", vec![82, 73, 70, 70]);
        let first = bridge.synthesize("Take a slow breath.").await.expect("first");
        let second = bridge.synthesize("Take a slow breath.").await.expect("second");
        assert_ne!(first, second);
        for path in [&first, &second] {
            let name = path.file_name().and_then(|n| n.to_str()).expect("name");
            assert!(name.starts_with("tts_"));
            assert!(name.ends_with(".wav"));
            assert_eq!(std::fs::read(path).expect("read"), vec![82, 73, 70, 70]);
        }
    }

    #[tokio::test]
    async fn empty_payload_is_a_backend_error() {
        let temp = TempDir::new().expect("tmp");
        let (bridge, _) = bridge(temp.path(), "", Vec::new());
        assert!(matches!(
            bridge.synthesize("hello").await,
            Err(SpeechError::Backend(_))
        ));
    }

    #[tokio::test]
    async fn default_config_builds_a_bridge_that_can_synthesize() {
        let temp = TempDir::new().expect("tmp");
        let mut config = SpeechConfig::default();
        config.recognition.models_dir = temp.path().join("no-models").display().to_string();
        config.synthesis.output_dir = temp.path().join("audio").display().to_string();

        let bridge = SpeechBridge::from_config(&config).expect("bridge");
        assert!(!bridge.can_transcribe());
        assert_eq!(bridge.output_dir(), temp.path().join("audio"));

        let bridge = SpeechBridge {
            synthesizer: Arc::new(BytesSynthesizer(vec![82, 73, 70, 70])),
            ..bridge
        };
        let path = bridge.synthesize("hello").await.expect("synthesize");
        assert!(path.starts_with(temp.path().join("audio")));
    }

    #[tokio::test]
    async fn synthesis_only_bridge_reports_unavailable_transcription() {
        let temp = TempDir::new().expect("tmp");
        let path = temp.path().join("tone.wav");
        write_wav(&path, 0.3);
        let bridge = SpeechBridge::synthesis_only(
            Arc::new(BytesSynthesizer(vec![1])),
            temp.path().join("audio"),
            "no whisper model",
        );
        match bridge.transcribe(&path).await {
            Err(SpeechError::Unavailable(reason)) => assert_eq!(reason, "no whisper model"),
            other => panic!("expected unavailable, got {other:?}"),
        }
        bridge.synthesize("still speaking").await.expect("synthesize");
    }
}
