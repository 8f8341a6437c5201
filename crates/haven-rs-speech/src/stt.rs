//! Speech recognizers.

use crate::audio::{DecodedAudio, TARGET_SAMPLE_RATE, encode_wav};
use crate::error::SpeechError;
use async_trait::async_trait;
use log::debug;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::fmt;

/// Turns decoded audio into text. Callers trim and check the result.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    async fn recognize(&self, audio: &DecodedAudio) -> Result<String, SpeechError>;
}

/// OpenAI-compatible `/audio/transcriptions` client (Groq, OpenAI, local servers).
#[derive(Clone)]
pub struct HttpRecognizer {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    language: String,
}

impl fmt::Debug for HttpRecognizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRecognizer")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

impl HttpRecognizer {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            model: model.into(),
            language: language.into(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl SpeechRecognizer for HttpRecognizer {
    fn name(&self) -> &str {
        "http"
    }

    async fn recognize(&self, audio: &DecodedAudio) -> Result<String, SpeechError> {
        let wav = encode_wav(&audio.resampled(TARGET_SAMPLE_RATE))?;
        debug!(
            "sending transcription request (model={}, bytes={})",
            self.model,
            wav.len()
        );
        let file = Part::bytes(wav)
            .file_name("audio.wav")
            .mime_str("audio/wav")?;
        let form = Form::new()
            .part("file", file)
            .text("model", self.model.clone())
            .text("language", self.language.clone())
            .text("response_format", "json");

        let mut request = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?.error_for_status()?;
        let body: TranscriptionResponse = response.json().await?;
        Ok(body.text)
    }
}

#[cfg(feature = "whisper")]
pub use whisper::WhisperRecognizer;

#[cfg(feature = "whisper")]
mod whisper {
    use super::*;
    use log::info;
    use std::path::Path;
    use std::sync::Arc;
    use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

    /// Local whisper.cpp model (`ggml-<size>.bin`).
    #[derive(Clone)]
    pub struct WhisperRecognizer {
        context: Arc<WhisperContext>,
        language: String,
        model: String,
    }

    impl fmt::Debug for WhisperRecognizer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("WhisperRecognizer")
                .field("model", &self.model)
                .field("language", &self.language)
                .finish_non_exhaustive()
        }
    }

    impl WhisperRecognizer {
        /// Load `ggml-<model_size>.bin` from `models_dir`.
        pub fn load(
            models_dir: &Path,
            model_size: &str,
            language: impl Into<String>,
        ) -> Result<Self, SpeechError> {
            let path = models_dir.join(format!("ggml-{model_size}.bin"));
            if !path.is_file() {
                return Err(SpeechError::Unavailable(format!(
                    "whisper model not found: {}",
                    path.display()
                )));
            }
            let path_str = path.to_str().ok_or_else(|| {
                SpeechError::Unavailable(format!("non-utf8 model path: {}", path.display()))
            })?;
            info!("loading whisper model (path={})", path.display());
            let context =
                WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
                    .map_err(|err| SpeechError::Backend(err.to_string()))?;
            Ok(Self {
                context: Arc::new(context),
                language: language.into(),
                model: model_size.to_string(),
            })
        }
    }

    #[async_trait]
    impl SpeechRecognizer for WhisperRecognizer {
        fn name(&self) -> &str {
            "whisper"
        }

        async fn recognize(&self, audio: &DecodedAudio) -> Result<String, SpeechError> {
            let samples = audio.resampled(TARGET_SAMPLE_RATE).samples;
            let context = self.context.clone();
            let language = self.language.clone();
            tokio::task::spawn_blocking(move || {
                let backend = |err: whisper_rs::WhisperError| SpeechError::Backend(err.to_string());
                let mut state = context.create_state().map_err(backend)?;
                let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
                params.set_language(Some(language.as_str()));
                params.set_print_progress(false);
                params.set_print_realtime(false);
                params.set_print_timestamps(false);
                state.full(params, &samples).map_err(backend)?;
                let segments = state.full_n_segments().map_err(backend)?;
                let mut text = String::new();
                for segment in 0..segments {
                    text.push_str(&state.full_get_segment_text(segment).map_err(backend)?);
                }
                Ok(text)
            })
            .await
            .map_err(|err| SpeechError::Backend(err.to_string()))?
        }
    }
}
