//! Speech synthesizers.

use crate::error::SpeechError;
use async_trait::async_trait;
use log::debug;
use serde::Serialize;
use std::fmt;

/// Produces encoded audio for a piece of text.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + fmt::Debug {
    /// File extension of the produced audio, without the dot.
    fn extension(&self) -> &str;

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError>;
}

const GOOGLE_TTS_URL: &str = "https://translate.google.com/translate_tts";
/// Longest text the translate endpoint accepts reliably per request.
pub const MAX_SEGMENT_CHARS: usize = 100;

/// Google Translate speech endpoint, the service behind gTTS. Returns MP3.
#[derive(Clone)]
pub struct GoogleTranslateTts {
    client: reqwest::Client,
    endpoint: String,
    language: String,
}

impl fmt::Debug for GoogleTranslateTts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleTranslateTts")
            .field("endpoint", &self.endpoint)
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

impl GoogleTranslateTts {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: GOOGLE_TTS_URL.to_string(),
            language: language.into(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SpeechSynthesizer for GoogleTranslateTts {
    fn extension(&self) -> &str {
        "mp3"
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let segments = split_segments(text, MAX_SEGMENT_CHARS);
        let total = segments.len().to_string();
        let mut audio = Vec::new();
        for (idx, segment) in segments.iter().enumerate() {
            debug!(
                "requesting tts segment (idx={}, chars={})",
                idx,
                segment.chars().count()
            );
            let bytes = self
                .client
                .get(&self.endpoint)
                .query(&[
                    ("ie", "UTF-8"),
                    ("client", "tw-ob"),
                    ("tl", self.language.as_str()),
                    ("q", segment.as_str()),
                    ("total", total.as_str()),
                    ("idx", idx.to_string().as_str()),
                    ("textlen", segment.chars().count().to_string().as_str()),
                ])
                .send()
                .await?
                .error_for_status()?
                .bytes()
                .await?;
            audio.extend_from_slice(&bytes);
        }
        Ok(audio)
    }
}

/// OpenAI-compatible `/audio/speech` client.
#[derive(Clone)]
pub struct HttpSynthesizer {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    voice: String,
}

impl fmt::Debug for HttpSynthesizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSynthesizer")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("voice", &self.voice)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

impl HttpSynthesizer {
    pub const DEFAULT_MODEL: &'static str = "tts-1";
    pub const DEFAULT_VOICE: &'static str = "alloy";

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            model: Self::DEFAULT_MODEL.to_string(),
            voice: Self::DEFAULT_VOICE.to_string(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    fn extension(&self) -> &str {
        "wav"
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let body = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            response_format: "wav",
        };
        let mut request = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let bytes = request.send().await?.error_for_status()?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

/// Split `text` into pieces of at most `max_chars` characters, breaking on
/// whitespace where possible. Words longer than the limit are cut.
pub fn split_segments(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(max_chars);
            segments.push(word.into_iter().collect());
            word = rest;
        }
        if word.is_empty() {
            continue;
        }
        let needed = if current.is_empty() { word.len() } else { word.len() + 1 };
        if current_len + needed > max_chars {
            segments.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current_len += word.len();
        current.extend(word);
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn short_text_is_one_segment() {
        assert_eq!(
            split_segments("You are doing your best.", 100),
            vec!["You are doing your best.".to_string()]
        );
    }

    #[test]
    fn segments_break_on_words() {
        let segments = split_segments("one two three four", 9);
        assert_eq!(
            segments,
            vec!["one two".to_string(), "three".to_string(), "four".to_string()]
        );
        assert!(segments.iter().all(|s| s.chars().count() <= 9));
    }

    #[test]
    fn oversized_words_are_cut() {
        assert_eq!(
            split_segments("abcdefgh ij", 3),
            vec![
                "abc".to_string(),
                "def".to_string(),
                "gh".to_string(),
                "ij".to_string()
            ]
        );
    }

    #[test]
    fn google_tts_produces_mp3() {
        assert_eq!(GoogleTranslateTts::new("en").extension(), "mp3");
    }
}
