//! Configuration schema for Haven.

use serde::{Deserialize, Serialize};

/// Embedder backends understood by the RAG crate.
pub const EMBEDDER_PROVIDERS: &[&str] = &["hashing", "onnx", "llm"];
/// Language model backends understood by the generator.
pub const GENERATION_PROVIDERS: &[&str] = &["groq", "openai", "ollama"];
/// Speech recognition backends.
pub const RECOGNITION_PROVIDERS: &[&str] = &["whisper", "http"];
/// Speech synthesis backends.
pub const SYNTHESIS_PROVIDERS: &[&str] = &["gtts", "http"];

/// Root config for a Haven deployment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HavenConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub embedder: EmbedderConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

impl HavenConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> HavenConfigBuilder {
        HavenConfigBuilder::new()
    }
}

/// Builder for assembling a `HavenConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct HavenConfigBuilder {
    config: HavenConfig,
}

impl HavenConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: HavenConfig::default(),
        }
    }

    /// Replace the embedder configuration.
    pub fn embedder(mut self, embedder: EmbedderConfig) -> Self {
        self.config.embedder = embedder;
        self
    }

    /// Replace the ingestion configuration.
    pub fn ingest(mut self, ingest: IngestConfig) -> Self {
        self.config.ingest = ingest;
        self
    }

    /// Replace the index storage configuration.
    pub fn index(mut self, index: IndexConfig) -> Self {
        self.config.index = index;
        self
    }

    /// Replace the retrieval configuration.
    pub fn retrieval(mut self, retrieval: RetrievalConfig) -> Self {
        self.config.retrieval = retrieval;
        self
    }

    /// Replace the generation configuration.
    pub fn generation(mut self, generation: GenerationConfig) -> Self {
        self.config.generation = generation;
        self
    }

    /// Replace the conversation memory configuration.
    pub fn memory(mut self, memory: MemoryConfig) -> Self {
        self.config.memory = memory;
        self
    }

    /// Replace the prompt configuration.
    pub fn prompt(mut self, prompt: PromptConfig) -> Self {
        self.config.prompt = prompt;
        self
    }

    /// Replace the speech configuration.
    pub fn speech(mut self, speech: SpeechConfig) -> Self {
        self.config.speech = speech;
        self
    }

    /// Finalize and return the built `HavenConfig`.
    pub fn build(self) -> HavenConfig {
        self.config
    }
}

/// Embedder identity and batching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbedderConfig {
    #[serde(default = "default_embedder_provider")]
    pub provider: String,
    #[serde(default = "default_embedder_model")]
    pub model: String,
    #[serde(default = "default_embedder_dimension")]
    pub dimension: usize,
    /// Directory holding `model.onnx` and `tokenizer.json` for the onnx provider.
    #[serde(default = "default_embedder_model_dir")]
    pub model_dir: Option<String>,
    #[serde(default = "default_embedder_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            provider: default_embedder_provider(),
            model: default_embedder_model(),
            dimension: default_embedder_dimension(),
            model_dir: default_embedder_model_dir(),
            batch_size: default_embedder_batch_size(),
            timeout_secs: None,
        }
    }
}

/// Sentence-transformer embeddings through ONNX Runtime. `hashing` is the
/// offline lexical fallback.
fn default_embedder_provider() -> String {
    "onnx".to_string()
}

fn default_embedder_model() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

/// Holds the all-MiniLM-L6-v2 `model.onnx` and `tokenizer.json`.
fn default_embedder_model_dir() -> Option<String> {
    Some("./models/all-MiniLM-L6-v2".to_string())
}

/// Output size of all-MiniLM-L6-v2.
fn default_embedder_dimension() -> usize {
    384
}

fn default_embedder_batch_size() -> usize {
    32
}

/// Source corpus discovery and chunking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestConfig {
    #[serde(default = "default_source_dir")]
    pub source_dir: String,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            extensions: default_extensions(),
            recursive: false,
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_source_dir() -> String {
    "./data".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["pdf".to_string()]
}

/// Target chunk length in characters.
fn default_chunk_size() -> usize {
    500
}

/// Characters shared between consecutive chunks.
fn default_chunk_overlap() -> usize {
    50
}

/// Persisted vector index location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexConfig {
    #[serde(default = "default_index_path")]
    pub path: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
        }
    }
}

fn default_index_path() -> String {
    "./vector_index".to_string()
}

/// Top-k retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalConfig {
    #[serde(default = "default_retrieval_k")]
    pub k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            k: default_retrieval_k(),
        }
    }
}

fn default_retrieval_k() -> usize {
    3
}

/// Language model used for answers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_provider")]
    pub provider: String,
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
    /// Environment variable holding the provider API key.
    #[serde(default = "default_generation_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            model: default_generation_model(),
            temperature: 0.0,
            api_key_env: default_generation_api_key_env(),
            base_url: None,
            max_tokens: None,
            timeout_secs: default_generation_timeout_secs(),
        }
    }
}

fn default_generation_provider() -> String {
    "groq".to_string()
}

fn default_generation_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_generation_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_generation_timeout_secs() -> Option<u64> {
    Some(60)
}

/// Rendering window for conversation history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryConfig {
    #[serde(default = "default_max_turns")]
    pub max_turns: Option<usize>,
    #[serde(default)]
    pub max_chars: Option<usize>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            max_chars: None,
        }
    }
}

fn default_max_turns() -> Option<usize> {
    Some(10)
}

/// Persona overrides for the prompt template.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PromptConfig {
    /// Replaces the built-in persona preamble when set.
    #[serde(default)]
    pub persona: Option<String>,
    #[serde(default)]
    pub additional_instructions: Option<String>,
}

/// Speech-to-text, text-to-speech and artifact retention.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SpeechConfig {
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecognitionConfig {
    #[serde(default = "default_recognition_provider")]
    pub provider: String,
    /// Whisper model size (`tiny`, `base`, `small`, ...).
    #[serde(default = "default_model_size")]
    pub model_size: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_models_dir")]
    pub models_dir: String,
    /// RMS level under which audio counts as silence.
    #[serde(default = "default_silence_threshold")]
    pub silence_threshold: f32,
    #[serde(default = "default_recognition_base_url")]
    pub base_url: String,
    #[serde(default = "default_recognition_model")]
    pub model: String,
    #[serde(default = "default_generation_api_key_env")]
    pub api_key_env: String,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            provider: default_recognition_provider(),
            model_size: default_model_size(),
            language: default_language(),
            models_dir: default_models_dir(),
            silence_threshold: default_silence_threshold(),
            base_url: default_recognition_base_url(),
            model: default_recognition_model(),
            api_key_env: default_generation_api_key_env(),
        }
    }
}

fn default_recognition_provider() -> String {
    "whisper".to_string()
}

fn default_model_size() -> String {
    "tiny".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_models_dir() -> String {
    "./models".to_string()
}

fn default_silence_threshold() -> f32 {
    0.01
}

fn default_recognition_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_recognition_model() -> String {
    "whisper-large-v3-turbo".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SynthesisConfig {
    #[serde(default = "default_synthesis_provider")]
    pub provider: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub voice: Option<String>,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Endpoint for the `http` provider.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            provider: default_synthesis_provider(),
            language: default_language(),
            voice: None,
            output_dir: default_output_dir(),
            base_url: None,
            model: None,
            api_key_env: None,
        }
    }
}

fn default_synthesis_provider() -> String {
    "gtts".to_string()
}

fn default_output_dir() -> String {
    "./audio".to_string()
}

/// Retention for generated audio. Empty means keep everything.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RetentionConfig {
    #[serde(default)]
    pub max_files: Option<usize>,
    #[serde(default)]
    pub max_age_secs: Option<u64>,
}
