//! Text embedders.
//!
//! Every backend implements [`Embedder::embed_unchecked`]; the provided
//! `embed`/`embed_batch` methods reject blank input, split work into
//! backend-sized batches and verify output dimensions.

mod hashing;
#[cfg(feature = "onnx")]
mod onnx;
mod provider;

pub use hashing::HashingEmbedder;
#[cfg(feature = "onnx")]
pub use onnx::OnnxEmbedder;
pub use provider::ProviderEmbedder;

use crate::error::EmbeddingError;
use async_trait::async_trait;
use autoagents_llm::LLMProvider;
use haven_rs_config::EmbedderConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Texts sent per backend call unless the embedder says otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// What produced a set of vectors. Stored with the index and compared on load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct EmbedderIdentity {
    pub provider: String,
    pub model: String,
    pub dimension: usize,
}

impl EmbedderIdentity {
    pub fn new(provider: impl Into<String>, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            dimension,
        }
    }
}

impl fmt::Display for EmbedderIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({}d)", self.provider, self.model, self.dimension)
    }
}

#[async_trait]
pub trait Embedder: Send + Sync + fmt::Debug {
    fn identity(&self) -> &EmbedderIdentity;

    fn dimension(&self) -> usize {
        self.identity().dimension
    }

    fn batch_size(&self) -> usize {
        DEFAULT_BATCH_SIZE
    }

    /// Backend call. Inputs are non-empty and at most `batch_size` long.
    async fn embed_unchecked(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::Backend("embedder returned no vector".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if let Some(index) = texts.iter().position(|text| text.trim().is_empty()) {
            return Err(EmbeddingError::EmptyInput { index });
        }
        let expected = self.dimension();
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size().max(1)) {
            let embedded = self.embed_unchecked(batch).await?;
            if embedded.len() != batch.len() {
                return Err(EmbeddingError::Backend(format!(
                    "expected {} vectors, got {}",
                    batch.len(),
                    embedded.len()
                )));
            }
            for vector in embedded {
                if vector.len() != expected {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected,
                        actual: vector.len(),
                    });
                }
                vectors.push(vector);
            }
        }
        Ok(vectors)
    }
}

/// Build the embedder named by `config.provider`.
///
/// The `llm` provider needs a language model client; pass it as `llm`.
pub fn embedder_from_config(
    config: &EmbedderConfig,
    llm: Option<Arc<dyn LLMProvider>>,
) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    match config.provider.as_str() {
        "hashing" => Ok(Arc::new(
            HashingEmbedder::new(config.dimension).with_batch_size(config.batch_size),
        )),
        "llm" => {
            let llm = llm.ok_or_else(|| {
                EmbeddingError::Unavailable(
                    "the llm embedder needs a language model provider".to_string(),
                )
            })?;
            let mut embedder = ProviderEmbedder::new(
                llm,
                EmbedderIdentity::new("llm", config.model.clone(), config.dimension),
            )
            .with_batch_size(config.batch_size);
            if let Some(secs) = config.timeout_secs {
                embedder = embedder.with_timeout_secs(secs);
            }
            Ok(Arc::new(embedder))
        }
        "onnx" => onnx_from_config(config),
        other => Err(EmbeddingError::Unavailable(format!(
            "unknown embedder provider: {other}"
        ))),
    }
}

#[cfg(feature = "onnx")]
fn onnx_from_config(config: &EmbedderConfig) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    let model_dir = config.model_dir.as_deref().ok_or_else(|| {
        EmbeddingError::Unavailable("embedder.model_dir is required for onnx".to_string())
    })?;
    let embedder = OnnxEmbedder::from_dir(model_dir, &config.model, config.dimension)?
        .with_batch_size(config.batch_size);
    Ok(Arc::new(embedder))
}

#[cfg(not(feature = "onnx"))]
fn onnx_from_config(_config: &EmbedderConfig) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    Err(EmbeddingError::Unavailable(
        "built without the `onnx` feature".to_string(),
    ))
}

/// Cosine similarity; zero when either vector has no magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Scale `vector` to unit length in place. Zero vectors are left alone.
pub(crate) fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug)]
    struct ShortEmbedder {
        identity: EmbedderIdentity,
    }

    #[async_trait]
    impl Embedder for ShortEmbedder {
        fn identity(&self) -> &EmbedderIdentity {
            &self.identity
        }

        async fn embed_unchecked(
            &self,
            texts: &[String],
        ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![1.0]).collect())
        }
    }

    #[tokio::test]
    async fn blank_input_is_rejected_before_the_backend() {
        let embedder = HashingEmbedder::new(16);
        let err = embedder
            .embed_batch(&["ok".to_string(), "  ".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, EmbeddingError::EmptyInput { index: 1 }));
    }

    #[tokio::test]
    async fn wrong_dimension_is_reported() {
        let embedder = ShortEmbedder {
            identity: EmbedderIdentity::new("short", "test", 4),
        };
        let err = embedder.embed("hello").await.unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch {
                expected: 4,
                actual: 1
            }
        ));
    }

    #[test]
    fn cosine_of_parallel_vectors_is_one() {
        let sim = cosine_similarity(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]);
        assert!((sim - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn unknown_provider_is_unavailable() {
        let config = EmbedderConfig {
            provider: "mystery".to_string(),
            ..EmbedderConfig::default()
        };
        assert!(matches!(
            embedder_from_config(&config, None),
            Err(EmbeddingError::Unavailable(_))
        ));
    }

    #[test]
    fn llm_provider_requires_a_client() {
        let config = EmbedderConfig {
            provider: "llm".to_string(),
            ..EmbedderConfig::default()
        };
        assert!(matches!(
            embedder_from_config(&config, None),
            Err(EmbeddingError::Unavailable(_))
        ));
    }

    #[test]
    fn default_config_needs_the_minilm_export() {
        let temp = tempfile::TempDir::new().expect("tmp");
        let config = EmbedderConfig {
            model_dir: Some(temp.path().display().to_string()),
            ..EmbedderConfig::default()
        };
        assert_eq!(config.provider, "onnx");
        let err = embedder_from_config(&config, None).unwrap_err();
        assert!(matches!(err, EmbeddingError::Unavailable(_)));
    }

    #[test]
    fn hashing_is_an_explicit_choice() {
        let config = EmbedderConfig {
            provider: "hashing".to_string(),
            ..EmbedderConfig::default()
        };
        let embedder = embedder_from_config(&config, None).expect("embedder");
        assert_eq!(embedder.identity().provider, "hashing");
        assert_eq!(embedder.dimension(), 384);
    }
}
