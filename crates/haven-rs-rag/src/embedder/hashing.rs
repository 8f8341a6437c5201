//! Offline feature-hashing embedder.

use super::{DEFAULT_BATCH_SIZE, Embedder, EmbedderIdentity, l2_normalize};
use crate::error::EmbeddingError;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

const MODEL_NAME: &str = "sha256-word-trigram-v1";
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Hashes lowercased words and their character trigrams into signed buckets.
///
/// Needs no model files or network, and gives identical vectors on every
/// platform, so indexes built with it can be reloaded anywhere.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    identity: EmbedderIdentity,
    batch_size: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            identity: EmbedderIdentity::new("hashing", MODEL_NAME, dimension),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let dimension = self.identity.dimension;
        let mut vector = vec![0.0f32; dimension];
        if dimension == 0 {
            return vector;
        }
        let lowered = text.to_lowercase();
        for word in lowered
            .split(|ch: char| !ch.is_alphanumeric())
            .filter(|word| !word.is_empty())
        {
            add_feature(&mut vector, &format!("w:{word}"), 1.0);
            let padded: Vec<char> = format!("<{word}>").chars().collect();
            for trigram in padded.windows(3) {
                let trigram: String = trigram.iter().collect();
                add_feature(&mut vector, &format!("t:{trigram}"), TRIGRAM_WEIGHT);
            }
        }
        l2_normalize(&mut vector);
        vector
    }
}

fn add_feature(vector: &mut [f32], feature: &str, weight: f32) {
    let digest = Sha256::digest(feature.as_bytes());
    let mut bucket_bytes = [0u8; 8];
    bucket_bytes.copy_from_slice(&digest[..8]);
    let bucket = (u64::from_le_bytes(bucket_bytes) % vector.len() as u64) as usize;
    let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
    vector[bucket] += sign * weight;
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn identity(&self) -> &EmbedderIdentity {
        &self.identity
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    async fn embed_unchecked(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|text| self.vectorize(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::cosine_similarity;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn vectors_are_deterministic_and_normalized() {
        let embedder = HashingEmbedder::new(64);
        let first = embedder.embed("Breathing exercises help").await.expect("embed");
        let second = embedder.embed("Breathing exercises help").await.expect("embed");
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        let norm: f32 = first.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn case_does_not_change_the_vector() {
        let embedder = HashingEmbedder::new(64);
        let lower = embedder.embed("calm down").await.expect("embed");
        let upper = embedder.embed("CALM Down").await.expect("embed");
        assert_eq!(lower, upper);
    }

    #[tokio::test]
    async fn shared_words_score_higher_than_unrelated_text() {
        let embedder = HashingEmbedder::new(384);
        let query = embedder.embed("how do breathing exercises help").await.expect("q");
        let related = embedder
            .embed("Breathing exercises can help reduce anxiety")
            .await
            .expect("related");
        let unrelated = embedder
            .embed("Quarterly revenue grew in the retail segment")
            .await
            .expect("unrelated");
        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[test]
    fn identity_names_the_hashing_scheme() {
        let embedder = HashingEmbedder::new(384);
        assert_eq!(embedder.identity().provider, "hashing");
        assert_eq!(embedder.identity().model, MODEL_NAME);
        assert_eq!(embedder.dimension(), 384);
    }
}
