//! ONNX Runtime sentence-transformer embedder.
//!
//! Expects `model.onnx` and `tokenizer.json` exported from a BERT-style
//! sentence transformer (all-MiniLM-L6-v2 by default). Token embeddings are
//! mean-pooled under the attention mask and L2-normalized.

use super::{DEFAULT_BATCH_SIZE, Embedder, EmbedderIdentity, l2_normalize};
use crate::error::EmbeddingError;
use async_trait::async_trait;
use log::info;
use ndarray::{Array2, Axis};
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Value;
use parking_lot::Mutex;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokenizers::Tokenizer;

const MODEL_FILE: &str = "model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";

pub struct OnnxEmbedder {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    identity: EmbedderIdentity,
    batch_size: usize,
}

impl fmt::Debug for OnnxEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxEmbedder")
            .field("identity", &self.identity)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl OnnxEmbedder {
    /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
    pub fn from_dir(
        model_dir: impl AsRef<Path>,
        model_name: &str,
        dimension: usize,
    ) -> Result<Self, EmbeddingError> {
        let model_dir = model_dir.as_ref();
        let model_path = model_dir.join(MODEL_FILE);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);
        for path in [&model_path, &tokenizer_path] {
            if !path.exists() {
                return Err(EmbeddingError::Unavailable(format!(
                    "missing model file: {} (export {} to ONNX, or set embedder.provider to \"hashing\")",
                    path.display(),
                    model_name
                )));
            }
        }

        info!(
            "loading onnx embedder (model={}, dir={})",
            model_name,
            model_dir.display()
        );
        let session = Session::builder()
            .map_err(backend)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(backend)?
            .with_intra_threads(4)
            .map_err(backend)?
            .commit_from_file(&model_path)
            .map_err(backend)?;
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(backend)?;

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            identity: EmbedderIdentity::new("onnx", model_name, dimension),
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn run(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let encodings = texts
            .iter()
            .map(|text| self.tokenizer.encode(text.as_str(), true).map_err(backend))
            .collect::<Result<Vec<_>, _>>()?;
        let rows = encodings.len();
        let max_len = encodings
            .iter()
            .map(|encoding| encoding.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut input_ids = Vec::with_capacity(rows * max_len);
        let mut attention_mask = Vec::with_capacity(rows * max_len);
        for encoding in &encodings {
            let ids = encoding.get_ids();
            let padding = max_len - ids.len();
            input_ids.extend(ids.iter().map(|&id| id as i64));
            input_ids.extend(std::iter::repeat_n(0i64, padding));
            attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
            attention_mask.extend(std::iter::repeat_n(0i64, padding));
        }
        let mask_for_pooling = attention_mask.clone();

        let input_ids = Array2::from_shape_vec((rows, max_len), input_ids).map_err(backend)?;
        let attention_mask =
            Array2::from_shape_vec((rows, max_len), attention_mask).map_err(backend)?;
        let token_type_ids = Array2::<i64>::zeros((rows, max_len));

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![
                "input_ids" => Value::from_array(input_ids).map_err(backend)?,
                "attention_mask" => Value::from_array(attention_mask).map_err(backend)?,
                "token_type_ids" => Value::from_array(token_type_ids).map_err(backend)?
            ])
            .map_err(backend)?;
        let hidden = outputs[0].try_extract_array::<f32>().map_err(backend)?;

        let mut vectors = Vec::with_capacity(rows);
        for (row, tokens) in hidden.axis_iter(Axis(0)).enumerate() {
            let width = tokens.shape().get(1).copied().unwrap_or(0);
            let mut pooled = vec![0.0f32; width];
            let mut weight = 0.0f32;
            for (position, token) in tokens.axis_iter(Axis(0)).enumerate() {
                let mask = mask_for_pooling[row * max_len + position] as f32;
                weight += mask;
                for (slot, value) in pooled.iter_mut().zip(token.iter()) {
                    *slot += value * mask;
                }
            }
            for value in &mut pooled {
                *value /= weight.max(1e-9);
            }
            l2_normalize(&mut pooled);
            vectors.push(pooled);
        }
        Ok(vectors)
    }
}

fn backend(err: impl fmt::Display) -> EmbeddingError {
    EmbeddingError::Backend(err.to_string())
}

#[async_trait]
impl Embedder for OnnxEmbedder {
    fn identity(&self) -> &EmbedderIdentity {
        &self.identity
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    async fn embed_unchecked(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.run(texts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_model_files_are_unavailable() {
        let temp = TempDir::new().expect("tmp");
        let err = OnnxEmbedder::from_dir(temp.path(), "all-MiniLM-L6-v2", 384).unwrap_err();
        assert!(matches!(err, EmbeddingError::Unavailable(_)));
    }

    /// Needs the exported model under `HAVEN_ONNX_MODEL_DIR`.
    #[tokio::test]
    #[ignore]
    async fn related_sentences_are_close() {
        let dir = std::env::var("HAVEN_ONNX_MODEL_DIR").expect("HAVEN_ONNX_MODEL_DIR");
        let embedder = OnnxEmbedder::from_dir(dir, "all-MiniLM-L6-v2", 384).expect("embedder");
        let a = embedder.embed("I feel anxious").await.expect("a");
        let b = embedder.embed("I am worried and nervous").await.expect("b");
        let c = embedder.embed("The invoice is due on Friday").await.expect("c");
        let near = crate::embedder::cosine_similarity(&a, &b);
        let far = crate::embedder::cosine_similarity(&a, &c);
        assert!(near > far);
    }
}
