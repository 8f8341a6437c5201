//! Embedder backed by an LLM provider's embedding endpoint.

use super::{DEFAULT_BATCH_SIZE, Embedder, EmbedderIdentity};
use crate::error::EmbeddingError;
use async_trait::async_trait;
use autoagents_llm::LLMProvider;
use log::debug;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Delegates to any `LLMProvider` that serves embeddings (Ollama, OpenAI, ...).
#[derive(Clone)]
pub struct ProviderEmbedder {
    llm: Arc<dyn LLMProvider>,
    identity: EmbedderIdentity,
    batch_size: usize,
    timeout: Option<Duration>,
}

impl fmt::Debug for ProviderEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderEmbedder")
            .field("identity", &self.identity)
            .field("batch_size", &self.batch_size)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ProviderEmbedder {
    pub fn new(llm: Arc<dyn LLMProvider>, identity: EmbedderIdentity) -> Self {
        Self {
            llm,
            identity,
            batch_size: DEFAULT_BATCH_SIZE,
            timeout: None,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::from_secs(secs));
        self
    }
}

#[async_trait]
impl Embedder for ProviderEmbedder {
    fn identity(&self) -> &EmbedderIdentity {
        &self.identity
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    async fn embed_unchecked(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        debug!(
            "embedding batch via provider (model={}, size={})",
            self.identity.model,
            texts.len()
        );
        let request = self.llm.embed(texts.to_vec());
        let result = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, request)
                .await
                .map_err(|_| EmbeddingError::Timeout(timeout.as_secs()))?,
            None => request.await,
        };
        result.map_err(|err| EmbeddingError::Backend(err.to_string()))
    }
}
