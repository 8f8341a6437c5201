//! Single-shot generation against an LLM provider.

use crate::prompt::Prompt;
use autoagents_llm::LLMProvider;
use autoagents_llm::chat::{ChatMessage, ChatRole, MessageType};
use log::{debug, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    /// Network, auth or quota failure reported by the provider.
    #[error("language model error: {0}")]
    Provider(String),
    #[error("language model returned an empty response")]
    EmptyResponse,
    #[error("language model timed out after {0}s")]
    Timeout(u64),
    #[error("missing API key: set {0}")]
    MissingApiKey(String),
}

/// Sends one prompt as one user message. No retries.
#[derive(Clone)]
pub struct Generator {
    llm: Arc<dyn LLMProvider>,
    timeout: Option<Duration>,
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Generator {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self { llm, timeout: None }
    }

    pub fn with_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.timeout = secs.map(Duration::from_secs);
        self
    }

    pub async fn generate(&self, prompt: &Prompt) -> Result<String, GenerationError> {
        let messages = [ChatMessage {
            role: ChatRole::User,
            message_type: MessageType::Text,
            content: prompt.text.clone(),
        }];
        debug!(
            "sending prompt (chars={}, chunks={})",
            prompt.text.chars().count(),
            prompt.chunk_ids.len()
        );
        let call = self.llm.chat_with_tools(&messages, None, None);
        let response = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("generation timed out (secs={})", limit.as_secs());
                    return Err(GenerationError::Timeout(limit.as_secs()));
                }
            },
            None => call.await,
        }
        .map_err(|err| GenerationError::Provider(err.to_string()))?;

        let text = response.text().unwrap_or_default();
        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}
