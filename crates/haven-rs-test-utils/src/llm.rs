use async_trait::async_trait;
use autoagents_llm::chat::{
    ChatMessage, ChatProvider, ChatResponse, StructuredOutputFormat, Tool,
};
use autoagents_llm::completion::{CompletionProvider, CompletionRequest, CompletionResponse};
use autoagents_llm::embedding::EmbeddingProvider;
use autoagents_llm::error::LLMError;
use autoagents_llm::models::ModelsProvider;
use autoagents_llm::{LLMProvider, ToolCall};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FixedChatResponse {
    text: String,
}

impl FixedChatResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl std::fmt::Display for FixedChatResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl ChatResponse for FixedChatResponse {
    fn text(&self) -> Option<String> {
        Some(self.text.clone())
    }

    fn tool_calls(&self) -> Option<Vec<ToolCall>> {
        None
    }
}

/// Replies with a fixed answer and embeds every input to the same vector.
#[derive(Debug, Clone)]
pub struct FixedLLM {
    response: String,
    embedding: Vec<f32>,
}

impl FixedLLM {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            embedding: vec![1.0, 0.0],
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = embedding;
        self
    }
}

#[async_trait]
impl ChatProvider for FixedLLM {
    async fn chat_with_tools(
        &self,
        _messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        Ok(Box::new(FixedChatResponse::new(self.response.clone())))
    }
}

#[async_trait]
impl CompletionProvider for FixedLLM {
    async fn complete(
        &self,
        _req: &CompletionRequest,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<CompletionResponse, LLMError> {
        Ok(CompletionResponse {
            text: self.response.clone(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for FixedLLM {
    async fn embed(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>, LLMError> {
        Ok(input.into_iter().map(|_| self.embedding.clone()).collect())
    }
}

#[async_trait]
impl ModelsProvider for FixedLLM {}

impl LLMProvider for FixedLLM {}

/// Records every prompt and the messages of the last chat call.
#[derive(Debug, Clone)]
pub struct RecordingChatLLM {
    response: String,
    delay: Option<Duration>,
    pub last_messages: Arc<Mutex<Vec<ChatMessage>>>,
    pub prompts: Arc<Mutex<Vec<String>>>,
    pub calls: Arc<Mutex<usize>>,
}

impl RecordingChatLLM {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            delay: None,
            last_messages: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Sleep after recording the prompt, before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every prompt sent so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Content of the most recent message sent to the model.
    pub fn last_prompt(&self) -> Option<String> {
        self.last_messages
            .lock()
            .last()
            .map(|message| message.content.clone())
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl ChatProvider for RecordingChatLLM {
    async fn chat_with_tools(
        &self,
        messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        *self.last_messages.lock() = messages.to_vec();
        if let Some(message) = messages.last() {
            self.prompts.lock().push(message.content.clone());
        }
        *self.calls.lock() += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(Box::new(FixedChatResponse::new(self.response.clone())))
    }
}

#[async_trait]
impl CompletionProvider for RecordingChatLLM {
    async fn complete(
        &self,
        _req: &CompletionRequest,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<CompletionResponse, LLMError> {
        Err(LLMError::ProviderError("recording".to_string()))
    }
}

#[async_trait]
impl EmbeddingProvider for RecordingChatLLM {
    async fn embed(&self, _input: Vec<String>) -> Result<Vec<Vec<f32>>, LLMError> {
        Err(LLMError::ProviderError("recording".to_string()))
    }
}

#[async_trait]
impl ModelsProvider for RecordingChatLLM {}

impl LLMProvider for RecordingChatLLM {}

/// Sleeps before answering; used to exercise timeouts.
#[derive(Debug, Clone)]
pub struct SlowLLM {
    delay: Duration,
    response: String,
}

impl SlowLLM {
    pub fn new(delay: Duration, response: impl Into<String>) -> Self {
        Self {
            delay,
            response: response.into(),
        }
    }
}

#[async_trait]
impl ChatProvider for SlowLLM {
    async fn chat_with_tools(
        &self,
        _messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        tokio::time::sleep(self.delay).await;
        Ok(Box::new(FixedChatResponse::new(self.response.clone())))
    }
}

#[async_trait]
impl CompletionProvider for SlowLLM {
    async fn complete(
        &self,
        _req: &CompletionRequest,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<CompletionResponse, LLMError> {
        tokio::time::sleep(self.delay).await;
        Ok(CompletionResponse {
            text: self.response.clone(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for SlowLLM {
    async fn embed(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>, LLMError> {
        tokio::time::sleep(self.delay).await;
        Ok(input.into_iter().map(|_| vec![1.0, 0.0]).collect())
    }
}

#[async_trait]
impl ModelsProvider for SlowLLM {}

impl LLMProvider for SlowLLM {}

#[derive(Debug, Clone)]
pub struct FailingLLM {
    message: String,
}

impl FailingLLM {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl ChatProvider for FailingLLM {
    async fn chat_with_tools(
        &self,
        _messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        Err(LLMError::ProviderError(self.message.clone()))
    }
}

#[async_trait]
impl CompletionProvider for FailingLLM {
    async fn complete(
        &self,
        _req: &CompletionRequest,
        _json_schema: Option<StructuredOutputFormat>,
    ) -> Result<CompletionResponse, LLMError> {
        Err(LLMError::ProviderError(self.message.clone()))
    }
}

#[async_trait]
impl EmbeddingProvider for FailingLLM {
    async fn embed(&self, _input: Vec<String>) -> Result<Vec<Vec<f32>>, LLMError> {
        Err(LLMError::ProviderError(self.message.clone()))
    }
}

#[async_trait]
impl ModelsProvider for FailingLLM {}

impl LLMProvider for FailingLLM {}
