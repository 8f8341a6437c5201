//! Orchestrator: owns the index lifecycle and runs the answer pipeline.

use crate::error::HavenCoreError;
use crate::generator::Generator;
use crate::llm::build_provider;
use crate::pipeline::{AnswerOutcome, AnswerPipeline};
use crate::prompt::{PromptAssembler, PromptError};
use crate::sessions::SessionStore;
use autoagents_llm::LLMProvider;
use haven_rs_config::HavenConfig;
use haven_rs_memory::{ConversationState, HistoryWindow};
use haven_rs_rag::{
    ChunkingParams, DocumentIngestor, Embedder, IngestOptions, RetrievedChunk, VectorIndex,
    embedder_from_config,
};
use haven_rs_speech::{RetentionPolicy, SpeechBridge, prune_artifacts};
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use uuid::Uuid;

/// Lifecycle of the vector index. `Ready` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Uninitialized,
    Building,
    Ready,
}

/// Result of [`Orchestrator::answer_audio`].
#[derive(Debug, Clone)]
pub struct AudioAnswer {
    pub transcript: String,
    pub answer: String,
    pub state: ConversationState,
}

pub struct Orchestrator {
    config: Arc<HavenConfig>,
    embedder: Arc<dyn Embedder>,
    generator: Generator,
    assembler: PromptAssembler,
    speech: Option<SpeechBridge>,
    sessions: SessionStore,
    index: OnceCell<Arc<VectorIndex>>,
    index_state: RwLock<IndexState>,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("embedder", self.embedder.identity())
            .field("index_state", &self.state())
            .field("speech", &self.speech.is_some())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Wire an orchestrator from explicit collaborators. The config is validated first.
    pub fn new(
        config: HavenConfig,
        embedder: Arc<dyn Embedder>,
        llm: Arc<dyn LLMProvider>,
    ) -> Result<Self, HavenCoreError> {
        config.validate()?;
        info!(
            "initializing orchestrator (embedder={}, index={}, k={})",
            embedder.identity(),
            config.index.path,
            config.retrieval.k
        );
        let generator = Generator::new(llm).with_timeout_secs(config.generation.timeout_secs);
        let assembler = PromptAssembler::from_config(&config.prompt);
        Ok(Self {
            config: Arc::new(config),
            embedder,
            generator,
            assembler,
            speech: None,
            sessions: SessionStore::new(),
            index: OnceCell::new(),
            index_state: RwLock::new(IndexState::Uninitialized),
        })
    }

    /// Build the LLM provider, embedder and speech bridge named in `config`.
    ///
    /// A missing recognizer only disables transcription. A synthesizer that
    /// cannot be built drops the bridge; speech calls then fail with
    /// [`HavenCoreError::SpeechUnavailable`].
    pub fn from_config(config: HavenConfig) -> Result<Self, HavenCoreError> {
        config.validate()?;
        let llm = build_provider(&config.generation)?;
        let embedder = embedder_from_config(&config.embedder, Some(llm.clone()))?;
        let speech = match SpeechBridge::from_config(&config.speech) {
            Ok(bridge) => Some(bridge),
            Err(err) => {
                warn!("speech bridge disabled: {}", err);
                None
            }
        };
        let orchestrator = Self::new(config, embedder, llm)?;
        Ok(match speech {
            Some(bridge) => orchestrator.with_speech(bridge),
            None => orchestrator,
        })
    }

    pub fn with_speech(mut self, bridge: SpeechBridge) -> Self {
        self.speech = Some(bridge);
        self
    }

    pub fn config(&self) -> &HavenConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn speech(&self) -> Option<&SpeechBridge> {
        self.speech.as_ref()
    }

    pub fn state(&self) -> IndexState {
        *self.index_state.read()
    }

    /// Load the index, or build it from the source directory when none exists.
    /// Concurrent callers share one initialization.
    pub async fn initialize(&self) -> Result<Arc<VectorIndex>, HavenCoreError> {
        self.initialize_with(false).await
    }

    /// Like [`Orchestrator::initialize`] but always rebuilds from the source
    /// directory. Has no effect once the index is ready in this process.
    pub async fn rebuild(&self) -> Result<Arc<VectorIndex>, HavenCoreError> {
        self.initialize_with(true).await
    }

    async fn initialize_with(&self, force_rebuild: bool) -> Result<Arc<VectorIndex>, HavenCoreError> {
        let index = self
            .index
            .get_or_try_init(|| async move {
                let reset = ResetOnDrop(Some(&self.index_state));
                let result = self.open_index(force_rebuild).await;
                if result.is_ok() {
                    reset.ready();
                }
                result
            })
            .await?;
        Ok(index.clone())
    }

    async fn open_index(&self, force_rebuild: bool) -> Result<Arc<VectorIndex>, HavenCoreError> {
        let location = PathBuf::from(&self.config.index.path);
        if !force_rebuild && VectorIndex::exists(&location) {
            debug!("loading existing index (location={})", location.display());
            let index = VectorIndex::load(&location, self.embedder.clone())?;
            return Ok(Arc::new(index));
        }
        *self.index_state.write() = IndexState::Building;
        let index = build_index(&self.config, self.embedder.clone()).await?;
        Ok(Arc::new(index))
    }

    /// The retrieval stage alone, for inspecting grounding.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<RetrievedChunk>, HavenCoreError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(PromptError::EmptyQuestion.into());
        }
        let index = self.initialize().await?;
        Ok(index.query(question, self.config.retrieval.k).await?)
    }

    /// Answer `question` given `state`; returns the answer and the state with the new turn.
    pub async fn answer(
        &self,
        question: &str,
        state: ConversationState,
    ) -> Result<(String, ConversationState), HavenCoreError> {
        let outcome = self.answer_detailed(question, state).await?;
        Ok((outcome.answer, outcome.state))
    }

    /// [`Orchestrator::answer`] with the prompt and retrieved chunks included.
    pub async fn answer_detailed(
        &self,
        question: &str,
        state: ConversationState,
    ) -> Result<AnswerOutcome, HavenCoreError> {
        if question.trim().is_empty() {
            return Err(PromptError::EmptyQuestion.into());
        }
        let index = self.initialize().await?;
        self.pipeline(index).run(question, state).await
    }

    /// Answer within a stored session and record the turn there. Turns in
    /// one session are taken one at a time.
    pub async fn answer_in_session(
        &self,
        session_id: Uuid,
        question: &str,
    ) -> Result<String, HavenCoreError> {
        let _turn = self.sessions.lock_turns(session_id).await?;
        let state = self.sessions.get(session_id)?;
        let outcome = self.answer_detailed(question, state).await?;
        if let Some(turn) = outcome.state.last() {
            self.sessions.record_turn(session_id, turn.clone())?;
        }
        Ok(outcome.answer)
    }

    pub async fn transcribe(&self, audio_path: &Path) -> Result<String, HavenCoreError> {
        let bridge = self.speech.as_ref().ok_or(HavenCoreError::SpeechUnavailable)?;
        Ok(bridge.transcribe(audio_path).await?)
    }

    pub async fn synthesize(&self, text: &str) -> Result<PathBuf, HavenCoreError> {
        let bridge = self.speech.as_ref().ok_or(HavenCoreError::SpeechUnavailable)?;
        Ok(bridge.synthesize(text).await?)
    }

    /// Transcribe `audio_path`, then answer the transcript.
    pub async fn answer_audio(
        &self,
        audio_path: &Path,
        state: ConversationState,
    ) -> Result<AudioAnswer, HavenCoreError> {
        let transcript = self.transcribe(audio_path).await?;
        let (answer, state) = self.answer(&transcript, state).await?;
        Ok(AudioAnswer {
            transcript,
            answer,
            state,
        })
    }

    /// Apply the configured retention policy to generated audio. Needs no speech backend.
    pub fn prune_audio(&self) -> Result<usize, HavenCoreError> {
        let (dir, policy) = match &self.speech {
            Some(bridge) => (bridge.output_dir().to_path_buf(), *bridge.retention()),
            None => (
                PathBuf::from(&self.config.speech.synthesis.output_dir),
                RetentionPolicy::from(&self.config.speech.retention),
            ),
        };
        let removed = prune_artifacts(&dir, &policy)?;
        info!("pruned audio artifacts (removed={})", removed);
        Ok(removed)
    }

    fn pipeline(&self, index: Arc<VectorIndex>) -> AnswerPipeline {
        AnswerPipeline::new(
            index,
            self.config.retrieval.k,
            HistoryWindow::new(self.config.memory.max_turns, self.config.memory.max_chars),
            self.assembler.clone(),
            self.generator.clone(),
        )
    }
}

/// Returns the index state to `Uninitialized` when an initialization fails
/// or its future is dropped mid-build.
struct ResetOnDrop<'a>(Option<&'a RwLock<IndexState>>);

impl ResetOnDrop<'_> {
    fn ready(mut self) {
        if let Some(state) = self.0.take() {
            *state.write() = IndexState::Ready;
        }
    }
}

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        if let Some(state) = self.0.take() {
            *state.write() = IndexState::Uninitialized;
        }
    }
}

/// Ingest `config.ingest.source_dir` and persist a fresh index at `config.index.path`.
pub async fn build_index(
    config: &HavenConfig,
    embedder: Arc<dyn Embedder>,
) -> Result<VectorIndex, HavenCoreError> {
    let source_dir = PathBuf::from(&config.ingest.source_dir);
    let location = PathBuf::from(&config.index.path);
    info!(
        "building index from source (source_dir={}, location={})",
        source_dir.display(),
        location.display()
    );
    let options = IngestOptions::from(&config.ingest);
    let chunking = ChunkingParams {
        chunk_size: options.chunk_size,
        chunk_overlap: options.chunk_overlap,
    };
    let chunks = DocumentIngestor::new(options)?.ingest(&source_dir)?;
    let index =
        VectorIndex::build_with_chunking(chunks, embedder, &location, Some(chunking)).await?;
    Ok(index)
}
