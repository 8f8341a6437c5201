//! Core of Haven: prompt assembly, generation and the orchestrator that
//! ties retrieval, memory and speech together.

pub mod error;
pub mod generator;
pub mod llm;
pub mod orchestrator;
pub mod pipeline;
pub mod prompt;
pub mod sessions;

pub use error::HavenCoreError;
pub use generator::{GenerationError, Generator};
pub use llm::build_provider;
pub use orchestrator::{AudioAnswer, IndexState, Orchestrator, build_index};
pub use pipeline::{AnswerOutcome, AnswerPipeline, Stage};
pub use prompt::{DEFAULT_PERSONA, Prompt, PromptAssembler, PromptError};
pub use sessions::{SessionStore, SessionSummary};
