//! Error types for the core orchestrator crate.

use crate::generator::GenerationError;
use crate::prompt::PromptError;
use haven_rs_config::ConfigError;
use haven_rs_rag::{EmbeddingError, IndexError, IngestError};
use haven_rs_speech::SpeechError;
use thiserror::Error;
use uuid::Uuid;

/// Errors returned by orchestrator operations. Component errors are wrapped
/// unchanged so callers can match on the wrapped variant.
#[derive(Debug, Error)]
pub enum HavenCoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Speech(#[from] SpeechError),
    /// No speech bridge was attached to the orchestrator.
    #[error("speech bridge is not configured")]
    SpeechUnavailable,
    /// Session id is unknown to the session store.
    #[error("unknown session: {0}")]
    UnknownSession(Uuid),
}
