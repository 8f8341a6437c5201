//! Error types for ingestion, embedding and the vector index.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning a source directory into chunks.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("source directory {path} is unreadable: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no documents found in {0}")]
    NoDocuments(PathBuf),
    #[error("failed to extract text from {path}: {message}")]
    Extract { path: PathBuf, message: String },
    #[error("invalid chunking: {0}")]
    InvalidChunking(String),
}

/// Errors raised by embedder backends.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Empty or whitespace-only input at `index` within the batch.
    #[error("cannot embed empty text (index={index})")]
    EmptyInput { index: usize },
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("embedding request timed out after {0}s")]
    Timeout(u64),
    #[error("embedder unavailable: {0}")]
    Unavailable(String),
    #[error("embedding backend error: {0}")]
    Backend(String),
}

/// Errors raised while building, loading or querying the index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("no vector index at {0}")]
    NotFound(PathBuf),
    #[error("vector index at {path} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },
    #[error("index was built with embedder {stored}, but {supplied} was supplied")]
    EmbedderMismatch { stored: String, supplied: String },
    #[error("cannot build an index from zero chunks")]
    Empty,
    #[error("k must be greater than zero")]
    InvalidK,
    #[error("index io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("index serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}
