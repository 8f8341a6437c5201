//! Retrieval side of Haven: document ingestion, chunking, embedding and the
//! persisted vector index.

pub mod chunker;
pub mod document;
pub mod embedder;
pub mod error;
pub mod index;
pub mod ingest;

/// Recursive character splitter.
pub use chunker::RecursiveCharacterSplitter;
/// Document and chunk models.
pub use document::{Chunk, Document, DocumentMetadata};
/// Embedder interface and backends.
pub use embedder::{
    Embedder, EmbedderIdentity, HashingEmbedder, ProviderEmbedder, embedder_from_config,
};
#[cfg(feature = "onnx")]
pub use embedder::OnnxEmbedder;
/// Error types.
pub use error::{EmbeddingError, IndexError, IngestError};
/// Vector index.
pub use index::{ChunkingParams, IndexManifest, RetrievedChunk, VectorIndex};
/// Directory ingestion.
pub use ingest::{DocumentIngestor, IngestOptions};
