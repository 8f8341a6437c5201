//! Persisted flat vector index with cosine ranking.

mod store;

pub use store::{ChunkingParams, IndexManifest};

use crate::document::Chunk;
use crate::embedder::{Embedder, EmbedderIdentity, cosine_similarity};
use crate::error::{EmbeddingError, IndexError};
use chrono::Utc;
use log::{debug, info};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use store::IndexEntry;

/// A chunk returned by a query with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Read-only once built or loaded; share it through `Arc`.
pub struct VectorIndex {
    location: PathBuf,
    manifest: IndexManifest,
    entries: Vec<IndexEntry>,
    embedder: Arc<dyn Embedder>,
}

impl fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorIndex")
            .field("location", &self.location)
            .field("embedder", &self.manifest.embedder)
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl VectorIndex {
    /// Whether an index has been persisted at `location`.
    pub fn exists(location: &Path) -> bool {
        store::manifest_path(location).is_file()
    }

    /// Embed `chunks` and persist them at `location`, replacing any prior index.
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: Arc<dyn Embedder>,
        location: &Path,
    ) -> Result<Self, IndexError> {
        Self::build_with_chunking(chunks, embedder, location, None).await
    }

    /// Like [`VectorIndex::build`], recording the chunking parameters in the manifest.
    pub async fn build_with_chunking(
        chunks: Vec<Chunk>,
        embedder: Arc<dyn Embedder>,
        location: &Path,
        chunking: Option<ChunkingParams>,
    ) -> Result<Self, IndexError> {
        if chunks.is_empty() {
            return Err(IndexError::Empty);
        }
        info!(
            "building vector index (chunks={}, embedder={}, location={})",
            chunks.len(),
            embedder.identity(),
            location.display()
        );
        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await?;
        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry::new(chunk, vector))
            .collect();

        let manifest = IndexManifest {
            format_version: store::FORMAT_VERSION,
            embedder: embedder.identity().clone(),
            entry_count: entries.len(),
            chunking,
            built_at: Utc::now(),
        };
        store::write(location, &manifest, &entries)?;
        info!("vector index persisted (entries={})", entries.len());

        Ok(Self {
            location: location.to_path_buf(),
            manifest,
            entries,
            embedder,
        })
    }

    /// Load a persisted index. The stored embedder identity must match `embedder`.
    pub fn load(location: &Path, embedder: Arc<dyn Embedder>) -> Result<Self, IndexError> {
        let manifest = store::read_manifest(location)?;
        if &manifest.embedder != embedder.identity() {
            return Err(IndexError::EmbedderMismatch {
                stored: manifest.embedder.to_string(),
                supplied: embedder.identity().to_string(),
            });
        }
        let entries = store::read_entries(location, &manifest)?;
        info!(
            "vector index loaded (entries={}, location={})",
            entries.len(),
            location.display()
        );
        Ok(Self {
            location: location.to_path_buf(),
            manifest,
            entries,
            embedder,
        })
    }

    /// Embed `text` and return the `k` most similar chunks.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<RetrievedChunk>, IndexError> {
        if k == 0 {
            return Err(IndexError::InvalidK);
        }
        let vector = self.embedder.embed(text).await?;
        self.search(&vector, k)
    }

    /// Rank stored chunks against `vector` by cosine similarity, highest
    /// first. Equal scores keep insertion order.
    pub fn search(&self, vector: &[f32], k: usize) -> Result<Vec<RetrievedChunk>, IndexError> {
        if k == 0 {
            return Err(IndexError::InvalidK);
        }
        let expected = self.manifest.embedder.dimension;
        if vector.len() != expected {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: vector.len(),
            }
            .into());
        }
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (idx, cosine_similarity(vector, &entry.vector)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        debug!(
            "vector search (k={}, returned={}, top_score={:?})",
            k,
            scored.len(),
            scored.first().map(|(_, score)| *score)
        );
        Ok(scored
            .into_iter()
            .map(|(idx, score)| RetrievedChunk {
                chunk: self.entries[idx].to_chunk(),
                score,
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn embedder_identity(&self) -> &EmbedderIdentity {
        &self.manifest.embedder
    }

    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }
}
