//! Document and chunk models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for chunk ids, so the same corpus always yields the same ids.
const CHUNK_NAMESPACE: Uuid = Uuid::from_u128(0x6a1f_3c2e_8b4d_4f7a_9e10_c5d2_7b38_a941);

/// Where a piece of text came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DocumentMetadata {
    /// Source file path.
    pub source: String,
    /// Zero-based page for paginated sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// Extracted text of one source file (or one page of it).
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub text: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn new(text: impl Into<String>, source: impl Into<String>, page: Option<u32>) -> Self {
        Self {
            text: text.into(),
            metadata: DocumentMetadata {
                source: source.into(),
                page,
            },
        }
    }
}

/// A bounded slice of a document, the unit of retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub id: Uuid,
    pub text: String,
    pub metadata: DocumentMetadata,
    /// Position of the chunk within its document.
    pub ordinal: usize,
}

impl Chunk {
    pub fn new(text: impl Into<String>, metadata: DocumentMetadata, ordinal: usize) -> Self {
        let id = chunk_id(&metadata, ordinal);
        Self {
            id,
            text: text.into(),
            metadata,
            ordinal,
        }
    }
}

fn chunk_id(metadata: &DocumentMetadata, ordinal: usize) -> Uuid {
    let page = metadata
        .page
        .map_or_else(|| "-".to_string(), |page| page.to_string());
    let name = format!("{}#{}#{}", metadata.source, page, ordinal);
    Uuid::new_v5(&CHUNK_NAMESPACE, name.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn chunk_ids_are_stable_and_distinct() {
        let meta = DocumentMetadata {
            source: "data/guide.pdf".to_string(),
            page: Some(0),
        };
        let first = Chunk::new("a", meta.clone(), 0);
        let again = Chunk::new("different text", meta.clone(), 0);
        let second = Chunk::new("a", meta, 1);
        assert_eq!(first.id, again.id);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn page_is_part_of_the_id() {
        let page0 = DocumentMetadata {
            source: "guide.pdf".to_string(),
            page: Some(0),
        };
        let whole = DocumentMetadata {
            source: "guide.pdf".to_string(),
            page: None,
        };
        assert_ne!(Chunk::new("x", page0, 0).id, Chunk::new("x", whole, 0).id);
    }
}
