//! Recursive character text splitter.
//!
//! Splits on the coarsest separator present in the text, merges the pieces
//! back into chunks of at most `chunk_size` characters and carries up to
//! `chunk_overlap` characters of trailing pieces into the next chunk. Pieces
//! that are still too long are split again with the next separator. Lengths
//! are counted in `char`s.

use crate::error::IngestError;

/// Separators tried in order, paragraph first, single characters last.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveCharacterSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, IngestError> {
        if chunk_size == 0 {
            return Err(IngestError::InvalidChunking(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(IngestError::InvalidChunking(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into trimmed, non-empty chunks.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.separators)
            .into_iter()
            .map(|chunk| chunk.trim().to_string())
            .filter(|chunk| !chunk.is_empty())
            .collect()
    }

    fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut separator = separators.last().map(String::as_str).unwrap_or("");
        let mut finer: &[String] = &[];
        for (idx, candidate) in separators.iter().enumerate() {
            if candidate.is_empty() {
                separator = "";
                break;
            }
            if text.contains(candidate.as_str()) {
                separator = candidate;
                finer = &separators[idx + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting));
                fitting.clear();
            }
            if finer.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_with(piece, finer));
            }
        }
        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting));
        }
        chunks
    }

    /// Greedily join pieces into chunks, sliding the window forward so that
    /// at most `chunk_overlap` characters carry over.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: Vec<(&str, usize)> = Vec::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size && !window.is_empty() {
                if let Some(chunk) = join_trimmed(&window) {
                    chunks.push(chunk);
                }
                while !window.is_empty()
                    && (total > self.chunk_overlap || total + len > self.chunk_size)
                {
                    let (_, first_len) = window.remove(0);
                    total -= first_len;
                }
            }
            window.push((piece, len));
            total += len;
        }
        if let Some(chunk) = join_trimmed(&window) {
            chunks.push(chunk);
        }
        chunks
    }
}

/// Split on `separator`, keeping it at the start of the following piece.
/// An empty separator splits into single characters.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(idx, ch)| &text[idx..idx + ch.len_utf8()])
            .collect();
    }
    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        pieces.push(&text[start..idx]);
        start = idx;
    }
    pieces.push(&text[start..]);
    pieces.retain(|piece| !piece.is_empty());
    pieces
}

fn join_trimmed(window: &[(&str, usize)]) -> Option<String> {
    let joined: String = window.iter().map(|(piece, _)| *piece).collect();
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
