//! Source directory ingestion.

use crate::chunker::RecursiveCharacterSplitter;
use crate::document::{Chunk, Document};
use crate::error::IngestError;
use haven_rs_config::IngestConfig;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Which files to read and how to chunk them.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOptions {
    /// Lowercase extensions without the dot.
    pub extensions: Vec<String>,
    pub recursive: bool,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self::from(&IngestConfig::default())
    }
}

impl From<&IngestConfig> for IngestOptions {
    fn from(config: &IngestConfig) -> Self {
        Self {
            extensions: config
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            recursive: config.recursive,
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }
}

/// Loads documents from a directory and splits them into chunks.
#[derive(Debug, Clone)]
pub struct DocumentIngestor {
    options: IngestOptions,
    splitter: RecursiveCharacterSplitter,
}

impl DocumentIngestor {
    pub fn new(options: IngestOptions) -> Result<Self, IngestError> {
        let splitter = RecursiveCharacterSplitter::new(options.chunk_size, options.chunk_overlap)?;
        Ok(Self { options, splitter })
    }

    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Load every eligible document under `source_dir` and chunk it.
    pub fn ingest(&self, source_dir: &Path) -> Result<Vec<Chunk>, IngestError> {
        let documents = self.load_documents(source_dir)?;
        info!("loaded {} documents", documents.len());
        let chunks = self.split_documents(&documents);
        info!("split into {} chunks", chunks.len());
        if chunks.is_empty() {
            return Err(IngestError::NoDocuments(source_dir.to_path_buf()));
        }
        Ok(chunks)
    }

    /// Extract documents without chunking. Pages with no text are skipped.
    pub fn load_documents(&self, source_dir: &Path) -> Result<Vec<Document>, IngestError> {
        let mut documents = Vec::new();
        for path in self.eligible_files(source_dir)? {
            let extracted = extract(&path)?;
            debug!(
                "extracted document (path={}, parts={})",
                path.display(),
                extracted.len()
            );
            documents.extend(
                extracted
                    .into_iter()
                    .filter(|doc| !doc.text.trim().is_empty()),
            );
        }
        if documents.is_empty() {
            return Err(IngestError::NoDocuments(source_dir.to_path_buf()));
        }
        Ok(documents)
    }

    /// Split documents in order; ordinals restart for each document.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        documents
            .iter()
            .flat_map(|doc| {
                self.splitter
                    .split(&doc.text)
                    .into_iter()
                    .enumerate()
                    .map(|(ordinal, text)| Chunk::new(text, doc.metadata.clone(), ordinal))
            })
            .collect()
    }

    fn eligible_files(&self, source_dir: &Path) -> Result<Vec<PathBuf>, IngestError> {
        let unreadable = |source| IngestError::Unreadable {
            path: source_dir.to_path_buf(),
            source,
        };
        fs::read_dir(source_dir).map_err(unreadable)?;

        let max_depth = if self.options.recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();
        for entry in WalkDir::new(source_dir)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|err| {
                unreadable(
                    err.into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
                )
            })?;
            if entry.file_type().is_file() && self.is_eligible(entry.path()) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    fn is_eligible(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .is_some_and(|ext| self.options.extensions.contains(&ext))
    }
}

fn extract(path: &Path) -> Result<Vec<Document>, IngestError> {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => extract_pdf(path),
        "txt" | "md" | "markdown" => {
            let text = fs::read_to_string(path).map_err(|err| extract_error(path, err))?;
            Ok(vec![Document::new(text, source_of(path), None)])
        }
        other => Err(IngestError::Extract {
            path: path.to_path_buf(),
            message: format!("unsupported extension: {other}"),
        }),
    }
}

/// One document per page, numbered from zero.
fn extract_pdf(path: &Path) -> Result<Vec<Document>, IngestError> {
    let pdf = lopdf::Document::load(path).map_err(|err| extract_error(path, err))?;
    let source = source_of(path);
    pdf.get_pages()
        .keys()
        .map(|&number| {
            let text = pdf
                .extract_text(&[number])
                .map_err(|err| extract_error(path, err))?;
            Ok(Document::new(text, source.clone(), Some(number.saturating_sub(1))))
        })
        .collect()
}

fn extract_error(path: &Path, err: impl std::fmt::Display) -> IngestError {
    IngestError::Extract {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

fn source_of(path: &Path) -> String {
    path.display().to_string()
}
