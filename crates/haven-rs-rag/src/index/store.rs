//! On-disk layout of the vector index.
//!
//! `manifest.json` describes the index; `entries.jsonl` holds one entry per
//! line. A write first removes any existing manifest, then renames the new
//! entries and the new manifest into place from temporary files. A present
//! manifest therefore always refers to complete entries of the same build.

use crate::document::{Chunk, DocumentMetadata};
use crate::embedder::EmbedderIdentity;
use crate::error::IndexError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use log::debug;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub(crate) const MANIFEST_FILE: &str = "manifest.json";
pub(crate) const ENTRIES_FILE: &str = "entries.jsonl";
pub(crate) const FORMAT_VERSION: u32 = 1;

/// Chunking parameters the corpus was split with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkingParams {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexManifest {
    pub format_version: u32,
    pub embedder: EmbedderIdentity,
    pub entry_count: usize,
    #[serde(default)]
    pub chunking: Option<ChunkingParams>,
    pub built_at: DateTime<Utc>,
}

/// One stored chunk with its vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct IndexEntry {
    pub id: Uuid,
    pub text: String,
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub ordinal: usize,
    pub vector: Vec<f32>,
}

impl IndexEntry {
    pub fn new(chunk: Chunk, vector: Vec<f32>) -> Self {
        Self {
            id: chunk.id,
            text: chunk.text,
            metadata: chunk.metadata,
            ordinal: chunk.ordinal,
            vector,
        }
    }

    pub fn to_chunk(&self) -> Chunk {
        Chunk {
            id: self.id,
            text: self.text.clone(),
            metadata: self.metadata.clone(),
            ordinal: self.ordinal,
        }
    }
}

pub(crate) fn manifest_path(location: &Path) -> PathBuf {
    location.join(MANIFEST_FILE)
}

pub(crate) fn write(
    location: &Path,
    manifest: &IndexManifest,
    entries: &[IndexEntry],
) -> Result<(), IndexError> {
    fs::create_dir_all(location)?;
    let manifest_path = manifest_path(location);
    match fs::remove_file(&manifest_path) {
        Ok(()) => debug!("removed previous manifest (location={})", location.display()),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }

    let entries_path = location.join(ENTRIES_FILE);
    let entries_tmp = temp_path(&entries_path);
    {
        let mut writer = BufWriter::new(File::create(&entries_tmp)?);
        for entry in entries {
            serde_json::to_writer(&mut writer, entry)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }
    fs::rename(&entries_tmp, &entries_path)?;

    let manifest_tmp = temp_path(&manifest_path);
    fs::write(&manifest_tmp, serde_json::to_vec_pretty(manifest)?)?;
    fs::rename(&manifest_tmp, &manifest_path)?;
    Ok(())
}

pub(crate) fn read_manifest(location: &Path) -> Result<IndexManifest, IndexError> {
    let path = manifest_path(location);
    if !path.exists() {
        return Err(IndexError::NotFound(location.to_path_buf()));
    }
    let bytes = fs::read(&path).map_err(|err| corrupt(location, format!("manifest: {err}")))?;
    let manifest: IndexManifest =
        serde_json::from_slice(&bytes).map_err(|err| corrupt(location, format!("manifest: {err}")))?;
    if manifest.format_version != FORMAT_VERSION {
        return Err(corrupt(
            location,
            format!("unsupported format version {}", manifest.format_version),
        ));
    }
    Ok(manifest)
}

/// Read entries and check them against the manifest.
pub(crate) fn read_entries(
    location: &Path,
    manifest: &IndexManifest,
) -> Result<Vec<IndexEntry>, IndexError> {
    let path = location.join(ENTRIES_FILE);
    let file = File::open(&path).map_err(|err| corrupt(location, format!("entries: {err}")))?;
    let mut entries = Vec::with_capacity(manifest.entry_count);
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line =
            line.map_err(|err| corrupt(location, format!("entry {}: {err}", line_no + 1)))?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: IndexEntry = serde_json::from_str(&line)
            .map_err(|err| corrupt(location, format!("entry {}: {err}", line_no + 1)))?;
        if entry.vector.len() != manifest.embedder.dimension {
            return Err(corrupt(
                location,
                format!(
                    "entry {} has dimension {}, expected {}",
                    line_no + 1,
                    entry.vector.len(),
                    manifest.embedder.dimension
                ),
            ));
        }
        entries.push(entry);
    }
    if entries.len() != manifest.entry_count {
        return Err(corrupt(
            location,
            format!(
                "manifest lists {} entries, found {}",
                manifest.entry_count,
                entries.len()
            ),
        ));
    }
    Ok(entries)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn corrupt(location: &Path, message: String) -> IndexError {
    IndexError::Corrupt {
        path: location.to_path_buf(),
        message,
    }
}
