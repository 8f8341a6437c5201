//! Layered configuration loader.
//!
//! Discovers configuration layers (system, user, project, cwd, runtime),
//! validates each against the schema, deep-merges them in precedence order and
//! produces the effective `HavenConfig`.

mod layer_io;
mod merge;
mod schema;
mod utils;

#[cfg(test)]
mod tests;

use crate::model::{
    EMBEDDER_PROVIDERS, GENERATION_PROVIDERS, RECOGNITION_PROVIDERS, SYNTHESIS_PROVIDERS,
};
use crate::{ConfigError, HavenConfig};
use log::{debug, info};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Config filename looked up in every local layer.
const DEFAULT_CONFIG_FILE: &str = "haven.json5";
/// Per-user config directory under the home directory.
const DEFAULT_CONFIG_DIR: &str = ".haven";
/// Marker entries that identify a project root.
const DEFAULT_PROJECT_ROOT_MARKERS: &[&str] = &[".git"];

#[cfg(unix)]
const SYSTEM_CONFIG_PATH: &str = "/etc/haven/haven.json5";
#[cfg(windows)]
const SYSTEM_CONFIG_PATH: &str = "C:\\ProgramData\\haven\\haven.json5";

/// Effective config plus the layers that produced it.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub config: HavenConfig,
    pub layers: Vec<ConfigLayer>,
}

/// Origin of a config layer, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    System,
    User,
    Project,
    Cwd,
    Runtime,
}

/// A layer that was found and merged.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    pub path: PathBuf,
}

/// Options controlling layer discovery.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    /// Directory used to find the project root and the cwd layer.
    pub cwd: PathBuf,
    /// System layer (defaults to `/etc/haven/haven.json5` on Unix).
    pub system_config_path: Option<PathBuf>,
    /// User layer (defaults to `~/.haven/haven.json5`).
    pub user_config_path: Option<PathBuf>,
    /// Explicit override files, applied last and required to exist.
    pub runtime_paths: Vec<PathBuf>,
    pub project_root_markers: Vec<String>,
}

impl LayeredConfigOptions {
    /// Options with the default layer locations for `cwd`.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            system_config_path: layer_io::default_system_config_path(),
            user_config_path: layer_io::default_user_config_path(),
            runtime_paths: Vec::new(),
            project_root_markers: DEFAULT_PROJECT_ROOT_MARKERS
                .iter()
                .map(|marker| marker.to_string())
                .collect(),
        }
    }

    /// Options that only consult the project, cwd and runtime layers.
    pub fn local_only(cwd: impl AsRef<Path>) -> Self {
        Self {
            system_config_path: None,
            user_config_path: None,
            ..Self::new(cwd)
        }
    }

    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }
}

impl HavenConfig {
    /// Load a single config file without layering.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        info!("loading config from path: {}", path.as_ref().display());
        let contents = fs::read_to_string(path)?;
        let value: Value = json5::from_str(&contents)?;
        config_from_value(value, "config")
    }

    /// Load a config from JSON5 text without layering.
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("loading config from raw contents (len={})", contents.len());
        let value: Value = json5::from_str(contents)?;
        config_from_value(value, "config")
    }

    /// Load the layered stack using the default locations.
    pub fn load_layered(cwd: impl AsRef<Path>) -> Result<LayeredConfig, ConfigError> {
        Self::load_layered_with_options(LayeredConfigOptions::new(cwd))
    }

    /// Load the layered stack.
    ///
    /// Precedence (low -> high): system, user, project root, cwd, runtime paths.
    /// A file reached by two layers (cwd is the project root) is merged once.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let cwd = utils::normalize_path(&options.cwd)?;
        debug!("loading layered config (cwd={})", cwd.display());

        let mut candidates: Vec<(ConfigLayerSource, PathBuf)> = Vec::new();
        if let Some(path) = options.system_config_path {
            candidates.push((ConfigLayerSource::System, path));
        }
        if let Some(path) = options.user_config_path {
            candidates.push((ConfigLayerSource::User, path));
        }
        match utils::find_project_root(&cwd, &options.project_root_markers) {
            Some(root) => {
                debug!("resolved project root: {}", root.display());
                candidates.push((ConfigLayerSource::Project, root.join(DEFAULT_CONFIG_FILE)));
            }
            None => debug!("project root not found; skipping project layer"),
        }
        candidates.push((ConfigLayerSource::Cwd, cwd.join(DEFAULT_CONFIG_FILE)));

        let mut seen = HashSet::new();
        let mut layers = Vec::new();
        let mut merged = Value::Object(serde_json::Map::new());

        for (source, path) in candidates {
            if !seen.insert(utils::unique_path(&path)) {
                debug!("skipping duplicate layer (source={:?}, path={})", source, path.display());
                continue;
            }
            if let Some(layer) = layer_io::load_optional_layer(source, &path)? {
                merge::merge_json_values(&mut merged, &layer.value);
                layers.push(layer.meta);
            }
        }

        for path in &options.runtime_paths {
            let layer = layer_io::load_required_layer(ConfigLayerSource::Runtime, path)?;
            merge::merge_json_values(&mut merged, &layer.value);
            layers.push(layer.meta);
        }

        let config = config_from_value(merged, "effective")?;
        info!("layered config loaded (layers={})", layers.len());
        Ok(LayeredConfig { config, layers })
    }

    /// Check cross-field invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ingest.chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "ingest.chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "ingest.chunk_overlap ({}) must be smaller than ingest.chunk_size ({})",
                self.ingest.chunk_overlap, self.ingest.chunk_size
            )));
        }
        if self.retrieval.k == 0 {
            return Err(ConfigError::Invalid(
                "retrieval.k must be greater than zero".to_string(),
            ));
        }
        if self.embedder.dimension == 0 {
            return Err(ConfigError::Invalid(
                "embedder.dimension must be greater than zero".to_string(),
            ));
        }
        if self.embedder.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "embedder.batch_size must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::Invalid(format!(
                "generation.temperature must be within 0.0..=2.0, got {}",
                self.generation.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.speech.recognition.silence_threshold) {
            return Err(ConfigError::Invalid(
                "speech.recognition.silence_threshold must be within 0.0..=1.0".to_string(),
            ));
        }

        ensure_provider("embedder", &self.embedder.provider, EMBEDDER_PROVIDERS)?;
        ensure_provider("generation", &self.generation.provider, GENERATION_PROVIDERS)?;
        ensure_provider(
            "speech.recognition",
            &self.speech.recognition.provider,
            RECOGNITION_PROVIDERS,
        )?;
        ensure_provider(
            "speech.synthesis",
            &self.speech.synthesis.provider,
            SYNTHESIS_PROVIDERS,
        )?;
        if self.speech.synthesis.provider == "http" && self.speech.synthesis.base_url.is_none() {
            return Err(ConfigError::Invalid(
                "speech.synthesis.base_url is required for the http provider".to_string(),
            ));
        }
        Ok(())
    }
}

/// A parsed layer ready to merge.
#[derive(Debug, Clone)]
struct LoadedLayer {
    meta: ConfigLayer,
    value: Value,
}

fn config_from_value(value: Value, label: &str) -> Result<HavenConfig, ConfigError> {
    schema::validate_layer_schema(&value, label)?;
    let config: HavenConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}

fn ensure_provider(section: &str, provider: &str, known: &[&str]) -> Result<(), ConfigError> {
    if known.contains(&provider) {
        Ok(())
    } else {
        Err(ConfigError::UnsupportedProvider {
            section: section.to_string(),
            provider: provider.to_string(),
        })
    }
}
