//! Reading config layers from disk.

use super::{
    ConfigLayer, ConfigLayerSource, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILE, LoadedLayer,
    SYSTEM_CONFIG_PATH, schema,
};
use crate::ConfigError;
use directories::UserDirs;
use log::debug;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Load a layer if its file exists.
pub(super) fn load_optional_layer(
    source: ConfigLayerSource,
    path: &Path,
) -> Result<Option<LoadedLayer>, ConfigError> {
    if !path.exists() {
        debug!(
            "layer missing (source={:?}, path={})",
            source,
            path.display()
        );
        return Ok(None);
    }
    load_required_layer(source, path).map(Some)
}

/// Load and schema-check a layer that must exist.
pub(super) fn load_required_layer(
    source: ConfigLayerSource,
    path: &Path,
) -> Result<LoadedLayer, ConfigError> {
    debug!(
        "loading config layer (source={:?}, path={})",
        source,
        path.display()
    );
    let contents = fs::read_to_string(path)?;
    let value: Value = json5::from_str(&contents)?;
    schema::validate_layer_schema(&value, &layer_label(source, path))?;
    Ok(LoadedLayer {
        meta: ConfigLayer {
            source,
            path: path.to_path_buf(),
        },
        value,
    })
}

/// Label used as the prefix of schema error paths, e.g. `cwd(/srv/haven.json5)`.
pub(super) fn layer_label(source: ConfigLayerSource, path: &Path) -> String {
    let name = match source {
        ConfigLayerSource::System => "system",
        ConfigLayerSource::User => "user",
        ConfigLayerSource::Project => "project",
        ConfigLayerSource::Cwd => "cwd",
        ConfigLayerSource::Runtime => "runtime",
    };
    format!("{name}({})", path.display())
}

pub(super) fn default_system_config_path() -> Option<PathBuf> {
    #[cfg(any(unix, windows))]
    {
        Some(PathBuf::from(SYSTEM_CONFIG_PATH))
    }
    #[cfg(not(any(unix, windows)))]
    {
        None
    }
}

pub(super) fn default_user_config_path() -> Option<PathBuf> {
    UserDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(DEFAULT_CONFIG_DIR)
            .join(DEFAULT_CONFIG_FILE)
    })
}
