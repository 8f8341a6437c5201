//! Error types for config loading and validation.

use thiserror::Error;

/// Errors returned while loading or validating config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading a config file failed.
    #[error("failed to read config: {0}")]
    ReadFailed(#[from] std::io::Error),
    /// Parsing a JSON5 layer failed.
    #[error("failed to parse config: {0}")]
    ParseFailed(#[from] json5::Error),
    /// The merged JSON did not match the typed schema.
    #[error("failed to decode config: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    /// A field failed schema validation.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
    /// A backend name is not one this build understands.
    #[error("unsupported {section} provider: {provider}")]
    UnsupportedProvider { section: String, provider: String },
    /// Cross-field validation failure.
    #[error("invalid config: {0}")]
    Invalid(String),
}
