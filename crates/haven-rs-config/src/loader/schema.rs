//! Structural validation of raw JSON5 layers.
//!
//! Runs before serde decoding so unknown keys and wrong types are reported
//! with the layer and a dotted path (`cwd(/srv/haven.json5):ingest.chunk_size`)
//! instead of a bare serde message.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Validate one layer (or the merged result) against the schema.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    ensure_allowed_keys(
        map,
        &[
            "$schema",
            "embedder",
            "ingest",
            "index",
            "retrieval",
            "generation",
            "memory",
            "prompt",
            "speech",
        ],
        layer,
        "",
    )?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("embedder") {
        validate_embedder(value, layer, "embedder")?;
    }
    if let Some(value) = map.get("ingest") {
        validate_ingest(value, layer, "ingest")?;
    }
    if let Some(value) = map.get("index") {
        let map = expect_object(value, layer, "index")?;
        ensure_allowed_keys(map, &["path"], layer, "index")?;
        check_fields(map, layer, "index", &[("path", Kind::String)])?;
    }
    if let Some(value) = map.get("retrieval") {
        let map = expect_object(value, layer, "retrieval")?;
        ensure_allowed_keys(map, &["k"], layer, "retrieval")?;
        check_fields(map, layer, "retrieval", &[("k", Kind::Unsigned)])?;
    }
    if let Some(value) = map.get("generation") {
        validate_generation(value, layer, "generation")?;
    }
    if let Some(value) = map.get("memory") {
        let map = expect_object(value, layer, "memory")?;
        ensure_allowed_keys(map, &["max_turns", "max_chars"], layer, "memory")?;
        check_fields(
            map,
            layer,
            "memory",
            &[
                ("max_turns", Kind::OptionalUnsigned),
                ("max_chars", Kind::OptionalUnsigned),
            ],
        )?;
    }
    if let Some(value) = map.get("prompt") {
        let map = expect_object(value, layer, "prompt")?;
        ensure_allowed_keys(map, &["persona", "additional_instructions"], layer, "prompt")?;
        check_fields(
            map,
            layer,
            "prompt",
            &[
                ("persona", Kind::OptionalString),
                ("additional_instructions", Kind::OptionalString),
            ],
        )?;
    }
    if let Some(value) = map.get("speech") {
        validate_speech(value, layer, "speech")?;
    }
    Ok(())
}

fn validate_embedder(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &[
            "provider",
            "model",
            "dimension",
            "model_dir",
            "batch_size",
            "timeout_secs",
        ],
        layer,
        path,
    )?;
    check_fields(
        map,
        layer,
        path,
        &[
            ("provider", Kind::String),
            ("model", Kind::String),
            ("dimension", Kind::Unsigned),
            ("model_dir", Kind::OptionalString),
            ("batch_size", Kind::Unsigned),
            ("timeout_secs", Kind::OptionalUnsigned),
        ],
    )
}

fn validate_ingest(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &[
            "source_dir",
            "extensions",
            "recursive",
            "chunk_size",
            "chunk_overlap",
        ],
        layer,
        path,
    )?;
    check_fields(
        map,
        layer,
        path,
        &[
            ("source_dir", Kind::String),
            ("recursive", Kind::Bool),
            ("chunk_size", Kind::Unsigned),
            ("chunk_overlap", Kind::Unsigned),
        ],
    )?;
    if let Some(value) = map.get("extensions") {
        validate_string_array(value, layer, &join_path(path, "extensions"))?;
    }
    Ok(())
}

fn validate_generation(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &[
            "provider",
            "model",
            "temperature",
            "api_key_env",
            "base_url",
            "max_tokens",
            "timeout_secs",
        ],
        layer,
        path,
    )?;
    check_fields(
        map,
        layer,
        path,
        &[
            ("provider", Kind::String),
            ("model", Kind::String),
            ("temperature", Kind::Number),
            ("api_key_env", Kind::String),
            ("base_url", Kind::OptionalString),
            ("max_tokens", Kind::OptionalUnsigned),
            ("timeout_secs", Kind::OptionalUnsigned),
        ],
    )
}

fn validate_speech(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["recognition", "synthesis", "retention"], layer, path)?;

    if let Some(value) = map.get("recognition") {
        let path = join_path(path, "recognition");
        let map = expect_object(value, layer, &path)?;
        ensure_allowed_keys(
            map,
            &[
                "provider",
                "model_size",
                "language",
                "models_dir",
                "silence_threshold",
                "base_url",
                "model",
                "api_key_env",
            ],
            layer,
            &path,
        )?;
        check_fields(
            map,
            layer,
            &path,
            &[
                ("provider", Kind::String),
                ("model_size", Kind::String),
                ("language", Kind::String),
                ("models_dir", Kind::String),
                ("silence_threshold", Kind::Number),
                ("base_url", Kind::String),
                ("model", Kind::String),
                ("api_key_env", Kind::String),
            ],
        )?;
    }
    if let Some(value) = map.get("synthesis") {
        let path = join_path(path, "synthesis");
        let map = expect_object(value, layer, &path)?;
        ensure_allowed_keys(
            map,
            &[
                "provider",
                "language",
                "voice",
                "output_dir",
                "base_url",
                "model",
                "api_key_env",
            ],
            layer,
            &path,
        )?;
        check_fields(
            map,
            layer,
            &path,
            &[
                ("provider", Kind::String),
                ("language", Kind::String),
                ("voice", Kind::OptionalString),
                ("output_dir", Kind::String),
                ("base_url", Kind::OptionalString),
                ("model", Kind::OptionalString),
                ("api_key_env", Kind::OptionalString),
            ],
        )?;
    }
    if let Some(value) = map.get("retention") {
        let path = join_path(path, "retention");
        let map = expect_object(value, layer, &path)?;
        ensure_allowed_keys(map, &["max_files", "max_age_secs"], layer, &path)?;
        check_fields(
            map,
            layer,
            &path,
            &[
                ("max_files", Kind::OptionalUnsigned),
                ("max_age_secs", Kind::OptionalUnsigned),
            ],
        )?;
    }
    Ok(())
}

/// Expected JSON shape of a leaf field.
#[derive(Debug, Clone, Copy)]
enum Kind {
    String,
    OptionalString,
    Bool,
    Unsigned,
    OptionalUnsigned,
    Number,
}

/// Check every present field in `fields` against its expected kind.
fn check_fields(
    map: &Map<String, Value>,
    layer: &str,
    path: &str,
    fields: &[(&str, Kind)],
) -> Result<(), ConfigError> {
    for (key, kind) in fields {
        let Some(value) = map.get(*key) else {
            continue;
        };
        let field_path = join_path(path, key);
        match kind {
            Kind::String => expect_string(value, layer, &field_path)?,
            Kind::OptionalString if value.is_null() => {}
            Kind::OptionalString => expect_string(value, layer, &field_path)?,
            Kind::Bool => expect_bool(value, layer, &field_path)?,
            Kind::Unsigned => expect_u64(value, layer, &field_path)?,
            Kind::OptionalUnsigned if value.is_null() => {}
            Kind::OptionalUnsigned => expect_u64(value, layer, &field_path)?,
            Kind::Number => expect_f64(value, layer, &field_path)?,
        }
    }
    Ok(())
}

fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_string() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

fn expect_bool(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_boolean() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected bool"))
    }
}

/// Non-negative integer.
fn expect_u64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_u64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected non-negative integer"))
    }
}

fn expect_f64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_number() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected number"))
    }
}

fn validate_string_array(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let Value::Array(items) = value else {
        return Err(invalid_field(layer, path, "expected array"));
    };
    for (idx, item) in items.iter().enumerate() {
        if !item.is_string() {
            return Err(invalid_field(
                layer,
                &format!("{path}[{idx}]"),
                "expected string",
            ));
        }
    }
    Ok(())
}

fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(invalid_field(layer, &join_path(path, key), "unknown key")),
        None => Ok(()),
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{path}"),
        message: message.to_string(),
    }
}
