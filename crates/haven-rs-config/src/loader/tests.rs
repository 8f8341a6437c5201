//! Tests for config parsing, validation and layering.

use super::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

/// Project with a `.git` marker and a nested working directory.
fn project_fixture(temp: &TempDir) -> (PathBuf, PathBuf) {
    let project_root = temp.path().join("project");
    fs::create_dir_all(project_root.join(".git")).expect("git");
    let cwd = project_root.join("subdir");
    fs::create_dir_all(&cwd).expect("cwd");
    (project_root, cwd)
}

#[test]
fn empty_config_uses_documented_defaults() {
    let config = HavenConfig::load_from_str("{}").expect("config");
    assert_eq!(config.embedder.provider, "onnx");
    assert_eq!(config.embedder.model, "sentence-transformers/all-MiniLM-L6-v2");
    assert_eq!(
        config.embedder.model_dir.as_deref(),
        Some("./models/all-MiniLM-L6-v2")
    );
    assert_eq!(config.embedder.dimension, 384);
    assert_eq!(config.ingest.source_dir, "./data");
    assert_eq!(config.ingest.extensions, vec!["pdf".to_string()]);
    assert_eq!(config.ingest.chunk_size, 500);
    assert_eq!(config.ingest.chunk_overlap, 50);
    assert_eq!(config.index.path, "./vector_index");
    assert_eq!(config.retrieval.k, 3);
    assert_eq!(config.generation.provider, "groq");
    assert_eq!(config.generation.model, "llama-3.3-70b-versatile");
    assert_eq!(config.generation.temperature, 0.0);
    assert_eq!(config.generation.api_key_env, "GROQ_API_KEY");
    assert_eq!(config.generation.timeout_secs, Some(60));
    assert_eq!(config.memory.max_turns, Some(10));
    assert_eq!(config.speech.recognition.model_size, "tiny");
    assert_eq!(config.speech.synthesis.output_dir, "./audio");
    assert_eq!(config.speech.retention.max_files, None);
}

#[test]
fn builder_matches_parsed_defaults() {
    let built = HavenConfig::builder().build();
    let parsed = HavenConfig::load_from_str("{}").expect("config");
    assert_eq!(built.ingest, parsed.ingest);
    assert_eq!(built.generation, parsed.generation);
    assert_eq!(built.speech, parsed.speech);
    built.validate().expect("valid");
}

#[test]
fn rejects_unknown_top_level_key() {
    let err = HavenConfig::load_from_str("{ unexpected: true }").unwrap_err();
    assert!(format!("{err}").contains("config:unexpected"));
    assert!(format!("{err}").contains("unknown key"));
}

#[test]
fn rejects_unknown_nested_key() {
    let err = HavenConfig::load_from_str("{ speech: { synthesis: { pitch: 2 } } }").unwrap_err();
    assert!(format!("{err}").contains("speech.synthesis.pitch"));
}

#[test]
fn rejects_wrong_field_type_with_path() {
    let err = HavenConfig::load_from_str("{ ingest: { chunk_size: \"big\" } }").unwrap_err();
    match err {
        ConfigError::InvalidField { path, message } => {
            assert_eq!(path, "config:ingest.chunk_size");
            assert_eq!(message, "expected non-negative integer");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn rejects_overlap_not_smaller_than_chunk_size() {
    let err = HavenConfig::load_from_str("{ ingest: { chunk_size: 50, chunk_overlap: 50 } }")
        .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn rejects_zero_k() {
    let err = HavenConfig::load_from_str("{ retrieval: { k: 0 } }").unwrap_err();
    assert!(format!("{err}").contains("retrieval.k"));
}

#[test]
fn rejects_unknown_provider() {
    let err = HavenConfig::load_from_str("{ generation: { provider: \"carrier-pigeon\" } }")
        .unwrap_err();
    match err {
        ConfigError::UnsupportedProvider { section, provider } => {
            assert_eq!(section, "generation");
            assert_eq!(provider, "carrier-pigeon");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn nullable_fields_accept_null() {
    let config = HavenConfig::load_from_str(
        "{ memory: { max_turns: null }, prompt: { persona: null }, embedder: { model_dir: null } }",
    )
    .expect("config");
    assert_eq!(config.memory.max_turns, None);
    assert_eq!(config.prompt.persona, None);
    assert_eq!(config.embedder.model_dir, None);
}

#[test]
fn http_synthesis_requires_base_url() {
    let err = HavenConfig::load_from_str("{ speech: { synthesis: { provider: \"http\" } } }")
        .unwrap_err();
    assert!(format!("{err}").contains("base_url"));
}

#[test]
fn cwd_layer_overrides_project_and_user() {
    let temp = TempDir::new().expect("tmp");
    let (project_root, cwd) = project_fixture(&temp);

    let user_config = temp.path().join("user.json5");
    write_json5(&user_config, "{ retrieval: { k: 5 }, index: { path: \"/user\" } }");
    write_json5(
        &project_root.join(DEFAULT_CONFIG_FILE),
        "{ retrieval: { k: 6 }, ingest: { source_dir: \"/project/data\" } }",
    );
    write_json5(&cwd.join(DEFAULT_CONFIG_FILE), "{ retrieval: { k: 7 } }");

    let mut options = LayeredConfigOptions::local_only(&cwd);
    options.user_config_path = Some(user_config);

    let layered = HavenConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.retrieval.k, 7);
    assert_eq!(layered.config.ingest.source_dir, "/project/data");
    assert_eq!(layered.config.index.path, "/user");
    let sources: Vec<_> = layered.layers.iter().map(|layer| layer.source).collect();
    assert_eq!(
        sources,
        vec![
            ConfigLayerSource::User,
            ConfigLayerSource::Project,
            ConfigLayerSource::Cwd
        ]
    );
}

#[test]
fn runtime_layer_overrides_cwd() {
    let temp = TempDir::new().expect("tmp");
    let (_, cwd) = project_fixture(&temp);

    write_json5(
        &cwd.join(DEFAULT_CONFIG_FILE),
        "{ generation: { model: \"cwd-model\", temperature: 0.5 } }",
    );
    let runtime = temp.path().join("runtime.json5");
    write_json5(&runtime, "{ generation: { model: \"runtime-model\" } }");

    let options = LayeredConfigOptions::local_only(&cwd).with_runtime_path(&runtime);
    let layered = HavenConfig::load_layered_with_options(options).expect("layered");
    assert_eq!(layered.config.generation.model, "runtime-model");
    assert_eq!(layered.config.generation.temperature, 0.5);
}

#[test]
fn project_root_layer_is_merged_once_when_cwd_is_root() {
    let temp = TempDir::new().expect("tmp");
    let (project_root, _) = project_fixture(&temp);
    write_json5(&project_root.join(DEFAULT_CONFIG_FILE), "{ retrieval: { k: 4 } }");

    let layered = HavenConfig::load_layered_with_options(LayeredConfigOptions::local_only(
        &project_root,
    ))
    .expect("layered");
    assert_eq!(layered.layers.len(), 1);
    assert_eq!(layered.layers[0].source, ConfigLayerSource::Project);
}

#[test]
fn missing_runtime_layer_is_an_error() {
    let temp = TempDir::new().expect("tmp");
    let options = LayeredConfigOptions::local_only(temp.path())
        .with_runtime_path(temp.path().join("absent.json5"));
    let err = HavenConfig::load_layered_with_options(options).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFailed(_)));
}

#[test]
fn layer_errors_name_the_layer() {
    let temp = TempDir::new().expect("tmp");
    let (_, cwd) = project_fixture(&temp);
    write_json5(&cwd.join(DEFAULT_CONFIG_FILE), "{ retrieval: { top: 2 } }");

    let err = HavenConfig::load_layered_with_options(LayeredConfigOptions::local_only(&cwd))
        .unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("cwd("));
    assert!(msg.contains("retrieval.top"));
}
