//! LLM provider construction from `GenerationConfig`.

use crate::generator::GenerationError;
use autoagents_llm::LLMProvider;
use autoagents_llm::backends::groq::Groq;
use autoagents_llm::backends::ollama::Ollama;
use autoagents_llm::backends::openai::OpenAI;
use autoagents_llm::builder::LLMBuilder;
use haven_rs_config::GenerationConfig;
use log::info;
use std::sync::Arc;

/// Build the provider named by `config.provider`. Hosted providers read
/// their key from `config.api_key_env`; Ollama needs none.
pub fn build_provider(config: &GenerationConfig) -> Result<Arc<dyn LLMProvider>, GenerationError> {
    info!(
        "building LLM provider (provider={}, model={}, temperature={})",
        config.provider, config.model, config.temperature
    );
    macro_rules! configure {
        ($builder:expr) => {{
            let mut builder = $builder
                .model(config.model.clone())
                .temperature(config.temperature);
            if let Some(base_url) = &config.base_url {
                builder = builder.base_url(base_url.clone());
            }
            if let Some(max_tokens) = config.max_tokens {
                builder = builder.max_tokens(max_tokens);
            }
            if let Some(timeout) = config.timeout_secs {
                builder = builder.timeout_seconds(timeout);
            }
            builder
        }};
    }

    let provider: Arc<dyn LLMProvider> = match config.provider.as_str() {
        "groq" => configure!(LLMBuilder::<Groq>::new().api_key(api_key(config)?))
            .build()
            .map_err(|err| GenerationError::Provider(err.to_string()))?,
        "openai" => configure!(LLMBuilder::<OpenAI>::new().api_key(api_key(config)?))
            .build()
            .map_err(|err| GenerationError::Provider(err.to_string()))?,
        "ollama" => configure!(LLMBuilder::<Ollama>::new())
            .build()
            .map_err(|err| GenerationError::Provider(err.to_string()))?,
        other => {
            return Err(GenerationError::Provider(format!(
                "unsupported generation provider: {other}"
            )));
        }
    };
    Ok(provider)
}

fn api_key(config: &GenerationConfig) -> Result<String, GenerationError> {
    match std::env::var(&config.api_key_env) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(GenerationError::MissingApiKey(config.api_key_env.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_reported_by_variable_name() {
        let config = GenerationConfig {
            api_key_env: "HAVEN_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..GenerationConfig::default()
        };
        match build_provider(&config) {
            Err(GenerationError::MissingApiKey(name)) => {
                assert_eq!(name, "HAVEN_TEST_KEY_THAT_IS_NEVER_SET")
            }
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("expected a missing key error"),
        }
    }

    #[test]
    fn ollama_needs_no_key() {
        let config = GenerationConfig {
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            api_key_env: "HAVEN_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..GenerationConfig::default()
        };
        assert!(build_provider(&config).is_ok());
    }
}
