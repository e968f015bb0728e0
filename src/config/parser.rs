use std::path::Path;
use crate::errors::AttestError;
use super::credentials::{provider_env_var, resolve_credential};
use super::types::AttestConfig;
use super::schema::CONFIG_SCHEMA;
use tracing::warn;

const MAX_CONFIG_BYTES: u64 = 1_048_576;

pub async fn parse_config(path: &Path) -> Result<AttestConfig, AttestError> {
    if !path.exists() {
        return Err(AttestError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > MAX_CONFIG_BYTES {
        return Err(AttestError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    parse_config_str(&content)
}

pub fn parse_config_str(content: &str) -> Result<AttestConfig, AttestError> {
    let yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
    // An empty document is a valid, all-defaults config
    let yaml = if yaml.is_null() {
        serde_yaml::Value::Mapping(Default::default())
    } else {
        yaml
    };

    validate_schema(&yaml)?;

    let mut config: AttestConfig = serde_yaml::from_value(yaml)?;
    resolve_api_key(&mut config);
    validate_semantics(&config)?;

    Ok(config)
}

/// Load a config file if given, otherwise defaults with environment credentials.
pub async fn load_config(path: Option<&Path>) -> Result<AttestConfig, AttestError> {
    match path {
        Some(p) => parse_config(p).await,
        None => {
            let mut config = AttestConfig::default();
            resolve_api_key(&mut config);
            Ok(config)
        }
    }
}

fn resolve_api_key(config: &mut AttestConfig) {
    config.llm.api_key = match config.llm.api_key.take() {
        Some(key) => Some(resolve_credential(&key)),
        None => provider_env_var(&config.llm.provider).and_then(|var| std::env::var(var).ok()),
    };
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), AttestError> {
    let json_value: serde_json::Value = serde_json::to_value(yaml)
        .map_err(|e| AttestError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| AttestError::Config(format!("Schema compilation error: {}", e)))?;

    let result = compiled.validate(&json_value);
    if let Err(errors) = result {
        // Advisory only; typed parsing and semantic checks decide validity
        for e in errors {
            warn!(validation_error = %format!("{} at {}", e, e.instance_path), "Config schema warning");
        }
    }

    Ok(())
}

fn validate_semantics(config: &AttestConfig) -> Result<(), AttestError> {
    config.pipeline.skipped_agents().map_err(|e| {
        AttestError::Config(format!("pipeline.skip_agents: {}", e))
    })?;

    if !(0.0..=2.0).contains(&config.llm.temperature) {
        return Err(AttestError::Config(format!(
            "llm.temperature must be within 0..=2, got {}",
            config.llm.temperature
        )));
    }

    if config.llm.max_output_tokens == Some(0) {
        return Err(AttestError::Config("llm.max_output_tokens must be positive".into()));
    }

    if config.storage.key.trim().is_empty() {
        return Err(AttestError::Config("storage.key must not be empty".into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::registry::AgentId;
    use crate::config::StorageBackendKind;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = parse_config_str("").unwrap();
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.storage.key, "attest-results");
        assert_eq!(config.pipeline.excerpt_chars, 1500);
    }

    #[test]
    fn test_full_document() {
        let yaml = r#"
llm:
  provider: local
  model: qwen2.5
  base_url: http://127.0.0.1:8000/v1
  temperature: 0.0
storage:
  backend: sqlite
  path: ./state/attest.db
pipeline:
  skip_agents: [ssp-drafter, executive-brief]
  excerpt_chars: 400
"#;
        let config = parse_config_str(yaml).unwrap();
        assert_eq!(config.storage.backend, StorageBackendKind::Sqlite);
        assert_eq!(
            config.pipeline.skipped_agents().unwrap(),
            vec![AgentId::SspDrafter, AgentId::ExecutiveBrief]
        );
        assert_eq!(config.pipeline.excerpt_chars, 400);
    }

    #[test]
    fn test_unknown_skip_agent_rejected() {
        let err = parse_config_str("pipeline:\n  skip_agents: [not-an-agent]\n").unwrap_err();
        assert!(matches!(err, AttestError::Config(_)));
    }

    #[test]
    fn test_temperature_out_of_range_rejected() {
        let err = parse_config_str("llm:\n  temperature: 3.5\n").unwrap_err();
        assert!(matches!(err, AttestError::Config(_)));
    }

    #[test]
    fn test_api_key_env_reference() {
        std::env::set_var("TEST_ATTEST_PARSER_KEY", "sk-from-env");
        let config = parse_config_str("llm:\n  api_key: $TEST_ATTEST_PARSER_KEY\n").unwrap();
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-from-env"));
        std::env::remove_var("TEST_ATTEST_PARSER_KEY");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let err = parse_config(Path::new("/nonexistent/attest.yaml")).await.unwrap_err();
        assert!(matches!(err, AttestError::Config(_)));
    }
}
