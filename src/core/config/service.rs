use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::schema::AlmanacConfig;
use super::validation::{validate_config, validate_settings};
use crate::core::errors::RagError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 8] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "bearer",
    "access_key",
];

const SENSITIVE_WHITELIST: [&str; 3] = ["max_output_tokens", "max_context_tokens", "tokens"];

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
    explicit_path: Option<PathBuf>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self {
            paths,
            explicit_path: None,
        }
    }

    /// Reads the public configuration from `path` instead of the discovered location.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_path = Some(path.into());
        self
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    pub fn config_path(&self) -> PathBuf {
        if let Some(path) = &self.explicit_path {
            return path.clone();
        }

        if let Ok(path) = env::var("ALMANAC_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    /// Loads `config.yml` and `secrets.yaml`, merges them and returns the typed result.
    pub fn load(&self) -> Result<AlmanacConfig, RagError> {
        let merged = self.load_raw()?;
        validate_config(&merged)?;

        let config: AlmanacConfig = serde_json::from_value(merged)
            .map_err(|e| RagError::Config(e.to_string()))?;
        validate_settings(&config)?;

        let snapshot = serde_json::to_value(&config).unwrap_or_default();
        let redacted = redact_sensitive_values(&snapshot);
        tracing::debug!(
            config = %redacted,
            "Loaded configuration from {}",
            self.config_path().display()
        );
        Ok(config)
    }

    pub fn load_raw(&self) -> Result<Value, RagError> {
        let public_config = load_yaml_file(&self.config_path())?;
        let secrets_config = load_yaml_file(&self.secrets_path())?;
        Ok(deep_merge(&public_config, &secrets_config))
    }

    pub fn redact_sensitive_values(&self, value: &Value) -> Value {
        redact_sensitive_values(value)
    }
}

fn load_yaml_file(path: &Path) -> Result<Value, RagError> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let value = serde_yaml::from_str::<Value>(&contents)
        .map_err(|e| RagError::Config(format!("{}: {}", path.display(), e)))?;
    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Map::new())),
        _ => Err(RagError::Config(format!(
            "{}: top level must be a mapping",
            path.display()
        ))),
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::schema::{EmbeddingProviderKind, TokenizerScheme};
    use crate::retrieval::DistanceMetric;
    use serde_json::json;

    fn service_in(dir: &Path) -> ConfigService {
        let paths = Arc::new(AppPaths::with_dirs(
            dir.to_path_buf(),
            dir.join("data"),
        ));
        ConfigService::new(paths).with_config_path(dir.join("config.yml"))
    }

    #[test]
    fn missing_files_yield_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = service_in(dir.path()).load().expect("defaults load");

        assert_eq!(config.embedding.batch_size, 100);
        assert_eq!(config.retrieval.metric, DistanceMetric::Cosine);
        assert_eq!(config.corpus.separator, " – ");
    }

    #[test]
    fn secrets_are_merged_over_public_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = service_in(dir.path());
        fs::write(
            dir.path().join("config.yml"),
            "embedding:\n  provider: hashing\n  dimensions: 32\ntokenizer:\n  scheme: whitespace\nretrieval:\n  metric: chebyshev\n",
        )
        .expect("write config");
        fs::write(service.secrets_path(), "embedding:\n  api_key: sk-test\n  model: m\n")
            .expect("write secrets");

        let config = service.load().expect("config load");

        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Hashing);
        assert_eq!(config.embedding.dimensions, 32);
        assert_eq!(config.embedding.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.embedding.model, "m");
        assert_eq!(config.tokenizer.scheme, TokenizerScheme::Whitespace);
        assert_eq!(config.retrieval.metric, DistanceMetric::Chebyshev);
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("config.yml"), "embedding: [unclosed").expect("write config");

        let err = service_in(dir.path()).load().unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }

    #[test]
    fn deep_merge_merges_objects_and_overrides_scalars() {
        let base = json!({ "a": 1, "b": { "c": 2, "d": 3 } });
        let override_value = json!({ "b": { "c": 99 }, "e": "x" });

        assert_eq!(
            deep_merge(&base, &override_value),
            json!({ "a": 1, "b": { "c": 99, "d": 3 }, "e": "x" })
        );
    }

    #[test]
    fn redaction_hides_keys_but_keeps_token_limits() {
        let input = json!({
            "embedding": { "api_key": "sk-live", "model": "m" },
            "completion": { "max_output_tokens": 300 }
        });

        assert_eq!(
            redact_sensitive_values(&input),
            json!({
                "embedding": { "api_key": "****", "model": "m" },
                "completion": { "max_output_tokens": 300 }
            })
        );
    }
}
