use serde_json::{Map, Value};

use super::schema::{AlmanacConfig, TokenizerScheme};
use crate::context::PromptTemplate;
use crate::core::errors::RagError;

/// Checks the raw merged document before it is deserialized, so that type errors
/// name the offending key instead of surfacing as a serde message.
pub fn validate_config(config: &Value) -> Result<(), RagError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(corpus) = expect_optional_object(root, "corpus")? {
        validate_optional_string_field(corpus, "corpus.source_url", "source_url")?;
        validate_optional_string_field(corpus, "corpus.wikipedia_title", "wikipedia_title")?;
        validate_optional_string_field(corpus, "corpus.wikipedia_api", "wikipedia_api")?;
        validate_optional_string_field(corpus, "corpus.path", "path")?;
        validate_non_empty_string_field(corpus, "corpus.separator", "separator")?;
        validate_non_empty_string_field(corpus, "corpus.section_marker", "section_marker")?;
        validate_u64_field(
            corpus,
            "corpus.fetch_timeout_secs",
            "fetch_timeout_secs",
            1,
            86_400,
        )?;
    }

    if let Some(embedding) = expect_optional_object(root, "embedding")? {
        validate_optional_string_field(embedding, "embedding.base_url", "base_url")?;
        validate_non_empty_string_field(embedding, "embedding.model", "model")?;
        validate_u64_field(embedding, "embedding.batch_size", "batch_size", 1, 10_000)?;
        validate_u64_field(embedding, "embedding.concurrency", "concurrency", 1, 64)?;
        validate_u64_field(embedding, "embedding.timeout_secs", "timeout_secs", 1, 86_400)?;
        validate_u64_field(embedding, "embedding.dimensions", "dimensions", 1, 65_536)?;
    }

    if let Some(completion) = expect_optional_object(root, "completion")? {
        validate_optional_string_field(completion, "completion.base_url", "base_url")?;
        validate_non_empty_string_field(completion, "completion.model", "model")?;
        validate_u64_field(
            completion,
            "completion.max_output_tokens",
            "max_output_tokens",
            1,
            1_000_000,
        )?;
        validate_u64_field(completion, "completion.timeout_secs", "timeout_secs", 1, 86_400)?;
        validate_optional_string_field(completion, "completion.canned_response", "canned_response")?;
    }

    if let Some(tokenizer) = expect_optional_object(root, "tokenizer")? {
        validate_optional_string_field(tokenizer, "tokenizer.scheme", "scheme")?;
        validate_optional_string_field(tokenizer, "tokenizer.path", "path")?;
        validate_optional_string_field(tokenizer, "tokenizer.model", "model")?;
    }

    if let Some(retrieval) = expect_optional_object(root, "retrieval")? {
        validate_optional_string_field(retrieval, "retrieval.metric", "metric")?;
        validate_u64_field(
            retrieval,
            "retrieval.max_context_tokens",
            "max_context_tokens",
            1,
            10_000_000,
        )?;
        validate_u64_field(retrieval, "retrieval.top_k", "top_k", 1, 10_000)?;
        validate_optional_string_field(
            retrieval,
            "retrieval.context_separator",
            "context_separator",
        )?;
        validate_optional_string_field(retrieval, "retrieval.prompt_template", "prompt_template")?;
    }

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65_535)?;
        validate_string_array_field(server, "server.allowed_origins", "allowed_origins")?;
    }

    Ok(())
}

/// Cross-field rules that only make sense once the document is typed.
pub fn validate_settings(config: &AlmanacConfig) -> Result<(), RagError> {
    PromptTemplate::new(config.retrieval.prompt_template.as_str())
        .map_err(|e| RagError::Config(format!("retrieval.prompt_template: {}", e)))?;

    if config.tokenizer.scheme == TokenizerScheme::Huggingface && config.tokenizer.path.is_none() {
        return Err(RagError::Config(
            "tokenizer.path is required for the huggingface scheme".to_string(),
        ));
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, RagError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(config_type_error(key, "object")),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), RagError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(RagError::Config(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_non_empty_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), RagError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(RagError::Config(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), RagError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() || value.as_str().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "string"))
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), RagError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(RagError::Config(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> RagError {
    RagError::Config(format!("Invalid config at '{}': expected {}", path, expected))
}
