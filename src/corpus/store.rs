//! Corpus persistence.
//!
//! The CSV layout is one header row followed by one row per fragment, in corpus order:
//!
//! | column      | content                                                          |
//! |-------------|------------------------------------------------------------------|
//! | `text`      | fragment text                                                    |
//! | `embedding` | `[v0, v1, ...]`, f32 values in shortest round-trip decimal form  |
//! | `date_tag`  | leading date token, empty when absent                            |
//!
//! On load the brackets are optional and the `date_tag` column may be missing.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::fragment::{Corpus, Fragment};
use crate::core::errors::RagError;

pub trait CorpusStore {
    type Handle;

    fn save(&self, corpus: &Corpus) -> Result<Self::Handle, RagError>;

    fn load(&self, handle: &Self::Handle) -> Result<Corpus, RagError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct CorpusRow {
    text: String,
    embedding: String,
    #[serde(default)]
    date_tag: Option<String>,
}

/// Stores a corpus as a single CSV file; the handle is the file path.
#[derive(Debug, Clone)]
pub struct CsvCorpusStore {
    path: PathBuf,
}

impl CsvCorpusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file this store writes to.
    pub fn load_default(&self) -> Result<Corpus, RagError> {
        self.load(&self.path)
    }
}

impl CorpusStore for CsvCorpusStore {
    type Handle = PathBuf;

    fn save(&self, corpus: &Corpus) -> Result<PathBuf, RagError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        for (fragment, embedding) in corpus.iter() {
            writer.serialize(CorpusRow {
                text: fragment.text.clone(),
                embedding: format_embedding(embedding.iter().copied()),
                date_tag: fragment.date_tag.clone(),
            })?;
        }
        if corpus.is_empty() {
            // serialize() emits the header with the first row only
            writer.write_record(["text", "embedding", "date_tag"])?;
        }
        writer.flush()?;

        tracing::info!(
            fragments = corpus.len(),
            dimensions = corpus.dimensions(),
            "Saved corpus to {}",
            self.path.display()
        );
        Ok(self.path.clone())
    }

    fn load(&self, handle: &PathBuf) -> Result<Corpus, RagError> {
        let mut reader = csv::Reader::from_path(handle)?;

        let mut fragments = Vec::new();
        let mut vectors = Vec::new();
        for (index, row) in reader.deserialize::<CorpusRow>().enumerate() {
            let row = row?;
            let embedding = parse_embedding(&row.embedding).map_err(|reason| {
                RagError::Corpus(format!("row {}: {}", index + 1, reason))
            })?;
            let date_tag = row.date_tag.filter(|tag| !tag.is_empty());
            fragments.push(Fragment::new(row.text, date_tag));
            vectors.push(embedding);
        }

        let corpus = Corpus::new(fragments, vectors)?;
        tracing::info!(
            fragments = corpus.len(),
            dimensions = corpus.dimensions(),
            "Loaded corpus from {}",
            handle.display()
        );
        Ok(corpus)
    }
}

pub fn format_embedding(values: impl IntoIterator<Item = f32>) -> String {
    let parts: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

pub fn parse_embedding(raw: &str) -> Result<Vec<f32>, String> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(trimmed)
        .trim();
    if inner.is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .map(|part| {
            let part = part.trim();
            part.parse::<f32>()
                .map_err(|e| format!("invalid embedding value '{}': {}", part, e))
        })
        .collect()
}
