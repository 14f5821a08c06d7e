//! Fragments and the embedded corpus that owns them.
//!
//! A `Fragment` is the date-qualified text unit produced by preprocessing. Once every fragment
//! has a vector, they are moved into a `Corpus`, which keeps the fragments as an ordered list
//! and their embeddings as one dense row-major matrix (row `i` belongs to fragment `i`).

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::core::errors::RagError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// Full text, beginning with `date_tag` and the separator.
    pub text: String,
    /// Leading date token of `text`.
    pub date_tag: Option<String>,
}

impl Fragment {
    /// An empty `date_tag` is stored as `None`.
    pub fn new(text: impl Into<String>, date_tag: Option<String>) -> Self {
        Self {
            text: text.into(),
            date_tag: date_tag.filter(|tag| !tag.is_empty()),
        }
    }

    /// Builds a fragment whose date tag is whatever precedes the first `separator`.
    pub fn from_tagged_text(text: impl Into<String>, separator: &str) -> Self {
        let text = text.into();
        let date_tag = text
            .split_once(separator)
            .map(|(head, _)| head.trim().to_string())
            .filter(|head| !head.is_empty());
        Self { text, date_tag }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    fragments: Vec<Fragment>,
    embeddings: Array2<f32>,
}

impl Corpus {
    pub fn empty() -> Self {
        Self {
            fragments: Vec::new(),
            embeddings: Array2::zeros((0, 0)),
        }
    }

    /// Pairs fragments with their vectors, in order.
    ///
    /// Fails when the counts differ, a fragment is empty, or the vectors are not all
    /// the same non-zero length.
    pub fn new(mut fragments: Vec<Fragment>, vectors: Vec<Vec<f32>>) -> Result<Self, RagError> {
        if fragments.len() != vectors.len() {
            return Err(RagError::Corpus(format!(
                "{} fragments but {} embeddings",
                fragments.len(),
                vectors.len()
            )));
        }
        if fragments.is_empty() {
            return Ok(Self::empty());
        }

        if let Some(position) = fragments.iter().position(|f| f.text.is_empty()) {
            return Err(RagError::Corpus(format!("fragment {} has no text", position)));
        }
        for fragment in &mut fragments {
            if fragment.date_tag.as_deref() == Some("") {
                fragment.date_tag = None;
            }
        }

        let dimensions = vectors[0].len();
        if dimensions == 0 {
            return Err(RagError::Corpus("embeddings must not be empty".to_string()));
        }

        let mut flat = Vec::with_capacity(vectors.len() * dimensions);
        for (row, vector) in vectors.into_iter().enumerate() {
            if vector.len() != dimensions {
                return Err(RagError::Corpus(format!(
                    "embedding {} has {} dimensions, expected {}",
                    row,
                    vector.len(),
                    dimensions
                )));
            }
            flat.extend(vector);
        }

        let embeddings = Array2::from_shape_vec((fragments.len(), dimensions), flat)
            .map_err(|e| RagError::Corpus(e.to_string()))?;

        Ok(Self {
            fragments,
            embeddings,
        })
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Width of every embedding; zero for an empty corpus.
    pub fn dimensions(&self) -> usize {
        self.embeddings.ncols()
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn fragment(&self, index: usize) -> Option<&Fragment> {
        self.fragments.get(index)
    }

    pub fn embedding(&self, index: usize) -> Option<ArrayView1<'_, f32>> {
        (index < self.len()).then(|| self.embeddings.row(index))
    }

    pub fn embeddings(&self) -> &Array2<f32> {
        &self.embeddings
    }

    /// Fragments alongside their embedding rows, in corpus order.
    pub fn iter(&self) -> impl Iterator<Item = (&Fragment, ArrayView1<'_, f32>)> {
        self.fragments.iter().zip(self.embeddings.rows())
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self::empty()
    }
}
