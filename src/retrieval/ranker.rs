use ndarray::ArrayView1;
use serde::Serialize;

use super::distance::DistanceMetric;
use crate::corpus::{Corpus, Fragment};
use crate::core::errors::RagError;

/// A corpus fragment paired with its distance from the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedFragment<'a> {
    /// Position of the fragment in the corpus.
    pub index: usize,
    pub fragment: &'a Fragment,
    pub distance: f32,
}

/// Owned form of a ranked fragment, for responses that outlive the corpus borrow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub index: usize,
    pub text: String,
    pub date_tag: Option<String>,
    pub distance: f32,
}

impl From<&RankedFragment<'_>> for SearchHit {
    fn from(ranked: &RankedFragment<'_>) -> Self {
        Self {
            index: ranked.index,
            text: ranked.fragment.text.clone(),
            date_tag: ranked.fragment.date_tag.clone(),
            distance: ranked.distance,
        }
    }
}

/// Scores every fragment against `query` and returns them nearest first.
///
/// Exhaustive O(fragments × dimensions). Equal distances keep corpus order.
pub fn rank<'a>(
    query: &[f32],
    corpus: &'a Corpus,
    metric: DistanceMetric,
) -> Result<Vec<RankedFragment<'a>>, RagError> {
    if corpus.is_empty() {
        return Ok(Vec::new());
    }
    if query.len() != corpus.dimensions() {
        return Err(RagError::DimensionMismatch {
            expected: corpus.dimensions(),
            actual: query.len(),
        });
    }

    let query = ArrayView1::from(query);
    let mut ranked = corpus
        .iter()
        .enumerate()
        .map(|(index, (fragment, embedding))| {
            Ok(RankedFragment {
                index,
                fragment,
                distance: metric.distance(query, embedding)?,
            })
        })
        .collect::<Result<Vec<_>, RagError>>()?;

    ranked.sort_by(|left, right| left.distance.total_cmp(&right.distance));
    Ok(ranked)
}

/// `rank`, truncated to the `k` nearest fragments.
pub fn top_k<'a>(
    query: &[f32],
    corpus: &'a Corpus,
    metric: DistanceMetric,
    k: usize,
) -> Result<Vec<RankedFragment<'a>>, RagError> {
    let mut ranked = rank(query, corpus, metric)?;
    ranked.truncate(k);
    Ok(ranked)
}
