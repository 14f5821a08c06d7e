//! Brute-force relevance ranking of corpus fragments against a query vector.

mod distance;
mod ranker;

pub use distance::{DistanceMetric, MAX_COSINE_DISTANCE};
pub use ranker::{rank, top_k, RankedFragment, SearchHit};
