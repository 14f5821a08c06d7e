use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::core::errors::RagError;

/// Largest cosine distance; also the distance assigned when either vector has zero length.
pub const MAX_COSINE_DISTANCE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Manhattan,
    Euclidean,
    Chebyshev,
}

impl DistanceMetric {
    /// Distance between two equal-length vectors; smaller means more similar.
    pub fn distance(
        &self,
        query: ArrayView1<'_, f32>,
        candidate: ArrayView1<'_, f32>,
    ) -> Result<f32, RagError> {
        if query.len() != candidate.len() {
            return Err(RagError::DimensionMismatch {
                expected: candidate.len(),
                actual: query.len(),
            });
        }

        let pairs = query
            .iter()
            .zip(candidate.iter())
            .map(|(a, b)| (f64::from(*a), f64::from(*b)));

        let value = match self {
            DistanceMetric::Cosine => cosine_distance(pairs),
            DistanceMetric::Manhattan => pairs.map(|(a, b)| (a - b).abs()).sum::<f64>(),
            DistanceMetric::Euclidean => pairs.map(|(a, b)| (a - b).powi(2)).sum::<f64>().sqrt(),
            DistanceMetric::Chebyshev => pairs.map(|(a, b)| (a - b).abs()).fold(0.0, f64::max),
        };
        Ok(value as f32)
    }

    pub fn distance_slices(&self, query: &[f32], candidate: &[f32]) -> Result<f32, RagError> {
        self.distance(ArrayView1::from(query), ArrayView1::from(candidate))
    }

    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Manhattan => "manhattan",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Chebyshev => "chebyshev",
        }
    }
}

impl std::str::FromStr for DistanceMetric {
    type Err = RagError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "manhattan" | "cityblock" | "l1" => Ok(DistanceMetric::Manhattan),
            "euclidean" | "l2" => Ok(DistanceMetric::Euclidean),
            "chebyshev" | "linf" => Ok(DistanceMetric::Chebyshev),
            other => Err(RagError::Config(format!("unknown distance metric '{}'", other))),
        }
    }
}

fn cosine_distance(pairs: impl Iterator<Item = (f64, f64)>) -> f64 {
    let (dot, norm_a, norm_b) = pairs.fold((0.0, 0.0, 0.0), |(dot, na, nb), (a, b)| {
        (dot + a * b, na + a * a, nb + b * b)
    });
    if norm_a == 0.0 || norm_b == 0.0 {
        return f64::from(MAX_COSINE_DISTANCE);
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();

    (1.0 - dot / denom).clamp(0.0, f64::from(MAX_COSINE_DISTANCE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(left: f32, right: f32) -> bool {
        (left - right).abs() < 1e-5
    }

    #[test]
    fn cosine_is_zero_for_identical_vectors() {
        let vec = [1.0, 2.0, 3.0, 4.0];
        let d = DistanceMetric::Cosine.distance_slices(&vec, &vec).expect("cosine");
        assert!(approx_eq(d, 0.0));
    }

    #[test]
    fn cosine_is_one_for_orthogonal_and_two_for_opposite() {
        let cosine = DistanceMetric::Cosine;
        assert!(approx_eq(cosine.distance_slices(&[1.0, 0.0], &[0.0, 1.0]).unwrap(), 1.0));
        assert!(approx_eq(cosine.distance_slices(&[1.0, 0.0], &[-1.0, 0.0]).unwrap(), 2.0));
    }

    #[test]
    fn zero_vector_is_maximally_distant() {
        let d = DistanceMetric::Cosine
            .distance_slices(&[0.0, 0.0], &[1.0, 1.0])
            .expect("no error for zero vectors");
        assert_eq!(d, MAX_COSINE_DISTANCE);
    }

    #[test]
    fn tiny_vectors_are_not_treated_as_zero() {
        let tiny = [1e-9, 2e-9, -3e-9];
        let d = DistanceMetric::Cosine.distance_slices(&tiny, &tiny).expect("cosine");
        assert!(approx_eq(d, 0.0));

        let d = DistanceMetric::Cosine
            .distance_slices(&[1e-20, 0.0], &[0.0, 1e-20])
            .expect("cosine");
        assert!(approx_eq(d, 1.0));
    }

    #[test]
    fn elementwise_metrics() {
        let a = [1.0, -2.0, 3.0];
        let b = [4.0, 2.0, 3.0];
        assert!(approx_eq(DistanceMetric::Manhattan.distance_slices(&a, &b).unwrap(), 7.0));
        assert!(approx_eq(DistanceMetric::Euclidean.distance_slices(&a, &b).unwrap(), 5.0));
        assert!(approx_eq(DistanceMetric::Chebyshev.distance_slices(&a, &b).unwrap(), 4.0));
    }

    #[test]
    fn every_metric_rejects_length_mismatch() {
        for metric in [
            DistanceMetric::Cosine,
            DistanceMetric::Manhattan,
            DistanceMetric::Euclidean,
            DistanceMetric::Chebyshev,
        ] {
            let err = metric.distance_slices(&[1.0, 2.0], &[1.0, 2.0, 3.0]).unwrap_err();
            assert!(matches!(
                err,
                RagError::DimensionMismatch { expected: 3, actual: 2 }
            ));
        }
    }

    #[test]
    fn metric_names_parse() {
        assert_eq!("Cosine".parse::<DistanceMetric>().unwrap(), DistanceMetric::Cosine);
        assert_eq!("l1".parse::<DistanceMetric>().unwrap(), DistanceMetric::Manhattan);
        assert!("hamming".parse::<DistanceMetric>().is_err());
    }
}
