//! Distance metrics between masked, weighted profiles.
//!
//! Every metric only looks at dimensions that are valid in both profiles.
//! When no such dimension exists the distance is `0.0`. Correlation-based
//! metrics return `1.0` when one of the profiles is constant over the shared
//! dimensions, since the correlation is undefined there, unless both
//! profiles agree on every shared dimension.

mod correlation;
mod euclidean;
mod rank;

pub use correlation::{
    AbsCorrelation, AbsUncenteredCorrelation, Correlation, UncenteredCorrelation,
};
pub use euclidean::{CityBlock, Euclidean};
pub use rank::{Kendall, Spearman};

use crate::error::Result;
use crate::matrix::{DataView, Profile};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Trait for distance measures between two profiles.
pub trait DistanceMeasure {
    /// Computes the distance between two profiles of equal length.
    ///
    /// Returns a non-negative value; lower means more similar.
    fn distance(&self, a: Profile<'_>, b: Profile<'_>, weights: &[f64]) -> f64;
}

/// The available distance metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Weighted mean squared difference.
    #[default]
    Euclidean,
    /// Weighted mean absolute difference.
    #[serde(rename = "cityblock")]
    CityBlock,
    /// One minus the Pearson correlation.
    Correlation,
    /// One minus the absolute Pearson correlation.
    AbsCorrelation,
    /// One minus the uncentered correlation.
    UncenteredCorrelation,
    /// One minus the absolute uncentered correlation.
    AbsUncenteredCorrelation,
    /// One minus Spearman's rank correlation.
    Spearman,
    /// One minus Kendall's tau.
    Kendall,
}

impl Metric {
    /// All metrics, in declaration order.
    pub const ALL: [Metric; 8] = [
        Metric::Euclidean,
        Metric::CityBlock,
        Metric::Correlation,
        Metric::AbsCorrelation,
        Metric::UncenteredCorrelation,
        Metric::AbsUncenteredCorrelation,
        Metric::Spearman,
        Metric::Kendall,
    ];

    /// Computes the distance using this metric.
    pub fn compute(&self, a: Profile<'_>, b: Profile<'_>, weights: &[f64]) -> f64 {
        match self {
            Metric::Euclidean => Euclidean.distance(a, b, weights),
            Metric::CityBlock => CityBlock.distance(a, b, weights),
            Metric::Correlation => Correlation.distance(a, b, weights),
            Metric::AbsCorrelation => AbsCorrelation.distance(a, b, weights),
            Metric::UncenteredCorrelation => UncenteredCorrelation.distance(a, b, weights),
            Metric::AbsUncenteredCorrelation => AbsUncenteredCorrelation.distance(a, b, weights),
            Metric::Spearman => Spearman.distance(a, b, weights),
            Metric::Kendall => Kendall.distance(a, b, weights),
        }
    }
}

impl DistanceMeasure for Metric {
    fn distance(&self, a: Profile<'_>, b: Profile<'_>, weights: &[f64]) -> f64 {
        self.compute(a, b, weights)
    }
}

/// True when both profiles hold the same value on every dimension valid in
/// both.
pub(crate) fn same_shared_values(a: Profile<'_>, b: Profile<'_>) -> bool {
    (0..a.len()).all(|i| match (a.get(i), b.get(i)) {
        (Some(x), Some(y)) => x == y,
        _ => true,
    })
}

/// Lower-triangular matrix of pairwise point distances.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    /// Row `i` holds `d(i, 0) .. d(i, i - 1)`.
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Computes all pairwise distances between the points of a view.
    ///
    /// The buffer is reserved fallibly, so an oversized input surfaces as
    /// [`FlockError::Allocation`](crate::FlockError::Allocation).
    pub fn compute(view: &DataView<'_>, metric: Metric) -> Result<Self> {
        let n = view.npoints();
        let len = n * n.saturating_sub(1) / 2;

        let mut data = Vec::new();
        data.try_reserve_exact(len)?;
        data.resize(len, 0.0);

        // Split the flat buffer into one mutable slice per row.
        let mut rows: Vec<(usize, &mut [f64])> = Vec::with_capacity(n);
        let mut rest = data.as_mut_slice();
        for i in 0..n {
            let (row, tail) = rest.split_at_mut(i);
            rows.push((i, row));
            rest = tail;
        }

        let weights = view.weights();
        rows.into_par_iter().for_each(|(i, row)| {
            let a = view.profile(i);
            for (j, slot) in row.iter_mut().enumerate() {
                *slot = metric.compute(a, view.profile(j), weights);
            }
        });

        Ok(Self { n, data })
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.n
    }

    /// True for a matrix over zero points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Overwrites the distance between `i` and `j` (`i != j`).
    #[inline]
    pub(crate) fn set(&mut self, i: usize, j: usize, value: f64) {
        debug_assert_ne!(i, j);
        let (hi, lo) = if i > j { (i, j) } else { (j, i) };
        self.data[hi * (hi - 1) / 2 + lo] = value;
    }

    /// Distance between points `i` and `j`; zero on the diagonal.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        match i.cmp(&j) {
            std::cmp::Ordering::Equal => 0.0,
            std::cmp::Ordering::Greater => self.data[i * (i - 1) / 2 + j],
            std::cmp::Ordering::Less => self.data[j * (j - 1) / 2 + i],
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::matrix::Matrix;
    use proptest::prelude::*;

    /// Distance between two fully valid, unit-weight vectors.
    pub(crate) fn dist(metric: Metric, a: &[f64], b: &[f64]) -> f64 {
        let mask = vec![true; a.len()];
        let weights = vec![1.0; a.len()];
        metric.compute(Profile::new(a, &mask), Profile::new(b, &mask), &weights)
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Metric::CityBlock).unwrap();
        assert_eq!(json, "\"cityblock\"");
        let m: Metric = serde_json::from_str("\"abs_uncentered_correlation\"").unwrap();
        assert_eq!(m, Metric::AbsUncenteredCorrelation);
    }

    #[test]
    fn test_self_distance_is_zero() {
        let a = [0.3, 1.7, -2.0, 4.5];
        for metric in Metric::ALL {
            assert!(dist(metric, &a, &a).abs() < 1e-10, "{:?}", metric);
        }
    }

    #[test]
    fn test_constant_self_distance_is_zero() {
        let a = [5.0, 5.0, 5.0];
        for metric in Metric::ALL {
            assert_eq!(dist(metric, &a, &a), 0.0, "{:?}", metric);
        }
    }

    #[test]
    fn test_no_shared_dimensions() {
        let a = [1.0, 2.0];
        let b = [3.0, 4.0];
        let weights = [1.0, 1.0];
        for metric in Metric::ALL {
            let d = metric.compute(
                Profile::new(&a, &[true, false]),
                Profile::new(&b, &[false, true]),
                &weights,
            );
            assert_eq!(d, 0.0, "{:?}", metric);
        }
    }

    #[test]
    fn test_distance_matrix() {
        let m = Matrix::from_rows(&[vec![0.0, 0.0], vec![1.0, 1.0], vec![3.0, 3.0]]).unwrap();
        let view = m.view(false).unwrap();
        let dm = DistanceMatrix::compute(&view, Metric::CityBlock).unwrap();

        assert_eq!(dm.len(), 3);
        assert_eq!(dm.get(0, 0), 0.0);
        assert!((dm.get(1, 0) - 1.0).abs() < 1e-10);
        assert!((dm.get(0, 2) - 3.0).abs() < 1e-10);
        assert_eq!(dm.get(2, 1), dm.get(1, 2));
    }

    fn pair() -> impl Strategy<Value = (Vec<f64>, Vec<f64>, Vec<bool>, Vec<bool>)> {
        (2usize..12).prop_flat_map(|n| {
            (
                prop::collection::vec(-100.0f64..100.0, n),
                prop::collection::vec(-100.0f64..100.0, n),
                prop::collection::vec(any::<bool>(), n),
                prop::collection::vec(any::<bool>(), n),
            )
        })
    }

    proptest! {
        #[test]
        fn prop_symmetric_and_non_negative((a, b, ma, mb) in pair()) {
            let weights = vec![1.0; a.len()];
            for metric in Metric::ALL {
                let ab = metric.compute(Profile::new(&a, &ma), Profile::new(&b, &mb), &weights);
                let ba = metric.compute(Profile::new(&b, &mb), Profile::new(&a, &ma), &weights);
                prop_assert!(ab >= 0.0, "{:?} gave {}", metric, ab);
                prop_assert!((ab - ba).abs() <= 1e-9 * ab.abs().max(1.0), "{:?}: {} vs {}", metric, ab, ba);
            }
        }
    }
}
