//! Euclidean and city-block distances.

use crate::distance::DistanceMeasure;
use crate::matrix::Profile;

/// Euclidean distance.
///
/// Weighted mean of squared differences, `Σ w (a - b)² / Σ w`. No square
/// root is taken, so cluster errors add up as within-cluster variance.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl DistanceMeasure for Euclidean {
    fn distance(&self, a: Profile<'_>, b: Profile<'_>, weights: &[f64]) -> f64 {
        weighted_mean(a, b, weights, |d| d * d)
    }
}

/// City-block (Manhattan) distance.
///
/// Weighted mean of absolute differences, `Σ w |a - b| / Σ w`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CityBlock;

impl DistanceMeasure for CityBlock {
    fn distance(&self, a: Profile<'_>, b: Profile<'_>, weights: &[f64]) -> f64 {
        weighted_mean(a, b, weights, f64::abs)
    }
}

#[inline]
fn weighted_mean<F>(a: Profile<'_>, b: Profile<'_>, weights: &[f64], term: F) -> f64
where
    F: Fn(f64) -> f64,
{
    debug_assert_eq!(a.len(), b.len(), "Profile dimensions must match");

    let mut sum = 0.0;
    let mut total_weight = 0.0;
    for (i, &w) in weights.iter().enumerate().take(a.len()) {
        if let (Some(x), Some(y)) = (a.get(i), b.get(i)) {
            sum += w * term(x - y);
            total_weight += w;
        }
    }

    if total_weight > 0.0 {
        sum / total_weight
    } else {
        0.0
    }
}
