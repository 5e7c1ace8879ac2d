//! Pearson and uncentered correlation distances.

use crate::distance::{same_shared_values, DistanceMeasure};
use crate::matrix::Profile;

/// Pearson correlation distance, `1 - r`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Correlation;

/// Absolute Pearson correlation distance, `1 - |r|`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbsCorrelation;

/// Uncentered correlation distance, `1 - r_u`.
///
/// Same as Pearson but without subtracting the means, i.e. the cosine of
/// the angle between the weighted vectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct UncenteredCorrelation;

/// Absolute uncentered correlation distance, `1 - |r_u|`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AbsUncenteredCorrelation;

impl DistanceMeasure for Correlation {
    fn distance(&self, a: Profile<'_>, b: Profile<'_>, weights: &[f64]) -> f64 {
        to_distance(weighted_correlation(a, b, weights, true), false, a, b)
    }
}

impl DistanceMeasure for AbsCorrelation {
    fn distance(&self, a: Profile<'_>, b: Profile<'_>, weights: &[f64]) -> f64 {
        to_distance(weighted_correlation(a, b, weights, true), true, a, b)
    }
}

impl DistanceMeasure for UncenteredCorrelation {
    fn distance(&self, a: Profile<'_>, b: Profile<'_>, weights: &[f64]) -> f64 {
        to_distance(weighted_correlation(a, b, weights, false), false, a, b)
    }
}

impl DistanceMeasure for AbsUncenteredCorrelation {
    fn distance(&self, a: Profile<'_>, b: Profile<'_>, weights: &[f64]) -> f64 {
        to_distance(weighted_correlation(a, b, weights, false), true, a, b)
    }
}

/// Outcome of a correlation over the shared valid dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum CorrelationValue {
    /// No dimension is valid in both profiles.
    NoData,
    /// A profile has zero variance (or zero norm, uncentered).
    Undefined,
    /// The correlation coefficient, clamped to `[-1, 1]`.
    Value(f64),
}

/// Converts a correlation into a distance. An undefined correlation is
/// `0.0` apart for identical profiles and `1.0` otherwise.
pub(crate) fn to_distance(
    value: CorrelationValue,
    absolute: bool,
    a: Profile<'_>,
    b: Profile<'_>,
) -> f64 {
    match value {
        CorrelationValue::NoData => 0.0,
        CorrelationValue::Undefined if same_shared_values(a, b) => 0.0,
        CorrelationValue::Undefined => 1.0,
        CorrelationValue::Value(r) if absolute => 1.0 - r.abs(),
        CorrelationValue::Value(r) => 1.0 - r,
    }
}

/// Correlation from accumulated weighted sums.
pub(crate) fn correlation_from_sums(
    sum_a: f64,
    sum_b: f64,
    sum_ab: f64,
    sum_aa: f64,
    sum_bb: f64,
    total_weight: f64,
    centered: bool,
) -> CorrelationValue {
    if total_weight <= 0.0 {
        return CorrelationValue::NoData;
    }

    let (mut cross, mut var_a, mut var_b) = (sum_ab, sum_aa, sum_bb);
    if centered {
        cross -= sum_a * sum_b / total_weight;
        var_a -= sum_a * sum_a / total_weight;
        var_b -= sum_b * sum_b / total_weight;
    }

    if var_a <= 0.0 || var_b <= 0.0 {
        return CorrelationValue::Undefined;
    }

    let r = cross / (var_a * var_b).sqrt();
    CorrelationValue::Value(r.clamp(-1.0, 1.0))
}

fn weighted_correlation(
    a: Profile<'_>,
    b: Profile<'_>,
    weights: &[f64],
    centered: bool,
) -> CorrelationValue {
    debug_assert_eq!(a.len(), b.len(), "Profile dimensions must match");

    let (mut sum_a, mut sum_b, mut sum_ab, mut sum_aa, mut sum_bb, mut total) =
        (0.0, 0.0, 0.0, 0.0, 0.0, 0.0);

    for (i, &w) in weights.iter().enumerate().take(a.len()) {
        if let (Some(x), Some(y)) = (a.get(i), b.get(i)) {
            sum_a += w * x;
            sum_b += w * y;
            sum_ab += w * x * y;
            sum_aa += w * x * x;
            sum_bb += w * y * y;
            total += w;
        }
    }

    correlation_from_sums(sum_a, sum_b, sum_ab, sum_aa, sum_bb, total, centered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::tests::dist;
    use crate::distance::Metric;

    #[test]
    fn test_perfect_correlation() {
        let d = dist(Metric::Correlation, &[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]);
        assert!(d.abs() < 1e-10);
    }

    #[test]
    fn test_anti_correlation() {
        let a = [1.0, 2.0, 3.0];
        let b = [3.0, 2.0, 1.0];
        assert!((dist(Metric::Correlation, &a, &b) - 2.0).abs() < 1e-10);
        assert!(dist(Metric::AbsCorrelation, &a, &b).abs() < 1e-10);
    }

    #[test]
    fn test_uncentered_orthogonal() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        assert!((dist(Metric::UncenteredCorrelation, &a, &b) - 1.0).abs() < 1e-10);
        assert!((dist(Metric::AbsUncenteredCorrelation, &a, &b) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_uncentered_ignores_offset_differently() {
        // Shifted copies are perfectly Pearson-correlated but not parallel.
        let a = [1.0, 2.0, 3.0];
        let b = [11.0, 12.0, 13.0];
        assert!(dist(Metric::Correlation, &a, &b).abs() < 1e-10);
        assert!(dist(Metric::UncenteredCorrelation, &a, &b) > 1e-3);
    }

    #[test]
    fn test_uncentered_opposite() {
        let a = [1.0, 2.0];
        let b = [-1.0, -2.0];
        assert!((dist(Metric::UncenteredCorrelation, &a, &b) - 2.0).abs() < 1e-10);
        assert!(dist(Metric::AbsUncenteredCorrelation, &a, &b).abs() < 1e-10);
    }

    #[test]
    fn test_constant_profile_is_undefined() {
        let d = dist(Metric::Correlation, &[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]);
        assert_eq!(d, 1.0);
    }

    #[test]
    fn test_constant_profile_against_itself() {
        let a = [5.0, 5.0, 5.0];
        assert_eq!(dist(Metric::Correlation, &a, &a), 0.0);
        assert_eq!(dist(Metric::AbsCorrelation, &a, &a), 0.0);

        let zeros = [0.0, 0.0];
        assert_eq!(dist(Metric::UncenteredCorrelation, &zeros, &zeros), 0.0);
    }

    #[test]
    fn test_weights_shift_correlation() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [1.0, 2.0, 3.0, -10.0];
        let mask = [true; 4];
        let full = Correlation.distance(Profile::new(&a, &mask), Profile::new(&b, &mask), &[1.0; 4]);
        let muted = Correlation.distance(
            Profile::new(&a, &mask),
            Profile::new(&b, &mask),
            &[1.0, 1.0, 1.0, 0.0],
        );
        assert!(full > 1.0);
        assert!(muted.abs() < 1e-10);
    }
}
