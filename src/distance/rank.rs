//! Rank-based distances: Spearman and Kendall.

use crate::distance::correlation::{correlation_from_sums, to_distance};
use crate::distance::{same_shared_values, DistanceMeasure};
use crate::matrix::Profile;

/// Spearman rank correlation distance, `1 - ρ`.
///
/// Pearson correlation of the ranks of the shared valid values, with tied
/// values receiving their average rank. Feature weights are not applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spearman;

impl DistanceMeasure for Spearman {
    fn distance(&self, a: Profile<'_>, b: Profile<'_>, _weights: &[f64]) -> f64 {
        let (xs, ys): (Vec<f64>, Vec<f64>) = shared(a, b).map(|(_, x, y)| (x, y)).unzip();
        if xs.is_empty() {
            return 0.0;
        }

        let rx = ranks(&xs);
        let ry = ranks(&ys);

        let (mut sum_a, mut sum_b, mut sum_ab, mut sum_aa, mut sum_bb) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for (x, y) in rx.iter().zip(ry.iter()) {
            sum_a += x;
            sum_b += y;
            sum_ab += x * y;
            sum_aa += x * x;
            sum_bb += y * y;
        }

        let value = correlation_from_sums(
            sum_a,
            sum_b,
            sum_ab,
            sum_aa,
            sum_bb,
            rx.len() as f64,
            true,
        );
        to_distance(value, false, a, b)
    }
}

/// Kendall tau distance, `1 - τ_b`.
///
/// Each pair of shared dimensions `(i, j)` counts with weight `w_i * w_j`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Kendall;

impl DistanceMeasure for Kendall {
    fn distance(&self, a: Profile<'_>, b: Profile<'_>, weights: &[f64]) -> f64 {
        let pairs: Vec<(f64, f64, f64)> = shared(a, b)
            .map(|(i, x, y)| (weights[i], x, y))
            .collect();
        if pairs.is_empty() {
            return 0.0;
        }

        let (mut concordant, mut discordant, mut tied_x, mut tied_y) = (0.0, 0.0, 0.0, 0.0);
        for (i, &(wi, x1, y1)) in pairs.iter().enumerate() {
            for &(wj, x2, y2) in &pairs[..i] {
                let w = wi * wj;
                let dx = x1.partial_cmp(&x2);
                let dy = y1.partial_cmp(&y2);
                match (dx, dy) {
                    (Some(ox), Some(oy)) if ox.is_eq() && oy.is_eq() => {}
                    (Some(ox), Some(_)) if ox.is_eq() => tied_x += w,
                    (Some(_), Some(oy)) if oy.is_eq() => tied_y += w,
                    (Some(ox), Some(oy)) if ox == oy => concordant += w,
                    (Some(_), Some(_)) => discordant += w,
                    _ => {}
                }
            }
        }

        let denom_x = concordant + discordant + tied_x;
        let denom_y = concordant + discordant + tied_y;
        if denom_x <= 0.0 || denom_y <= 0.0 {
            return if same_shared_values(a, b) { 0.0 } else { 1.0 };
        }

        let tau = ((concordant - discordant) / (denom_x * denom_y).sqrt()).clamp(-1.0, 1.0);
        1.0 - tau
    }
}

/// Iterates over `(dimension, a, b)` for dimensions valid in both profiles.
fn shared<'a>(a: Profile<'a>, b: Profile<'a>) -> impl Iterator<Item = (usize, f64, f64)> + 'a {
    debug_assert_eq!(a.len(), b.len(), "Profile dimensions must match");
    (0..a.len()).filter_map(move |i| match (a.get(i), b.get(i)) {
        (Some(x), Some(y)) => Some((i, x, y)),
        _ => None,
    })
}

/// Ranks values from 0, giving tied values the mean of their ranks.
pub(crate) fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        let rank = (start + end - 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::tests::dist;
    use crate::distance::Metric;

    #[test]
    fn test_ranks_with_ties() {
        let r = ranks(&[10.0, 30.0, 20.0, 30.0]);
        assert_eq!(r, vec![0.0, 2.5, 1.0, 2.5]);
    }

    #[test]
    fn test_spearman_monotone() {
        let d = dist(Metric::Spearman, &[1.0, 2.0, 3.0, 4.0], &[1.0, 4.0, 9.0, 16.0]);
        assert!(d.abs() < 1e-10);
    }

    #[test]
    fn test_spearman_reversed() {
        let d = dist(Metric::Spearman, &[1.0, 2.0, 3.0], &[9.0, 5.0, 1.0]);
        assert!((d - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_kendall_reversed() {
        let d = dist(Metric::Kendall, &[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]);
        assert!((d - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_kendall_one_swap() {
        // Two concordant pairs, one discordant: tau = 1/3.
        let d = dist(Metric::Kendall, &[1.0, 2.0, 3.0], &[1.0, 3.0, 2.0]);
        assert!((d - (1.0 - 1.0 / 3.0)).abs() < 1e-10);
    }

    #[test]
    fn test_kendall_all_tied() {
        let d = dist(Metric::Kendall, &[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]);
        assert_eq!(d, 1.0);
    }

    #[test]
    fn test_tied_profile_against_itself() {
        let a = [1.0, 1.0, 1.0];
        assert_eq!(dist(Metric::Kendall, &a, &a), 0.0);
        assert_eq!(dist(Metric::Spearman, &a, &a), 0.0);

        // One shared dimension leaves no pairs to rank.
        let mask = [true, false];
        let d = Kendall.distance(Profile::new(&[2.0, 0.0], &mask), Profile::new(&[2.0, 7.0], &mask), &[1.0, 1.0]);
        assert_eq!(d, 0.0);
    }

    #[test]
    fn test_kendall_weighted_pairs() {
        let a = [1.0, 2.0, 3.0];
        let b = [1.0, 3.0, 2.0];
        let mask = [true; 3];
        // Zero weight on the last dimension leaves only the concordant (0, 1) pair.
        let d = Kendall.distance(Profile::new(&a, &mask), Profile::new(&b, &mask), &[1.0, 1.0, 0.0]);
        assert!(d.abs() < 1e-10);
    }
}
