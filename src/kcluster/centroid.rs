//! Per-cluster centroids: componentwise mean or median over valid values.

use crate::matrix::{DataView, Profile};
use serde::{Deserialize, Serialize};

/// How a cluster's representative vector is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Componentwise arithmetic mean (k-means).
    #[default]
    Average,
    /// Componentwise median (k-medians).
    Median,
}

/// `k x ndim` centroid values with a derived validity mask.
///
/// A centroid dimension is valid iff at least one cluster member had a
/// valid value there; invalid dimensions hold `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentroidSet {
    k: usize,
    ndim: usize,
    values: Vec<f64>,
    mask: Vec<bool>,
}

impl CentroidSet {
    /// Computes the centroids of all `k` clusters of an assignment.
    pub fn compute(view: &DataView<'_>, assignment: &[usize], k: usize, method: Method) -> Self {
        debug_assert_eq!(assignment.len(), view.npoints());

        let ndim = view.ndim();
        let mut set = Self {
            k,
            ndim,
            values: vec![0.0; k * ndim],
            mask: vec![false; k * ndim],
        };

        let mut members: Vec<Vec<usize>> = vec![Vec::new(); k];
        for (point, &cluster) in assignment.iter().enumerate() {
            members[cluster].push(point);
        }
        for (cluster, points) in members.iter().enumerate() {
            set.fill(view, cluster, points, method);
        }
        set
    }

    /// Recomputes a single cluster in place.
    pub fn update_cluster(
        &mut self,
        view: &DataView<'_>,
        assignment: &[usize],
        cluster: usize,
        method: Method,
    ) {
        let points: Vec<usize> = assignment
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == cluster)
            .map(|(p, _)| p)
            .collect();
        self.fill(view, cluster, &points, method);
    }

    fn fill(&mut self, view: &DataView<'_>, cluster: usize, points: &[usize], method: Method) {
        let range = cluster * self.ndim..(cluster + 1) * self.ndim;
        let values = &mut self.values[range.clone()];
        let mask = &mut self.mask[range];

        match method {
            Method::Average => {
                let mut counts = vec![0usize; values.len()];
                values.fill(0.0);
                for &p in points {
                    for (d, v) in view.profile(p).valid() {
                        values[d] += v;
                        counts[d] += 1;
                    }
                }
                for ((v, m), &c) in values.iter_mut().zip(mask.iter_mut()).zip(&counts) {
                    *m = c > 0;
                    if c > 0 {
                        *v /= c as f64;
                    }
                }
            }
            Method::Median => {
                let profiles: Vec<Profile<'_>> = points.iter().map(|&p| view.profile(p)).collect();
                let mut column = Vec::with_capacity(points.len());
                for (d, (v, m)) in values.iter_mut().zip(mask.iter_mut()).enumerate() {
                    column.clear();
                    column.extend(profiles.iter().filter_map(|p| p.get(d)));
                    *m = !column.is_empty();
                    *v = if column.is_empty() { 0.0 } else { median(&mut column) };
                }
            }
        }
    }

    /// Number of clusters.
    #[inline]
    pub fn len(&self) -> usize {
        self.k
    }

    /// True when there are no clusters.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.k == 0
    }

    /// Number of dimensions per centroid.
    #[inline]
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Values of one centroid; masked dimensions read `0.0`.
    pub fn values(&self, cluster: usize) -> &[f64] {
        &self.values[cluster * self.ndim..(cluster + 1) * self.ndim]
    }

    /// Validity mask of one centroid.
    pub fn mask(&self, cluster: usize) -> &[bool] {
        &self.mask[cluster * self.ndim..(cluster + 1) * self.ndim]
    }

    /// Centroid value, or `None` when no member had data there.
    #[inline]
    pub fn get(&self, cluster: usize, dim: usize) -> Option<f64> {
        let k = cluster * self.ndim + dim;
        if self.mask[k] {
            Some(self.values[k])
        } else {
            None
        }
    }

    /// Profile of one centroid, for distance computations.
    #[inline]
    pub fn profile(&self, cluster: usize) -> Profile<'_> {
        Profile::new(self.values(cluster), self.mask(cluster))
    }
}

/// Median of a non-empty slice; even lengths average the two middle values.
/// The slice is reordered.
pub(crate) fn median(values: &mut [f64]) -> f64 {
    debug_assert!(!values.is_empty());
    let n = values.len();
    let mid = n / 2;
    let (lower, upper, _) = values.select_nth_unstable_by(mid, f64::total_cmp);
    let upper = *upper;
    if n % 2 == 1 {
        upper
    } else {
        let below = lower.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (below + upper) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Matrix;

    fn data() -> Matrix {
        Matrix::from_rows(&[
            vec![1.0, 10.0],
            vec![2.0, 20.0],
            vec![9.0, 30.0],
            vec![5.0, 5.0],
        ])
        .unwrap()
        .with_mask_rows(&[
            vec![true, true],
            vec![true, false],
            vec![true, true],
            vec![false, false],
        ])
        .unwrap()
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&mut [7.0]), 7.0);
    }

    #[test]
    fn test_mean_skips_masked() {
        let m = data();
        let view = m.view(false).unwrap();
        let set = CentroidSet::compute(&view, &[0, 0, 0, 1], 2, Method::Average);

        assert!((set.get(0, 0).unwrap() - 4.0).abs() < 1e-10);
        assert!((set.get(0, 1).unwrap() - 20.0).abs() < 1e-10);
        // Cluster 1 only holds a fully masked point.
        assert_eq!(set.get(1, 0), None);
        assert_eq!(set.mask(1), &[false, false]);
        assert_eq!(set.values(1), &[0.0, 0.0]);
    }

    #[test]
    fn test_median_centroid() {
        let m = data();
        let view = m.view(false).unwrap();
        let set = CentroidSet::compute(&view, &[0, 0, 0, 0], 1, Method::Median);
        assert_eq!(set.get(0, 0), Some(2.0));
        assert_eq!(set.get(0, 1), Some(20.0));
    }

    #[test]
    fn test_update_cluster() {
        let m = data();
        let view = m.view(false).unwrap();
        let mut assignment = vec![0, 0, 1, 1];
        let mut set = CentroidSet::compute(&view, &assignment, 2, Method::Average);
        assert_eq!(set.get(1, 0), Some(9.0));

        assignment[1] = 1;
        set.update_cluster(&view, &assignment, 1, Method::Average);
        assert_eq!(set.get(1, 0), Some(5.5));
        assert_eq!(set.get(1, 1), Some(30.0));
    }

    #[test]
    fn test_transposed_centroids() {
        let m = Matrix::from_rows(&[vec![1.0, 3.0], vec![2.0, 6.0]]).unwrap();
        let view = m.view(true).unwrap();
        let set = CentroidSet::compute(&view, &[0, 0], 1, Method::Average);
        assert_eq!(set.values(0), &[2.0, 4.0]);
    }
}
