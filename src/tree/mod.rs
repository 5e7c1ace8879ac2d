//! Agglomerative hierarchical clustering.
//!
//! Starting from singleton clusters, the two closest clusters are merged
//! until one remains. How the distance between clusters is derived from
//! point distances is set by the [`Linkage`] rule:
//!
//! | Linkage  | Distance between clusters A and B        |
//! |----------|------------------------------------------|
//! | Single   | min d(a, b)                              |
//! | Complete | max d(a, b)                              |
//! | Average  | mean d(a, b) over all member pairs       |
//! | Centroid | d(centroid(A), centroid(B))              |
//!
//! The resulting [`Dendrogram`] can be cut at any level.

mod dendrogram;

pub use dendrogram::{Dendrogram, Merge, NodeId};

use crate::cancel::CancelToken;
use crate::config::TreeConfig;
use crate::distance::DistanceMatrix;
use crate::error::{FlockError, Result};
use crate::matrix::{DataView, Matrix, Profile};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Rule for the distance between two clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Linkage {
    /// Minimum pairwise point distance.
    Single,
    /// Maximum pairwise point distance.
    #[serde(alias = "maximum")]
    Complete,
    /// Mean pairwise point distance.
    #[default]
    Average,
    /// Distance between cluster centroids.
    Centroid,
}

/// Builds dendrograms and flat clusterings from them.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    config: TreeConfig,
    cancel: CancelToken,
}

impl TreeBuilder {
    /// Creates a builder with the given configuration.
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Uses `token` to allow cancelling between merge steps.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Builds the tree and cuts it into `config.nclusters` clusters.
    pub fn fit(&self, matrix: &Matrix) -> Result<Vec<usize>> {
        self.config.validate()?;
        let npoints = if self.config.transpose {
            matrix.ncols()
        } else {
            matrix.nrows()
        };
        if self.config.nclusters > npoints {
            return Err(FlockError::Config(format!(
                "nclusters ({}) exceeds number of points ({})",
                self.config.nclusters, npoints
            )));
        }

        self.build(matrix)?.cut(self.config.nclusters)
    }

    /// Builds the full merge tree.
    pub fn build(&self, matrix: &Matrix) -> Result<Dendrogram> {
        let view = matrix.view(self.config.transpose)?;
        let n = view.npoints();

        info!(
            "Building {:?}-linkage tree: {} points, {} dims, metric {:?}",
            self.config.linkage,
            n,
            view.ndim(),
            self.config.metric
        );

        let mut distances = DistanceMatrix::compute(&view, self.config.metric)?;
        let mut centroids = match self.config.linkage {
            Linkage::Centroid => Some(ClusterCentroids::new(&view)?),
            _ => None,
        };

        let mut nodes: Vec<NodeId> = try_vec(n, NodeId::Leaf(0))?;
        for (i, node) in nodes.iter_mut().enumerate() {
            *node = NodeId::Leaf(i);
        }
        let mut sizes: Vec<usize> = try_vec(n, 1)?;
        let mut active: Vec<usize> = try_vec(n, 0)?;
        for (i, slot) in active.iter_mut().enumerate() {
            *slot = i;
        }

        let mut tree = Dendrogram::new(n);
        for step in 0..n.saturating_sub(1) {
            self.cancel.check()?;

            // Closest active pair; the first one in scan order wins ties.
            let mut closest = (active[1], active[0], distances.get(active[1], active[0]));
            for (ai, &i) in active.iter().enumerate().skip(1) {
                for &j in &active[..ai] {
                    let d = distances.get(i, j);
                    if d < closest.2 {
                        closest = (i, j, d);
                    }
                }
            }
            let (i, j, distance) = closest;
            let (keep, gone) = (i.min(j), i.max(j));

            tree.push(Merge {
                left: nodes[keep],
                right: nodes[gone],
                distance,
            });

            if let Some(centroids) = centroids.as_mut() {
                centroids.merge(keep, gone);
            }

            for &other in active.iter().filter(|&&s| s != keep && s != gone) {
                let updated = match (centroids.as_ref(), self.config.linkage) {
                    (Some(c), _) => {
                        self.config
                            .metric
                            .compute(c.profile(keep), c.profile(other), view.weights())
                    }
                    (None, Linkage::Single) => {
                        distances.get(keep, other).min(distances.get(gone, other))
                    }
                    (None, Linkage::Complete) => {
                        distances.get(keep, other).max(distances.get(gone, other))
                    }
                    (None, _) => {
                        let (sk, sg) = (sizes[keep] as f64, sizes[gone] as f64);
                        (sk * distances.get(keep, other) + sg * distances.get(gone, other)) / (sk + sg)
                    }
                };
                distances.set(keep, other, updated);
            }

            nodes[keep] = NodeId::Merge(step);
            sizes[keep] += sizes[gone];
            active.retain(|&s| s != gone);

            debug!("Merge {}: slots {} + {} at {:.6}", step, keep, gone, distance);
        }

        info!("Tree completed with {} merges", tree.len());
        Ok(tree)
    }
}

/// Running masked-mean centroids of the clusters, for centroid linkage.
struct ClusterCentroids {
    ndim: usize,
    values: Vec<f64>,
    counts: Vec<usize>,
    mask: Vec<bool>,
}

impl ClusterCentroids {
    fn new(view: &DataView<'_>) -> Result<Self> {
        let (n, ndim) = (view.npoints(), view.ndim());
        let mut values = try_vec(n * ndim, 0.0)?;
        let mut counts = try_vec(n * ndim, 0)?;
        let mut mask = try_vec(n * ndim, false)?;

        for point in 0..n {
            for (d, v) in view.profile(point).valid() {
                let k = point * ndim + d;
                values[k] = v;
                counts[k] = 1;
                mask[k] = true;
            }
        }

        Ok(Self {
            ndim,
            values,
            counts,
            mask,
        })
    }

    /// Folds cluster `from` into cluster `into`, weighting each dimension
    /// by its number of valid member values.
    fn merge(&mut self, into: usize, from: usize) {
        for d in 0..self.ndim {
            let (a, b) = (into * self.ndim + d, from * self.ndim + d);
            let total = self.counts[a] + self.counts[b];
            if total > 0 {
                self.values[a] = (self.values[a] * self.counts[a] as f64
                    + self.values[b] * self.counts[b] as f64)
                    / total as f64;
            }
            self.counts[a] = total;
            self.mask[a] = total > 0;
        }
    }

    fn profile(&self, cluster: usize) -> Profile<'_> {
        let range = cluster * self.ndim..(cluster + 1) * self.ndim;
        Profile::new(&self.values[range.clone()], &self.mask[range])
    }
}

/// Allocates a filled vector, reporting allocation failure as an error.
fn try_vec<T: Clone>(len: usize, value: T) -> Result<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)?;
    v.resize(len, value);
    Ok(v)
}

/// Builds the tree for `matrix` and cuts it into `config.nclusters` clusters.
pub fn treecluster(matrix: &Matrix, config: &TreeConfig) -> Result<Vec<usize>> {
    TreeBuilder::new(config.clone()).fit(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn line() -> Matrix {
        Matrix::from_rows(&[vec![0.0], vec![1.0], vec![2.0], vec![10.0]]).unwrap()
    }

    fn build(linkage: Linkage) -> Dendrogram {
        TreeBuilder::new(TreeConfig {
            linkage,
            ..Default::default()
        })
        .build(&line())
        .unwrap()
    }

    fn distances(tree: &Dendrogram) -> Vec<f64> {
        tree.merges().iter().map(|m| m.distance).collect()
    }

    #[test]
    fn test_single_linkage() {
        let tree = build(Linkage::Single);
        assert_eq!(distances(&tree), vec![1.0, 1.0, 64.0]);
        assert_eq!(tree.merges()[0].left, NodeId::Leaf(0));
        assert_eq!(tree.merges()[0].right, NodeId::Leaf(1));
        assert_eq!(tree.merges()[1].left, NodeId::Merge(0));
        assert_eq!(tree.merges()[1].right, NodeId::Leaf(2));
        assert_eq!(tree.merges()[2].right, NodeId::Leaf(3));
    }

    #[test]
    fn test_complete_linkage() {
        let tree = build(Linkage::Complete);
        assert_eq!(distances(&tree), vec![1.0, 4.0, 100.0]);
    }

    #[test]
    fn test_average_linkage() {
        let d = distances(&build(Linkage::Average));
        assert!((d[1] - 2.5).abs() < 1e-10);
        assert!((d[2] - 245.0 / 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_centroid_linkage() {
        let d = distances(&build(Linkage::Centroid));
        assert!((d[1] - 2.25).abs() < 1e-10);
        assert!((d[2] - 81.0).abs() < 1e-10);
    }

    #[test]
    fn test_every_cut_has_k_ids() {
        let data = Matrix::from_rows(&[
            vec![0.1, 0.0],
            vec![1.4, 1.3],
            vec![1.2, 2.5],
            vec![2.3, 1.5],
            vec![1.7, 0.7],
            vec![0.0, 3.9],
            vec![6.7, 3.9],
        ])
        .unwrap();

        for linkage in [Linkage::Single, Linkage::Complete, Linkage::Average, Linkage::Centroid] {
            let tree = TreeBuilder::new(TreeConfig {
                linkage,
                ..Default::default()
            })
            .build(&data)
            .unwrap();
            assert_eq!(tree.len(), 6);
            for k in 1..=7 {
                let ids: HashSet<_> = tree.cut(k).unwrap().into_iter().collect();
                assert_eq!(ids.len(), k, "{:?} k={}", linkage, k);
            }
        }
    }

    #[test]
    fn test_fit_two_groups() {
        let data = Matrix::from_rows(&[
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![10.0, 10.0],
            vec![10.1, 10.1],
        ])
        .unwrap();
        let labels = treecluster(&data, &TreeConfig::default()).unwrap();
        assert_eq!(labels, vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_transposed() {
        let data = Matrix::from_rows(&[vec![0.0, 0.1, 5.0], vec![0.0, 0.1, 5.0]]).unwrap();
        let config = TreeConfig {
            transpose: true,
            ..Default::default()
        };
        assert_eq!(treecluster(&data, &config).unwrap(), vec![0, 0, 1]);
    }

    #[test]
    fn test_single_point() {
        let data = Matrix::from_rows(&[vec![1.0, 2.0]]).unwrap();
        let config = TreeConfig {
            nclusters: 1,
            ..Default::default()
        };
        assert_eq!(treecluster(&data, &config).unwrap(), vec![0]);
    }

    #[test]
    fn test_too_many_clusters() {
        let config = TreeConfig {
            nclusters: 5,
            ..Default::default()
        };
        assert!(matches!(treecluster(&line(), &config), Err(FlockError::Config(_))));
    }

    #[test]
    fn test_maximum_alias() {
        let linkage: Linkage = serde_json::from_str("\"maximum\"").unwrap();
        assert_eq!(linkage, Linkage::Complete);
    }
}
