//! k-means / k-medians partitioning with multi-restart best-of-N selection.
//!
//! Each pass seeds an assignment, then alternates centroid computation and
//! nearest-centroid reassignment until nothing moves. Passes are independent
//! and run in parallel; the lowest-error pass wins and the number of passes
//! that reached the same error is reported as a confidence signal.

mod centroid;
pub mod seed;

pub use centroid::{CentroidSet, Method};
pub use seed::SeedStrategy;

use crate::cancel::CancelToken;
use crate::config::KClusterConfig;
use crate::distance::Metric;
use crate::error::{FlockError, Result};
use crate::matrix::{DataView, Matrix};
use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Relative tolerance under which two pass errors count as the same optimum.
const REPEAT_TOLERANCE: f64 = 1e-9;

/// Initial number of rounds between saved assignments for cycle detection.
const CYCLE_PERIOD: usize = 10;

/// Outcome of a k-means / k-medians run.
#[derive(Debug, Clone, PartialEq)]
pub struct KClusterResult {
    /// Cluster id of every point, in `[0, k)`.
    pub assignment: Vec<usize>,
    /// Centroids of the winning assignment.
    pub centroids: CentroidSet,
    /// Sum of point-to-centroid distances of the winning assignment.
    pub error: f64,
    /// Number of passes that reached the winning error.
    pub repeated: usize,
    /// Number of passes executed.
    pub passes: usize,
}

impl KClusterResult {
    /// Number of points in each cluster.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        cluster_sizes(&self.assignment, self.centroids.len())
    }
}

/// The partitioning engine.
#[derive(Debug, Clone)]
pub struct KMeans {
    config: KClusterConfig,
    cancel: CancelToken,
}

/// Result of a single pass.
#[derive(Debug)]
struct Pass {
    assignment: Vec<usize>,
    centroids: CentroidSet,
    error: f64,
}

impl KMeans {
    /// Creates an engine with the given configuration.
    pub fn new(config: KClusterConfig) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Uses `token` to allow cancelling between passes.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &KClusterConfig {
        &self.config
    }

    /// Clusters the points of `matrix`.
    pub fn fit(&self, matrix: &Matrix) -> Result<KClusterResult> {
        self.config.validate()?;
        let view = matrix.view(self.config.transpose)?;

        let k = self.config.nclusters;
        if k > view.npoints() {
            return Err(FlockError::Config(format!(
                "nclusters ({}) exceeds number of points ({})",
                k,
                view.npoints()
            )));
        }

        info!(
            "Running k-{}: {} points, {} dims, k={}, {} passes, metric {:?}, seed {:?}",
            match self.config.method {
                Method::Average => "means",
                Method::Median => "medians",
            },
            view.npoints(),
            view.ndim(),
            k,
            self.config.passes,
            self.config.metric,
            self.config.seed_strategy
        );

        let base_seed = match self.config.seed {
            Some(seed) => seed,
            None => ChaCha8Rng::from_entropy().gen(),
        };

        let passes: Vec<Pass> = (0..self.config.passes)
            .into_par_iter()
            .map(|pass| -> Result<Pass> {
                self.cancel.check()?;
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed);
                rng.set_stream(pass as u64);
                Ok(self.run_pass(&view, pass, &mut rng))
            })
            .collect::<Result<_>>()?;

        let mut best_index = 0;
        for (i, pass) in passes.iter().enumerate() {
            if pass.error < passes[best_index].error {
                best_index = i;
            }
        }
        let best_error = passes[best_index].error;
        let repeated = passes
            .iter()
            .filter(|p| p.error <= best_error + REPEAT_TOLERANCE * best_error.abs())
            .count();
        let total = passes.len();

        let best = passes
            .into_iter()
            .nth(best_index)
            .ok_or_else(|| FlockError::Config("no passes executed".to_string()))?;

        info!(
            "k-clustering completed: error={:.6}, found {} of {} passes",
            best.error, repeated, total
        );

        Ok(KClusterResult {
            assignment: best.assignment,
            centroids: best.centroids,
            error: best.error,
            repeated,
            passes: total,
        })
    }

    fn run_pass<R: Rng + ?Sized>(&self, view: &DataView<'_>, pass: usize, rng: &mut R) -> Pass {
        let k = self.config.nclusters;
        let metric = self.config.metric;
        let method = self.config.method;
        let weights = view.weights();

        let mut assignment = self.config.seed_strategy.assign(view, metric, k, rng);
        let mut centroids = CentroidSet::compute(view, &assignment, k, method);

        let repaired = repair_empty_clusters(view, metric, method, &mut assignment, &mut centroids);
        if repaired > 0 {
            debug!("Pass {}: reseeded {} empty clusters", pass, repaired);
        }

        let mut counts = cluster_sizes(&assignment, k);
        let mut saved = assignment.clone();
        let mut period = CYCLE_PERIOD;
        let mut finished = false;

        for iteration in 0..self.config.max_iterations {
            if iteration % period == 0 {
                saved.copy_from_slice(&assignment);
                period = period.saturating_mul(2);
            }

            let mut changed = 0;
            for point in 0..view.npoints() {
                let current = assignment[point];
                // Moving a lone member out would leave its cluster empty.
                if counts[current] == 1 {
                    continue;
                }

                let profile = view.profile(point);
                let mut best = current;
                let mut best_distance = metric.compute(profile, centroids.profile(current), weights);
                for cluster in (0..k).filter(|&c| c != current) {
                    let d = metric.compute(profile, centroids.profile(cluster), weights);
                    if d < best_distance {
                        best = cluster;
                        best_distance = d;
                    }
                }

                if best != current {
                    counts[current] -= 1;
                    counts[best] += 1;
                    assignment[point] = best;
                    changed += 1;
                }
            }

            if changed == 0 {
                debug!("Pass {}: converged after {} rounds", pass, iteration + 1);
                finished = true;
                break;
            }

            centroids = CentroidSet::compute(view, &assignment, k, method);

            if assignment == saved {
                debug!("Pass {}: assignment cycle detected after {} rounds", pass, iteration + 1);
                finished = true;
                break;
            }
        }

        if !finished {
            warn!(
                "Pass {}: stopped at the iteration cap ({}) before converging",
                pass, self.config.max_iterations
            );
        }

        let error = total_error(view, metric, &assignment, &centroids);
        Pass {
            assignment,
            centroids,
            error,
        }
    }
}

/// Moves points into empty clusters until every cluster has a member.
///
/// Empty clusters are filled in ascending id order. Each one receives the
/// point farthest from its own centroid among clusters that still have more
/// than one member (lowest point index on ties). Centroids of both affected
/// clusters are recomputed. Returns the number of clusters filled.
pub fn repair_empty_clusters(
    view: &DataView<'_>,
    metric: Metric,
    method: Method,
    assignment: &mut [usize],
    centroids: &mut CentroidSet,
) -> usize {
    let k = centroids.len();
    let weights = view.weights();
    let mut counts = cluster_sizes(assignment, k);
    let mut repaired = 0;

    for empty in 0..k {
        if counts[empty] > 0 {
            continue;
        }

        let mut farthest: Option<(usize, f64)> = None;
        for (point, &cluster) in assignment.iter().enumerate() {
            if counts[cluster] <= 1 {
                continue;
            }
            let d = metric.compute(view.profile(point), centroids.profile(cluster), weights);
            if farthest.map_or(true, |(_, best)| d > best) {
                farthest = Some((point, d));
            }
        }

        // Only reachable with more clusters than points.
        let Some((point, _)) = farthest else {
            break;
        };

        let from = assignment[point];
        assignment[point] = empty;
        counts[from] -= 1;
        counts[empty] += 1;
        centroids.update_cluster(view, assignment, from, method);
        centroids.update_cluster(view, assignment, empty, method);
        repaired += 1;
    }

    repaired
}

/// Sum of distances from every point to its cluster's centroid.
pub fn total_error(
    view: &DataView<'_>,
    metric: Metric,
    assignment: &[usize],
    centroids: &CentroidSet,
) -> f64 {
    let weights = view.weights();
    assignment
        .iter()
        .enumerate()
        .map(|(point, &cluster)| metric.compute(view.profile(point), centroids.profile(cluster), weights))
        .sum()
}

/// Clusters the points of `matrix` with the given configuration.
pub fn kcluster(matrix: &Matrix, config: &KClusterConfig) -> Result<KClusterResult> {
    KMeans::new(config.clone()).fit(matrix)
}

fn cluster_sizes(assignment: &[usize], k: usize) -> Vec<usize> {
    let mut counts = vec![0; k];
    for &c in assignment {
        counts[c] += 1;
    }
    counts
}
