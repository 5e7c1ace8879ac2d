//! Initial cluster assignments for k-means passes.

use crate::distance::Metric;
use crate::matrix::DataView;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Strategy used to produce the initial assignment of a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SeedStrategy {
    /// Each point gets an independent uniformly random cluster.
    #[default]
    #[serde(rename = "random")]
    Random,
    /// Probabilistic farthest-point selection (k-means++).
    #[serde(rename = "kmeans_plusplus")]
    KMeansPlusPlus,
    /// Deterministic farthest-point selection starting at point 0.
    #[serde(rename = "spreadout")]
    Spreadout,
}

impl SeedStrategy {
    /// Produces an initial assignment of `view`'s points into `k` clusters.
    ///
    /// `k` must be in `1..=view.npoints()`.
    pub fn assign<R: Rng + ?Sized>(
        &self,
        view: &DataView<'_>,
        metric: Metric,
        k: usize,
        rng: &mut R,
    ) -> Vec<usize> {
        match self {
            SeedStrategy::Random => random_assign(view.npoints(), k, rng),
            SeedStrategy::KMeansPlusPlus => {
                let references = kmeans_plusplus_references(view, metric, k, rng);
                assign_to_references(view, metric, &references)
            }
            SeedStrategy::Spreadout => {
                let references = spreadout_references(view, metric, k);
                assign_to_references(view, metric, &references)
            }
        }
    }
}

/// Independent uniform cluster ids. Some clusters may end up empty.
pub fn random_assign<R: Rng + ?Sized>(npoints: usize, k: usize, rng: &mut R) -> Vec<usize> {
    (0..npoints).map(|_| rng.gen_range(0..k)).collect()
}

/// Picks `k` distinct reference points, k-means++ style.
///
/// The first reference is uniform at random. Each following one is drawn
/// with probability proportional to the squared distance to its nearest
/// already chosen reference.
pub fn kmeans_plusplus_references<R: Rng + ?Sized>(
    view: &DataView<'_>,
    metric: Metric,
    k: usize,
    rng: &mut R,
) -> Vec<usize> {
    let n = view.npoints();
    let first = rng.gen_range(0..n);

    choose_references(view, metric, k, first, |candidates| {
        let total: f64 = candidates.iter().map(|&(_, d)| d * d).sum();

        // Roulette over candidates ordered by weight; zero-weight points are
        // only reachable through the rounding fallback.
        let mut ordered = candidates.to_vec();
        ordered.sort_by(|a, b| (a.1 * a.1).total_cmp(&(b.1 * b.1)));

        let cutoff = total * rng.gen::<f64>();
        let mut cumulative = 0.0;
        for &(point, d) in &ordered {
            let weight = d * d;
            cumulative += weight;
            if weight > 0.0 && cumulative >= cutoff {
                return point;
            }
        }
        ordered[ordered.len() - 1].0
    })
}

/// Picks `k` distinct reference points greedily: point 0 first, then always
/// the point farthest from its nearest chosen reference (lowest index on
/// ties).
pub fn spreadout_references(view: &DataView<'_>, metric: Metric, k: usize) -> Vec<usize> {
    choose_references(view, metric, k, 0, |candidates| {
        let mut best = candidates[0];
        for &candidate in &candidates[1..] {
            if candidate.1 > best.1 {
                best = candidate;
            }
        }
        best.0
    })
}

/// Shared farthest-point loop. `pick` receives every unchosen point with its
/// minimum distance to the chosen set, in point order, and returns one of
/// those points.
fn choose_references<F>(
    view: &DataView<'_>,
    metric: Metric,
    k: usize,
    first: usize,
    mut pick: F,
) -> Vec<usize>
where
    F: FnMut(&[(usize, f64)]) -> usize,
{
    let n = view.npoints();
    debug_assert!(k >= 1 && k <= n);

    let weights = view.weights();
    let mut chosen = vec![false; n];
    let mut references = Vec::with_capacity(k);
    chosen[first] = true;
    references.push(first);

    let mut candidates: Vec<(usize, f64)> = Vec::with_capacity(n);
    while references.len() < k {
        candidates.clear();
        for point in (0..n).filter(|&p| !chosen[p]) {
            let profile = view.profile(point);
            let nearest = references
                .iter()
                .map(|&r| metric.compute(profile, view.profile(r), weights))
                .fold(f64::INFINITY, f64::min);
            candidates.push((point, nearest));
        }

        let next = pick(&candidates);
        debug_assert!(!chosen[next]);
        chosen[next] = true;
        references.push(next);
    }

    references
}

/// Gives reference `i` cluster id `i` and every other point the id of its
/// nearest reference (earliest reference on ties).
pub fn assign_to_references(view: &DataView<'_>, metric: Metric, references: &[usize]) -> Vec<usize> {
    let weights = view.weights();
    let mut assignment: Vec<usize> = (0..view.npoints())
        .map(|point| {
            let profile = view.profile(point);
            let mut best = (0, f64::INFINITY);
            for (cluster, &r) in references.iter().enumerate() {
                let d = metric.compute(profile, view.profile(r), weights);
                if d < best.1 {
                    best = (cluster, d);
                }
            }
            best.0
        })
        .collect();

    for (cluster, &r) in references.iter().enumerate() {
        assignment[r] = cluster;
    }
    assignment
}
